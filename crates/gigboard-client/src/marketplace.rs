//! Typed marketplace endpoints.
//!
//! Thin wrappers over [`ApiClient`]. Payloads are passed through as the
//! backend sends them; every business rule stays server-side.

use serde_json::{json, Value};

use gigboard_core::{
    Category, CheckoutSession, Contract, ContractId, Deliverable, DeliverableId, Job, JobId,
    Listing, NewJob, NewProposal, Profile, Proposal, ProposalId, Transaction, UserRole, Wallet,
    Withdrawal,
};

use crate::auth::PROFILE_PATH;
use crate::http::{ApiClient, UploadMethod};
use crate::result::ApiResult;
use crate::transport::MultipartForm;

/// A file attached to a deliverable or profile update.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Marketplace operations for the logged-in account.
#[derive(Clone)]
pub struct Marketplace {
    client: ApiClient,
}

impl Marketplace {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // Categories

    pub async fn categories(&self) -> ApiResult<Listing<Category>> {
        self.client.get("/jobs/categories/").await
    }

    pub async fn create_category(&self, name: &str) -> ApiResult<Category> {
        self.client
            .post("/api/jobs/categories/create/", Some(&json!({ "name": name })))
            .await
    }

    // Jobs

    pub async fn jobs(&self) -> ApiResult<Listing<Job>> {
        self.client.get("/jobs/jobs/").await
    }

    pub async fn job(&self, id: JobId) -> ApiResult<Job> {
        self.client.get(&format!("/jobs/jobs/{}/", id)).await
    }

    pub async fn create_job(&self, job: &NewJob) -> ApiResult<Job> {
        self.client.post("/api/jobs/jobs/create/", Some(job)).await
    }

    // Proposals

    pub async fn submit_proposal(&self, proposal: &NewProposal) -> ApiResult<Proposal> {
        self.client.post("/proposal/create/", Some(proposal)).await
    }

    /// Proposals relevant to the caller: those received on their jobs for
    /// a client, those they submitted for a freelancer.
    pub async fn proposals(&self, role: UserRole) -> ApiResult<Listing<Proposal>> {
        let path = match role {
            UserRole::Client => "/api/proposal/job-proposals/",
            UserRole::Freelancer => "/api/proposal/my-proposal/",
        };
        self.client.get(path).await
    }

    pub async fn accept_proposal(&self, id: ProposalId) -> ApiResult<Value> {
        self.client
            .patch(
                &format!("/api/proposal/proposals/{}/accept/", id),
                Some(&json!({})),
            )
            .await
    }

    pub async fn reject_proposal(&self, id: ProposalId) -> ApiResult<Value> {
        self.client
            .patch(
                &format!("/api/proposal/proposals/{}/reject/", id),
                Some(&json!({})),
            )
            .await
    }

    // Contracts

    pub async fn contracts(&self, role: UserRole) -> ApiResult<Listing<Contract>> {
        let path = match role {
            UserRole::Client => "/contract/client/",
            UserRole::Freelancer => "/contract/freelancer/",
        };
        self.client.get(path).await
    }

    pub async fn contract(&self, id: ContractId) -> ApiResult<Contract> {
        self.client.get(&format!("/api/contract/{}/", id)).await
    }

    /// Move the contract price from the client's wallet into escrow.
    pub async fn fund_escrow(&self, id: ContractId) -> ApiResult<Value> {
        self.client
            .post(&format!("/wallet/fund/{}/escrow", id), Some(&json!({})))
            .await
    }

    // Deliverables

    pub async fn deliverables(&self, contract: ContractId) -> ApiResult<Listing<Deliverable>> {
        self.client
            .get(&format!("/contracts/{}/deliverables/list/", contract))
            .await
    }

    pub async fn submit_deliverable(
        &self,
        contract: ContractId,
        message: &str,
        file: Attachment,
    ) -> ApiResult<Deliverable> {
        let form = MultipartForm::new()
            .text("message", message)
            .file("file", file.file_name, file.bytes);
        self.client
            .upload_form(
                &format!("/contracts/{}/deliverables/", contract),
                form,
                UploadMethod::Post,
            )
            .await
    }

    pub async fn approve_deliverable(&self, id: DeliverableId) -> ApiResult<Value> {
        self.client
            .patch(&format!("/deliverables/{}/approve/", id), Some(&json!({})))
            .await
    }

    pub async fn reject_deliverable(&self, id: DeliverableId) -> ApiResult<Value> {
        self.client
            .patch(&format!("/deliverables/{}/reject/", id), Some(&json!({})))
            .await
    }

    // Wallet

    pub async fn wallet(&self) -> ApiResult<Wallet> {
        self.client.get("/wallet/wallet/my/").await
    }

    pub async fn transactions(&self) -> ApiResult<Listing<Transaction>> {
        self.client.get("/wallet/wallet/transactions/").await
    }

    /// Start a card deposit. The returned URL hosts the checkout page.
    pub async fn deposit(&self, amount: f64) -> ApiResult<CheckoutSession> {
        self.client
            .post("/wallet/wallet/deposit/", Some(&json!({ "amount": amount })))
            .await
    }

    pub async fn withdraw(&self, amount: f64) -> ApiResult<Withdrawal> {
        self.client
            .post("/wallet/wallet/withdraw/", Some(&json!({ "amount": amount })))
            .await
    }

    // Profile

    pub async fn profile(&self) -> ApiResult<Profile> {
        self.client.get(PROFILE_PATH).await
    }

    /// Update profile fields, optionally replacing the avatar.
    pub async fn update_profile(
        &self,
        fields: &[(&str, &str)],
        avatar: Option<Attachment>,
    ) -> ApiResult<Profile> {
        let mut form = fields
            .iter()
            .fold(MultipartForm::new(), |form, (name, value)| form.text(*name, *value));
        if let Some(avatar) = avatar {
            form = form.file("avatar", avatar.file_name, avatar.bytes);
        }
        self.client
            .upload_form(PROFILE_PATH, form, UploadMethod::Patch)
            .await
    }
}
