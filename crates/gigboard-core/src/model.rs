//! Marketplace payload types.
//!
//! These mirror what the backend serializes. Nested objects and
//! timestamps are optional because list and detail endpoints expand
//! different subsets of a record. Money amounts stay as the decimal
//! strings the backend sends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, ContractId, DeliverableId, JobId, ProposalId, UserId};
use crate::status::{
    ContractStatus, DeliverableStatus, ExperienceLevel, JobStatus, ProposalStatus,
    TransactionDirection, TransactionStatus, TransactionType, UserRole,
};

/// Public profile fields embedded in a cached [`User`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub company_name: String,
}

/// An account on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

impl User {
    /// Returns true if the account can post jobs.
    pub fn is_client(&self) -> bool {
        self.role == UserRole::Client
    }

    /// Best display name available.
    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.full_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Profile record returned by `/profile/me/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Embedded copy of the profile fields for a cached user.
    pub fn summary(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            country: self.country.clone(),
            avatar: self.avatar.clone(),
            skills: self.skills.clone(),
            company_name: self.company_name.clone(),
        }
    }
}

/// A job category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub client: Option<User>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub proposals_count: Option<u32>,
}

/// A freelancer's bid on a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    #[serde(default)]
    pub job: Option<Job>,
    #[serde(default)]
    pub freelancer: Option<User>,
    #[serde(default)]
    pub client: Option<User>,
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub proposed_price: String,
    #[serde(default)]
    pub estimated_days: u32,
    #[serde(default)]
    pub status: ProposalStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An agreement created when a proposal is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    #[serde(default)]
    pub job: Option<Job>,
    #[serde(default)]
    pub proposal: Option<Proposal>,
    #[serde(default)]
    pub client: Option<User>,
    #[serde(default)]
    pub freelancer: Option<User>,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub status: ContractStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A work submission against a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: DeliverableId,
    pub contract: ContractId,
    #[serde(default)]
    pub submitted_by: Option<User>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub status: DeliverableStatus,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Balances held for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: u64,
    pub user: UserId,
    pub available_balance: String,
    pub escrow_balance: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A ledger entry on a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub wallet: u64,
    pub amount: String,
    pub direction: TransactionDirection,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    #[serde(default)]
    pub reference_type: Option<String>,
    #[serde(default)]
    pub reference_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of the deposit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
}

/// Response of the withdraw endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub withdrawal_id: u64,
    pub status: String,
}

/// Login form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Signup form.
#[derive(Clone, Serialize, Deserialize)]
pub struct SignupData {
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Body for creating a job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub category: CategoryId,
    pub experience_level: ExperienceLevel,
    pub budget: String,
    pub deadline: String,
}

/// Body for submitting a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProposal {
    pub job: JobId,
    pub cover_letter: String,
    pub proposed_price: String,
    pub estimated_days: u32,
}

/// A collection response.
///
/// Some endpoints return a bare array, others a paginated envelope.
/// An object without `results` reads as an empty page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Page {
        #[serde(default = "Vec::new")]
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
    },
}

impl<T> Listing<T> {
    /// Flatten into the contained items.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Items(items) => items,
            Self::Page { results, .. } => results,
        }
    }

    /// Number of items in this response.
    pub fn len(&self) -> usize {
        match self {
            Self::Items(items) => items.len(),
            Self::Page { results, .. } => results.len(),
        }
    }

    /// Returns true if this response holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self::Items(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_accepts_array_and_page() {
        let bare: Listing<Category> =
            serde_json::from_value(json!([{ "id": 1, "name": "Design" }])).unwrap();
        assert_eq!(bare.len(), 1);

        let page: Listing<Category> = serde_json::from_value(json!({
            "count": 2,
            "next": null,
            "results": [{ "id": 1, "name": "Design" }, { "id": 2, "name": "Writing" }]
        }))
        .unwrap();
        let items = page.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "Writing");
    }

    #[test]
    fn test_listing_object_without_results_is_empty() {
        let page: Listing<Category> = serde_json::from_value(json!({ "detail": "x" })).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_transaction_kind_field() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": 5,
            "wallet": 1,
            "amount": "25.00",
            "direction": "DEBIT",
            "type": "ESCROW_LOCK",
            "status": "SUCCESS",
            "reference_type": "contract",
            "reference_id": 3,
            "created_at": "2025-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(tx.kind, TransactionType::EscrowLock);
        assert_eq!(tx.reference_id, Some(3));
    }

    #[test]
    fn test_user_display_name_falls_back_to_email() {
        let mut user: User = serde_json::from_value(json!({
            "id": 7,
            "email": "ana@example.com",
            "role": "CLIENT"
        }))
        .unwrap();
        assert!(user.is_client());
        assert_eq!(user.display_name(), "ana@example.com");

        user.profile = Some(UserProfile {
            id: 1,
            full_name: "Ana Lima".to_string(),
            ..Default::default()
        });
        assert_eq!(user.display_name(), "Ana Lima");
    }
}
