//! Role and status enums for marketplace payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Role of an account on the marketplace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Posts jobs and funds contracts.
    Client,
    /// Submits proposals and delivers work.
    #[default]
    Freelancer,
}

impl UserRole {
    /// Wire literal used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Freelancer => "FREELANCER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CLIENT" => Ok(Self::Client),
            "FREELANCER" => Ok(Self::Freelancer),
            _ => Err(CoreError::UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// Seniority a job posting asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceLevel {
    Junior,
    #[default]
    Mid,
    Senior,
}

impl ExperienceLevel {
    /// Wire literal used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "JUNIOR",
            Self::Mid => "MID",
            Self::Senior => "SENIOR",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JUNIOR" => Ok(Self::Junior),
            "MID" => Ok(Self::Mid),
            "SENIOR" => Ok(Self::Senior),
            _ => Err(CoreError::UnknownVariant {
                kind: "experience level",
                value: s.to_string(),
            }),
        }
    }
}

/// Status of a Job posting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepting proposals.
    #[default]
    Open,
    /// No longer accepting proposals.
    Closed,
}

/// Status of a Proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    /// Awaiting the client's decision.
    #[default]
    Pending,
    /// Client accepted; a contract exists.
    Accepted,
    /// Client rejected.
    Rejected,
}

impl ProposalStatus {
    /// Returns true once the client has decided.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Status of a Contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    /// Funded and in progress.
    #[serde(rename = "ACTIVE")]
    Active,
    /// Deliverable approved, escrow released.
    #[serde(rename = "COMPLETED")]
    Completed,
    /// Cancelled by either party.
    #[serde(rename = "CANCELLED")]
    Cancelled,
    /// Waiting for the client to fund escrow.
    #[default]
    #[serde(rename = "PENDING FUNDS")]
    PendingFunds,
}

impl ContractStatus {
    /// Returns true if the contract can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Review status of a Deliverable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliverableStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Direction of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionDirection {
    Credit,
    Debit,
}

/// Kind of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    EscrowLock,
    EscrowRelease,
    Refund,
    Withdrawal,
    Earning,
    Adjustment,
}

/// Settlement status of a wallet transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Success,
    Failed,
}
