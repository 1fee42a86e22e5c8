//! Gigboard Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Credential storage
//! - Runtime specifics
//!
//! The marketplace backend owns every business rule (escrow accounting,
//! contract transitions, payments). The payload types here only mirror
//! the shapes it returns so callers can work with typed data.

pub mod error;
pub mod ids;
pub mod model;
pub mod session;
pub mod status;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{CategoryId, ContractId, DeliverableId, JobId, ProposalId, UserId};
pub use model::{
    Category, CheckoutSession, Contract, Deliverable, Job, Listing, LoginCredentials, NewJob,
    NewProposal, Profile, Proposal, SignupData, Transaction, User, UserProfile, Wallet, Withdrawal,
};
pub use session::{RefreshResponse, Session, TokenPair};
pub use status::{
    ContractStatus, DeliverableStatus, ExperienceLevel, JobStatus, ProposalStatus,
    TransactionDirection, TransactionStatus, TransactionType, UserRole,
};
