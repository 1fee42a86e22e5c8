//! Newtype wrappers for identifiers to ensure type safety.
//!
//! The backend issues integer primary keys. Wrapping them keeps a job id
//! from being passed where a contract id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

fn parse_id(kind: &str, s: &str) -> Result<u64, CoreError> {
    s.trim().parse::<u64>().map_err(|_| {
        CoreError::InvalidInput(format!("{} must be a positive integer, got '{}'", kind, s))
    })
}

/// Unique identifier for a User account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Create a new UserId from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("UserId", s).map(Self)
    }
}

/// Unique identifier for a job Category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(u64);

impl CategoryId {
    /// Create a new CategoryId from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for CategoryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for CategoryId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("CategoryId", s).map(Self)
    }
}

/// Unique identifier for a Job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Create a new JobId from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for JobId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("JobId", s).map(Self)
    }
}

/// Unique identifier for a Proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(u64);

impl ProposalId {
    /// Create a new ProposalId from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ProposalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for ProposalId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("ProposalId", s).map(Self)
    }
}

/// Unique identifier for a Contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(u64);

impl ContractId {
    /// Create a new ContractId from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ContractId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for ContractId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("ContractId", s).map(Self)
    }
}

/// Unique identifier for a Deliverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliverableId(u64);

impl DeliverableId {
    /// Create a new DeliverableId from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeliverableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for DeliverableId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for DeliverableId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_id("DeliverableId", s).map(Self)
    }
}
