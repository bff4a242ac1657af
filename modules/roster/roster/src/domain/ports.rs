//! Ports the reconciliation engine depends on.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::model::{ExistingMember, MemberUpdate, NewMemberRecord};

/// Classification of a single failed item in a bulk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailureKind {
    /// Unique login ID violated: another writer got there first.
    Duplicate,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    /// Position of the failed item in the submitted batch.
    pub index: usize,
    pub kind: WriteFailureKind,
    pub message: String,
}

/// Per-item result of an unordered bulk update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Matched,
    /// The filter selected no record.
    Unmatched,
    Failed { message: String },
}

/// Failure of a whole store call (as opposed to a single item in it).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Other(String),
}

/// Member persistence operations used by the batch upsert.
///
/// Bulk writes are unordered and non-atomic: one bad item never prevents the
/// others from being written, and the returned per-item results tell them
/// apart. `Err` is reserved for failures of the call itself.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Find members whose login ID, compared case-insensitively, is in
    /// `login_ids`. Callers pass lowercase IDs.
    async fn find_by_login_ids(
        &self,
        login_ids: &[String],
    ) -> Result<Vec<ExistingMember>, StoreError>;

    /// Insert all records; returns only the failed items.
    async fn insert_unordered(
        &self,
        records: Vec<NewMemberRecord>,
    ) -> Result<Vec<WriteFailure>, StoreError>;

    /// Apply all updates; returns one outcome per update, in input order.
    async fn update_unordered(
        &self,
        updates: Vec<MemberUpdate>,
    ) -> Result<Vec<UpdateOutcome>, StoreError>;

    /// Names of the given organizations. Unknown ids are absent from the map.
    async fn find_organization_names(
        &self,
        org_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>, StoreError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(pub String);

/// One-way password hash.
pub trait PasswordHasher: Send + Sync {
    /// # Errors
    /// Returns [`PasswordHashError`] if the value cannot be hashed.
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError>;
}
