//! `RosterClientV1` trait definition.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::{MemberEntry, UpsertBatchResult};

/// Public API trait for the roster module (Version 1).
#[async_trait]
pub trait RosterClientV1: Send + Sync {
    /// Create or update members inside `org_id` only.
    ///
    /// Members whose login ID already belongs to another organization are
    /// never moved; they are reported in `skipped_members`. Every entry ends
    /// up in exactly one outcome list of the returned result.
    ///
    /// `timeout` bounds the whole call; `None` uses the module's configured
    /// batch timeout.
    ///
    /// # Errors
    /// Returns [`RosterError`] only when the batch as a whole could not be
    /// processed (store unreachable, internal failure).
    async fn upsert_members_in_org(
        &self,
        org_id: Uuid,
        entries: Vec<MemberEntry>,
        timeout: Option<Duration>,
    ) -> Result<UpsertBatchResult, RosterError>;
}
