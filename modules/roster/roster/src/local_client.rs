//! Local implementation of `RosterClientV1`.
//!
//! Delegates to the domain service within the same process, turning the
//! caller's time budget into a deadline and domain errors into SDK errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use roster_sdk::{MemberEntry, RosterClientV1, RosterError, UpsertBatchResult};

use crate::domain::ports::MemberStore;
use crate::domain::service::Service;

/// Budgets beyond this are treated as unbounded.
const MAX_BUDGET: Duration = Duration::from_secs(86_400 * 365 * 30);

pub struct RosterLocalClient<S: MemberStore> {
    service: Arc<Service<S>>,
    batch_timeout: Duration,
}

impl<S: MemberStore> RosterLocalClient<S> {
    /// `batch_timeout` applies to calls that pass no timeout of their own.
    #[must_use]
    pub fn new(service: Arc<Service<S>>, batch_timeout: Duration) -> Self {
        Self {
            service,
            batch_timeout,
        }
    }
}

#[async_trait]
impl<S: MemberStore + 'static> RosterClientV1 for RosterLocalClient<S> {
    async fn upsert_members_in_org(
        &self,
        org_id: Uuid,
        entries: Vec<MemberEntry>,
        timeout: Option<Duration>,
    ) -> Result<UpsertBatchResult, RosterError> {
        let deadline = deadline_after(timeout.unwrap_or(self.batch_timeout));
        self.service
            .upsert_members_in_org(org_id, entries, deadline)
            .await
            .map_err(Into::into)
    }
}

fn deadline_after(budget: Duration) -> Instant {
    Instant::now() + budget.min(MAX_BUDGET)
}
