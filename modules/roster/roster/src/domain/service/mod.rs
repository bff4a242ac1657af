//! Batch member reconciliation.
//!
//! ## Pipeline
//!
//! One call runs these phases strictly in order, each depending on the
//! outcome of the previous one:
//!
//! 1. intake: normalize rows, reject in-batch duplicates (no store access)
//! 2. `resolve`: one bulk lookup by login ID, then route every entry to
//!    insert, update (same organization) or skip (other organization)
//! 3. `insert_new`: unordered bulk insert of new members
//! 4. `reconcile_races`: inserts that hit the unique login ID index are
//!    retried as updates conditioned on the target organization
//! 5. `update_existing`: unordered bulk update keyed by member id
//! 6. `finish`: one organization-name lookup for skipped rows, then the result
//!
//! No locks are taken. Writers racing between the lookup and the insert are
//! detected through the store's unique index and reconciled in step 4.
//!
//! ## Deadline
//!
//! Every store call is bounded by the caller's deadline, and so is intake:
//! when the deadline passes during hashing the worker stops before its next
//! row. Writes acknowledged before it elapses stay committed; rows of an
//! interrupted phase are reported as unconfirmed and rows of phases never
//! started as not attempted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use roster_sdk::{MemberEntry, UpsertBatchResult};
use time::OffsetDateTime;
use tokio::time::{Instant, timeout_at};
use uuid::Uuid;

use super::error::DomainError;
use super::intake::{Intake, intake};
use super::ports::{MemberStore, PasswordHasher, StoreError};

mod aggregate;
mod resolve;
mod write;

pub use aggregate::{NO_ORGANIZATION, UNKNOWN_ORGANIZATION};

use aggregate::BatchAccumulator;

// ============================================================================
// Service Implementation
// ============================================================================

pub struct Service<S: MemberStore> {
    store: Arc<S>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<S: MemberStore> Service<S> {
    #[must_use]
    pub fn new(store: Arc<S>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Create or update members of `org_id` from `rows`.
    ///
    /// Every row ends in exactly one outcome list of the result. Members owned
    /// by another organization are skipped, never moved.
    ///
    /// # Errors
    /// Returns [`DomainError`] when the batch as a whole cannot be processed:
    /// a nil organization id, a store call failing outright, or the intake
    /// worker dying.
    pub async fn upsert_members_in_org(
        &self,
        org_id: Uuid,
        rows: Vec<MemberEntry>,
        deadline: Instant,
    ) -> Result<UpsertBatchResult, DomainError> {
        if org_id.is_nil() {
            return Err(DomainError::validation(
                "org_id",
                "organization id must not be nil",
            ));
        }

        let total = rows.len();
        tracing::info!(%org_id, rows = total, "Upserting member batch");
        if rows.is_empty() {
            return Ok(UpsertBatchResult::default());
        }

        let Intake { entries, errors } = self.run_intake(rows, deadline).await?;

        let mut run = BatchRun::new(self.store.as_ref(), org_id, deadline);
        run.acc.rejected(errors);

        if !entries.is_empty() {
            let classified = run.resolve(entries).await?;
            let raced = run.insert_new(classified.inserts).await?;
            run.reconcile_races(raced).await?;
            run.update_existing(classified.updates).await?;
        }

        let result = run.acc.finish(self.store.as_ref(), deadline).await;
        debug_assert_eq!(result.rows_accounted(), total, "every row has one outcome");

        tracing::info!(
            %org_id,
            created = result.created,
            updated = result.updated,
            skipped = result.skipped,
            errors = result.item_errors.len(),
            "Member batch upserted"
        );
        Ok(result)
    }

    /// Runs intake on the blocking pool. Past the deadline the worker stops
    /// before its next row and its partial result is kept.
    async fn run_intake(
        &self,
        rows: Vec<MemberEntry>,
        deadline: Instant,
    ) -> Result<Intake, DomainError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut worker = {
            let hasher = Arc::clone(&self.hasher);
            let cancelled = Arc::clone(&cancelled);
            tokio::task::spawn_blocking(move || intake(&rows, hasher.as_ref(), &cancelled))
        };

        let joined = match timeout_at(deadline, &mut worker).await {
            Ok(joined) => joined,
            Err(_) => {
                cancelled.store(true, Ordering::Relaxed);
                worker.await
            }
        };
        joined.map_err(|e| DomainError::internal(format!("roster intake worker failed: {e}")))
    }
}

// ============================================================================
// Per-batch state
// ============================================================================

/// State of one batch call. Dropped when the call returns.
struct BatchRun<'a, S: MemberStore> {
    store: &'a S,
    org_id: Uuid,
    /// Single timestamp for every write of the batch.
    now: OffsetDateTime,
    deadline: Instant,
    acc: BatchAccumulator,
}

impl<'a, S: MemberStore> BatchRun<'a, S> {
    fn new(store: &'a S, org_id: Uuid, deadline: Instant) -> Self {
        Self {
            store,
            org_id,
            now: OffsetDateTime::now_utc(),
            deadline,
            acc: BatchAccumulator::default(),
        }
    }
}

/// Result of one deadline-bounded store call.
enum Bounded<T> {
    Done(T),
    /// The deadline had passed before the call was issued.
    NotStarted,
    /// The deadline passed while the call was in flight.
    Interrupted,
}

async fn bounded<T, F>(deadline: Instant, call: F) -> Result<Bounded<T>, DomainError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    if Instant::now() >= deadline {
        return Ok(Bounded::NotStarted);
    }
    match timeout_at(deadline, call).await {
        Ok(Ok(value)) => Ok(Bounded::Done(value)),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Ok(Bounded::Interrupted),
    }
}
