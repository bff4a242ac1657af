use std::collections::HashMap;

use roster_sdk::ItemErrorKind;
use uuid::Uuid;

use super::resolve::index_by_login;
use super::{BatchRun, Bounded, bounded};
use crate::domain::error::DomainError;
use crate::domain::model::{MemberFilter, MemberUpdate, NormalizedEntry};
use crate::domain::ports::{MemberStore, UpdateOutcome, WriteFailure, WriteFailureKind};

fn missing_outcome() -> UpdateOutcome {
    UpdateOutcome::Failed {
        message: "store reported no result for this item".to_owned(),
    }
}

impl<S: MemberStore> BatchRun<'_, S> {
    /// Bulk insert of members that did not exist at lookup time.
    ///
    /// Returns the entries whose insert lost a race on the unique login ID.
    pub(super) async fn insert_new(
        &mut self,
        entries: Vec<NormalizedEntry>,
    ) -> Result<Vec<NormalizedEntry>, DomainError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let records = entries
            .iter()
            .map(|e| e.new_record(self.org_id, self.now))
            .collect();
        tracing::debug!(org_id = %self.org_id, count = entries.len(), "Inserting new members");

        let failures = match bounded(self.deadline, self.store.insert_unordered(records)).await? {
            Bounded::Done(failures) => failures,
            Bounded::NotStarted => {
                self.acc
                    .fail_all(&entries, &ItemErrorKind::TimedOutBeforeAttempt);
                return Ok(Vec::new());
            }
            Bounded::Interrupted => {
                tracing::warn!(
                    org_id = %self.org_id,
                    count = entries.len(),
                    "Deadline reached during member insert; outcome unconfirmed"
                );
                self.acc
                    .fail_all(&entries, &ItemErrorKind::TimedOutUnconfirmed);
                return Ok(Vec::new());
            }
        };

        let mut by_index: HashMap<usize, WriteFailure> =
            failures.into_iter().map(|f| (f.index, f)).collect();
        let mut raced = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            match by_index.remove(&index) {
                None => self.acc.created(&entry),
                Some(WriteFailure {
                    kind: WriteFailureKind::Duplicate,
                    ..
                }) => raced.push(entry),
                Some(WriteFailure { message, .. }) => {
                    self.acc
                        .failed(&entry, ItemErrorKind::InsertFailed { message });
                }
            }
        }

        if !by_index.is_empty() {
            tracing::warn!(
                stray = by_index.len(),
                "Store reported insert failures outside the submitted batch"
            );
        }
        if !raced.is_empty() {
            tracing::warn!(
                org_id = %self.org_id,
                raced = raced.len(),
                "Login IDs inserted concurrently since lookup; retrying as updates"
            );
        }
        Ok(raced)
    }

    /// Retry lost inserts as updates that only match while the login ID is
    /// owned by the target organization.
    ///
    /// Unmatched retries are re-resolved with one more lookup: a record now
    /// owned elsewhere is skipped, anything else is reported as a concurrent
    /// change.
    pub(super) async fn reconcile_races(
        &mut self,
        raced: Vec<NormalizedEntry>,
    ) -> Result<(), DomainError> {
        if raced.is_empty() {
            return Ok(());
        }

        let updates = raced
            .iter()
            .map(|e| MemberUpdate {
                filter: MemberFilter::LoginIdInOrg {
                    login_id: e.login_id.clone(),
                    org_id: self.org_id,
                },
                changes: e.changes(self.now),
            })
            .collect();

        let Some(outcomes) = self.bounded_update(&raced, updates).await? else {
            return Ok(());
        };

        let mut unmatched = Vec::new();
        let mut outcomes = outcomes.into_iter();
        for entry in raced {
            match outcomes.next().unwrap_or_else(missing_outcome) {
                UpdateOutcome::Matched => self.acc.updated(&entry),
                UpdateOutcome::Unmatched => unmatched.push(entry),
                UpdateOutcome::Failed { message } => {
                    self.acc
                        .failed(&entry, ItemErrorKind::UpdateFailed { message });
                }
            }
        }

        if unmatched.is_empty() {
            return Ok(());
        }

        let login_ids: Vec<String> = unmatched.iter().map(|e| e.login_id.clone()).collect();
        let current = match bounded(self.deadline, self.store.find_by_login_ids(&login_ids)).await? {
            Bounded::Done(found) => index_by_login(found),
            Bounded::NotStarted | Bounded::Interrupted => {
                self.acc
                    .fail_all(&unmatched, &ItemErrorKind::TimedOutUnconfirmed);
                return Ok(());
            }
        };

        for entry in unmatched {
            match current.get(&entry.login_id) {
                Some(owner) if !owner.belongs_to(self.org_id) => {
                    tracing::info!(
                        row = entry.row,
                        "Login ID claimed by another organization during upload; skipped"
                    );
                    self.acc.skipped(&entry, owner.organization_id);
                }
                _ => self.acc.failed(&entry, ItemErrorKind::ConcurrentChange),
            }
        }
        Ok(())
    }

    /// Bulk update of members that belonged to the target organization at
    /// lookup time, keyed by member id.
    pub(super) async fn update_existing(
        &mut self,
        targets: Vec<(Uuid, NormalizedEntry)>,
    ) -> Result<(), DomainError> {
        if targets.is_empty() {
            return Ok(());
        }

        let updates = targets
            .iter()
            .map(|(id, e)| MemberUpdate {
                filter: MemberFilter::ById(*id),
                changes: e.changes(self.now),
            })
            .collect();
        let entries: Vec<NormalizedEntry> = targets.into_iter().map(|(_, e)| e).collect();
        tracing::debug!(org_id = %self.org_id, count = entries.len(), "Updating existing members");

        let Some(outcomes) = self.bounded_update(&entries, updates).await? else {
            return Ok(());
        };

        let mut outcomes = outcomes.into_iter();
        for entry in entries {
            match outcomes.next().unwrap_or_else(missing_outcome) {
                UpdateOutcome::Matched => self.acc.updated(&entry),
                UpdateOutcome::Unmatched => {
                    self.acc.failed(&entry, ItemErrorKind::ConcurrentChange);
                }
                UpdateOutcome::Failed { message } => {
                    self.acc
                        .failed(&entry, ItemErrorKind::UpdateFailed { message });
                }
            }
        }
        Ok(())
    }

    /// Run one bulk update under the deadline. `None` means the deadline hit
    /// and every entry already has its timeout outcome.
    async fn bounded_update(
        &mut self,
        entries: &[NormalizedEntry],
        updates: Vec<MemberUpdate>,
    ) -> Result<Option<Vec<UpdateOutcome>>, DomainError> {
        match bounded(self.deadline, self.store.update_unordered(updates)).await? {
            Bounded::Done(outcomes) => Ok(Some(outcomes)),
            Bounded::NotStarted => {
                self.acc
                    .fail_all(entries, &ItemErrorKind::TimedOutBeforeAttempt);
                Ok(None)
            }
            Bounded::Interrupted => {
                tracing::warn!(
                    org_id = %self.org_id,
                    count = entries.len(),
                    "Deadline reached during member update; outcome unconfirmed"
                );
                self.acc
                    .fail_all(entries, &ItemErrorKind::TimedOutUnconfirmed);
                Ok(None)
            }
        }
    }
}
