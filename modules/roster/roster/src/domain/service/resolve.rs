use std::collections::HashMap;

use roster_sdk::ItemErrorKind;
use uuid::Uuid;

use super::{BatchRun, Bounded, bounded};
use crate::domain::error::DomainError;
use crate::domain::model::{ExistingMember, NormalizedEntry};
use crate::domain::ports::MemberStore;

/// Entries routed to a write phase by the lookup.
#[derive(Debug, Default)]
pub struct Classified {
    pub inserts: Vec<NormalizedEntry>,
    /// Member id of the existing record, with the entry overwriting it.
    pub updates: Vec<(Uuid, NormalizedEntry)>,
}

/// Keys lookup results by normalized login ID.
///
/// Older records may carry a mixed-case login ID; they still match.
#[must_use]
pub fn index_by_login(found: Vec<ExistingMember>) -> HashMap<String, ExistingMember> {
    found
        .into_iter()
        .map(|m| (m.login_id.to_lowercase(), m))
        .collect()
}

impl<S: MemberStore> BatchRun<'_, S> {
    /// One bulk lookup for all entries, then route each one.
    ///
    /// Entries whose login ID belongs to another organization (or to none)
    /// are skipped here and never reach a write.
    pub(super) async fn resolve(
        &mut self,
        entries: Vec<NormalizedEntry>,
    ) -> Result<Classified, DomainError> {
        let login_ids: Vec<String> = entries.iter().map(|e| e.login_id.clone()).collect();

        let found = match bounded(self.deadline, self.store.find_by_login_ids(&login_ids)).await? {
            Bounded::Done(found) => found,
            Bounded::NotStarted | Bounded::Interrupted => {
                tracing::warn!(
                    org_id = %self.org_id,
                    rows = entries.len(),
                    "Deadline reached during member lookup; nothing written"
                );
                self.acc
                    .fail_all(&entries, &ItemErrorKind::TimedOutBeforeAttempt);
                return Ok(Classified::default());
            }
        };

        Ok(self.classify(entries, &index_by_login(found)))
    }

    fn classify(
        &mut self,
        entries: Vec<NormalizedEntry>,
        existing: &HashMap<String, ExistingMember>,
    ) -> Classified {
        let mut out = Classified::default();
        let mut skipped = 0usize;

        for entry in entries {
            match existing.get(&entry.login_id) {
                None => out.inserts.push(entry),
                Some(found) if found.belongs_to(self.org_id) => out.updates.push((found.id, entry)),
                Some(found) => {
                    skipped += 1;
                    self.acc.skipped(&entry, found.organization_id);
                }
            }
        }

        tracing::debug!(
            org_id = %self.org_id,
            inserts = out.inserts.len(),
            updates = out.updates.len(),
            skipped,
            "Classified roster entries"
        );
        out
    }
}
