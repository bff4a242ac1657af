use std::collections::{BTreeSet, HashMap};

use roster_sdk::{ItemError, ItemErrorKind, MemberSummary, SkippedMember, UpsertBatchResult};
use tokio::time::{Instant, timeout_at};
use uuid::Uuid;

use crate::domain::model::NormalizedEntry;
use crate::domain::ports::MemberStore;

/// Shown when the owning member record has no organization.
pub const NO_ORGANIZATION: &str = "(no organization)";

/// Shown when the owning organization could not be resolved to a name.
pub const UNKNOWN_ORGANIZATION: &str = "(unknown organization)";

#[derive(Debug)]
struct PendingSkip {
    row: usize,
    login_id: String,
    owner: Option<Uuid>,
}

/// Collects the terminal outcome of every row while the phases run.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    created: Vec<MemberSummary>,
    updated: Vec<MemberSummary>,
    skipped: Vec<PendingSkip>,
    errors: Vec<ItemError>,
}

impl BatchAccumulator {
    pub fn created(&mut self, entry: &NormalizedEntry) {
        self.created.push(entry.summary());
    }

    pub fn updated(&mut self, entry: &NormalizedEntry) {
        self.updated.push(entry.summary());
    }

    pub fn skipped(&mut self, entry: &NormalizedEntry, owner: Option<Uuid>) {
        self.skipped.push(PendingSkip {
            row: entry.row,
            login_id: entry.login_id.clone(),
            owner,
        });
    }

    pub fn failed(&mut self, entry: &NormalizedEntry, kind: ItemErrorKind) {
        self.errors.push(ItemError {
            row: entry.row,
            login_id: entry.login_id.clone(),
            kind,
        });
    }

    pub fn fail_all<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a NormalizedEntry>,
        kind: &ItemErrorKind,
    ) {
        for entry in entries {
            self.failed(entry, kind.clone());
        }
    }

    pub fn rejected(&mut self, errors: impl IntoIterator<Item = ItemError>) {
        self.errors.extend(errors);
    }

    /// Resolve owner names for skipped rows with one lookup and build the
    /// final result, every list ordered by row.
    ///
    /// The lookup is best-effort: the writes are already committed, so a
    /// failure here degrades to [`UNKNOWN_ORGANIZATION`] instead of failing the
    /// batch.
    pub async fn finish<S>(self, store: &S, deadline: Instant) -> UpsertBatchResult
    where
        S: MemberStore + ?Sized,
    {
        let Self {
            mut created,
            mut updated,
            mut skipped,
            mut errors,
        } = self;

        let owners: Vec<Uuid> = skipped
            .iter()
            .filter_map(|s| s.owner)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let names = organization_names(store, &owners, deadline).await;

        skipped.sort_by_key(|s| s.row);
        let skipped_members: Vec<SkippedMember> = skipped
            .into_iter()
            .map(|s| SkippedMember {
                row: s.row,
                login_id: s.login_id,
                org_name: match s.owner {
                    None => NO_ORGANIZATION.to_owned(),
                    Some(id) => names
                        .get(&id)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_ORGANIZATION.to_owned()),
                },
                reason: SkippedMember::REASON.to_owned(),
            })
            .collect();

        created.sort_by_key(|m| m.row);
        updated.sort_by_key(|m| m.row);
        errors.sort_by_key(|e| e.row);

        UpsertBatchResult {
            created: created.len(),
            updated: updated.len(),
            skipped: skipped_members.len(),
            created_members: created,
            updated_members: updated,
            skipped_members,
            item_errors: errors,
        }
    }
}

async fn organization_names<S>(
    store: &S,
    org_ids: &[Uuid],
    deadline: Instant,
) -> HashMap<Uuid, String>
where
    S: MemberStore + ?Sized,
{
    if org_ids.is_empty() {
        return HashMap::new();
    }
    if Instant::now() >= deadline {
        tracing::warn!(
            organizations = org_ids.len(),
            "Deadline reached before organization names were resolved"
        );
        return HashMap::new();
    }
    match timeout_at(deadline, store.find_organization_names(org_ids)).await {
        Ok(Ok(names)) => names,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Organization name lookup failed; using fallback labels");
            HashMap::new()
        }
        Err(_) => {
            tracing::warn!("Organization name lookup timed out; using fallback labels");
            HashMap::new()
        }
    }
}
