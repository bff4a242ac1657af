//! Row intake: normalization and in-batch deduplication, before any store
//! access.

use std::sync::atomic::{AtomicBool, Ordering};

use roster_sdk::{ItemError, ItemErrorKind, MemberEntry};

use super::dedup::BatchDeduplicator;
use super::model::NormalizedEntry;
use super::normalize;
use super::ports::PasswordHasher;

/// Rows that survived intake, and the ones that did not.
#[derive(Debug, Default)]
pub struct Intake {
    /// Unique by login ID, in row order.
    pub entries: Vec<NormalizedEntry>,
    pub errors: Vec<ItemError>,
}

/// Normalize every row and reject later duplicates of an accepted login ID.
///
/// A row repeating the login ID of an earlier accepted row is reported as
/// "duplicate of row N" regardless of its other fields, and its password is
/// never hashed.
///
/// `cancelled` is checked before every row. Once set, that row and all
/// remaining ones are reported as timed out before the write was attempted.
#[must_use]
pub fn intake(
    rows: &[MemberEntry],
    hasher: &dyn PasswordHasher,
    cancelled: &AtomicBool,
) -> Intake {
    let mut out = Intake {
        entries: Vec::with_capacity(rows.len()),
        errors: Vec::new(),
    };
    let mut seen = BatchDeduplicator::with_capacity(rows.len());

    for (i, raw) in rows.iter().enumerate() {
        let row = i + 1;

        if cancelled.load(Ordering::Relaxed) {
            tracing::warn!(row, remaining = rows.len() - i, "Roster intake cancelled");
            out.errors.extend(rows[i..].iter().zip(row..).map(|(raw, row)| ItemError {
                row,
                login_id: normalize::login_id(&raw.login_id),
                kind: ItemErrorKind::TimedOutBeforeAttempt,
            }));
            break;
        }

        let login_id = match normalize::identity(row, raw) {
            Ok(login_id) => login_id,
            Err(e) => {
                out.errors.push(e);
                continue;
            }
        };

        if let Some(first_row) = seen.first_row(&login_id) {
            out.errors.push(ItemError {
                row,
                login_id,
                kind: ItemErrorKind::DuplicateInBatch { first_row },
            });
            continue;
        }

        match normalize::normalize_entry(row, login_id, raw, hasher) {
            Ok(entry) => {
                seen.accept(entry.login_id.clone(), row);
                out.entries.push(entry);
            }
            Err(e) => out.errors.push(e),
        }
    }

    tracing::debug!(
        accepted = out.entries.len(),
        rejected = out.errors.len(),
        "Roster intake finished"
    );
    out
}
