use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Tracks the first accepted row of every login ID within one batch.
///
/// Built and dropped inside a single batch call.
#[derive(Debug, Default)]
pub struct BatchDeduplicator {
    first_rows: HashMap<String, usize>,
}

impl BatchDeduplicator {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            first_rows: HashMap::with_capacity(capacity),
        }
    }

    /// Row that already claimed `login_id`, if any.
    #[must_use]
    pub fn first_row(&self, login_id: &str) -> Option<usize> {
        self.first_rows.get(login_id).copied()
    }

    /// Claim `login_id` for `row`. Returns `false` if an earlier row already
    /// holds it; the earlier row is kept.
    pub fn accept(&mut self, login_id: String, row: usize) -> bool {
        match self.first_rows.entry(login_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(row);
                true
            }
        }
    }
}
