//! Identifier to summary lookup table.

use crate::error::{Result, SummaryError};
use crate::fetch::SummaryRecord;
use std::collections::HashMap;
use tracing::info;

/// Reserved key for lookup misses
pub const DEFAULT_KEY: &str = "default";

/// Text stored under [`DEFAULT_KEY`]
pub const DEFAULT_SUMMARY: &str = "No gene summary available";

/// Summary text keyed by identifier string
#[derive(Debug, Clone)]
pub struct SummaryTable {
    entries: HashMap<String, String>,
}

impl SummaryTable {
    /// Build the table from all chunk records.
    ///
    /// An identifier seen twice is rejected with `DuplicateIdentifier`.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = SummaryRecord>,
    {
        let mut entries = HashMap::new();
        let mut placeholders = 0usize;

        for record in records {
            if record.is_placeholder() {
                placeholders += 1;
            }
            if entries.contains_key(&record.id) {
                return Err(SummaryError::DuplicateIdentifier(record.id));
            }
            entries.insert(record.id, record.summary);
        }

        info!(
            identifiers = entries.len(),
            without_summary = placeholders,
            "Built summary table"
        );

        entries.insert(DEFAULT_KEY.to_string(), DEFAULT_SUMMARY.to_string());
        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Entry count, the reserved default included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
