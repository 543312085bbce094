//! Identifier normalization.
//!
//! Raw accession cells arrive as text that may be empty, a missing-value
//! token, an integer (`7157`) or a float rendering of one (`7157.0`). Each is
//! coerced to its canonical decimal string.

use crate::error::{Result, SummaryError};
use std::collections::HashSet;
use tracing::debug;

/// Tokens read as a missing value in delimited gene tables
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw cell counts as missing.
pub fn is_missing(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw.trim())
}

/// Coerce one cell to its canonical identifier string.
///
/// Returns `Ok(None)` for missing cells. `row` is the 1-based data row used
/// in the error.
pub fn canonical_identifier(raw: &str, row: usize) -> Result<Option<String>> {
    let value = raw.trim();
    if is_missing(value) {
        return Ok(None);
    }

    if let Ok(n) = value.parse::<i64>() {
        return Ok(Some(n.to_string()));
    }

    // Float renderings truncate toward zero, like an integer cast
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
            Ok(Some((f.trunc() as i64).to_string()))
        }
        _ => Err(SummaryError::InvalidIdentifier {
            row,
            value: raw.to_string(),
        }),
    }
}

/// Per-row identifiers, aligned with the table rows (`None` for missing).
pub fn row_identifiers(column: &[&str]) -> Result<Vec<Option<String>>> {
    column
        .iter()
        .enumerate()
        .map(|(idx, raw)| canonical_identifier(raw, idx + 1))
        .collect()
}

/// Unique identifiers in first-occurrence order, missing rows dropped.
pub fn unique_identifiers(rows: &[Option<String>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = rows
        .iter()
        .flatten()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();

    debug!(rows = rows.len(), unique = unique.len(), "Normalized identifiers");
    unique
}
