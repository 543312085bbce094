//! Joining summaries back onto table rows.

use crate::aggregate::SummaryTable;
use tracing::debug;

/// Column added to the output unless configured otherwise
pub const DEFAULT_SUMMARY_COLUMN: &str = "NCBI_ENTREZ_summaries";

/// Text for rows whose identifier is missing or was never looked up
pub const NOT_CODING_PLACEHOLDER: &str =
    "Not a protein coding gene, no Entrez summary or no information available";

/// One annotation per row, aligned with `row_ids`.
pub fn annotate_rows(row_ids: &[Option<String>], summaries: &SummaryTable) -> Vec<String> {
    let annotations: Vec<String> = row_ids
        .iter()
        .map(|id| {
            id.as_deref()
                .and_then(|id| summaries.get(id))
                .unwrap_or(NOT_CODING_PLACEHOLDER)
                .to_string()
        })
        .collect();

    let unmatched = annotations
        .iter()
        .filter(|a| a.as_str() == NOT_CODING_PLACEHOLDER)
        .count();
    debug!(rows = annotations.len(), unmatched = unmatched, "Annotated rows");

    annotations
}
