//! Delimited gene table loading and writing.
//!
//! The table is kept as raw string records so the annotated output reproduces
//! every original column untouched, in its original order.

use crate::error::{Result, SummaryError};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension assumed when the input is given as a bare base name
pub const DEFAULT_EXTENSION: &str = "csv";

/// Suffix appended to the input stem for the annotated output
pub const OUTPUT_SUFFIX: &str = "_summary";

/// A loaded gene table: header row plus data rows
#[derive(Debug, Clone)]
pub struct GeneTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    delimiter: u8,
}

impl GeneTable {
    /// Load a delimited file; the delimiter is chosen from the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let delimiter = delimiter_for(path);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

        info!(
            path = %path.display(),
            columns = headers.len(),
            rows = rows.len(),
            "Loaded gene table"
        );

        Ok(Self {
            headers,
            rows,
            delimiter,
        })
    }

    /// Build a table in memory (comma-delimited).
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers: StringRecord::from(headers),
            rows: rows.into_iter().map(StringRecord::from).collect(),
            delimiter: b',',
        }
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cells of a named column, one per row.
    ///
    /// Short rows yield an empty cell rather than shifting alignment.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self
            .headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| SummaryError::MissingColumn(name.to_string()))?;

        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).unwrap_or(""))
            .collect())
    }

    /// Write the table with one extra trailing column.
    ///
    /// `values` must hold exactly one entry per row.
    pub fn write_with_column(&self, path: &Path, column: &str, values: &[String]) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(SummaryError::Config(format!(
                "Annotation has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(path)?;

        let mut header = self.headers.clone();
        header.push_field(column);
        writer.write_record(&header)?;

        let width = self.headers.len();
        let mut truncated = 0usize;
        for (row, value) in self.rows.iter().zip(values) {
            if row.len() > width {
                truncated += 1;
            }
            // Exactly one cell per header, so the summary lands under its own header
            let mut record: StringRecord = (0..width).map(|i| row.get(i).unwrap_or("")).collect();
            record.push_field(value);
            writer.write_record(&record)?;
        }

        if truncated > 0 {
            warn!(rows = truncated, "Dropped cells beyond the header width");
        }

        writer.flush()?;
        debug!(path = %path.display(), rows = self.rows.len(), "Wrote annotated table");
        Ok(())
    }
}

/// Resolve a `gene_info_file` argument to the file to read.
///
/// A bare base name (no extension) gets `.csv` appended.
pub fn resolve_input(gene_info_file: &Path) -> PathBuf {
    if gene_info_file.extension().is_some() {
        gene_info_file.to_path_buf()
    } else {
        let mut name = gene_info_file.as_os_str().to_os_string();
        name.push(".");
        name.push(DEFAULT_EXTENSION);
        PathBuf::from(name)
    }
}

/// Output path: `<stem>_summary.<ext>` next to the input.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    input.with_file_name(format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext))
}

fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}
