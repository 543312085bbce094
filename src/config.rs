//! Run configuration.

use crate::annotate::DEFAULT_SUMMARY_COLUMN;
use crate::dataset;
use crate::error::{Result, SummaryError};
use crate::fetch::{DEFAULT_RETRIES, DEFAULT_TIMEOUT};
use crate::request::Endpoint;
use crate::throttle::DEFAULT_SLEEP;
use std::path::PathBuf;
use std::time::Duration;

/// Identifiers per esummary request unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 300;

/// Column holding the Entrez gene accession
pub const DEFAULT_ID_COLUMN: &str = "ENTREZID";

/// Settings for one annotation run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Input table, with or without extension (`genes` reads `genes.csv`)
    pub gene_info_file: PathBuf,
    /// Explicit output path; derived from the input when `None`
    pub output: Option<PathBuf>,
    pub id_column: String,
    pub summary_column: String,
    /// Maximum identifiers per request
    pub chunk_size: usize,
    /// Pause between chunk requests
    pub sleep: Duration,
    /// Retries per chunk for transient failures
    pub retries: u32,
    /// Chunks in flight at once; 1 keeps the run strictly sequential
    pub workers: usize,
    pub timeout: Duration,
    pub endpoint: Endpoint,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gene_info_file: PathBuf::new(),
            output: None,
            id_column: DEFAULT_ID_COLUMN.to_string(),
            summary_column: DEFAULT_SUMMARY_COLUMN.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            sleep: DEFAULT_SLEEP,
            retries: DEFAULT_RETRIES,
            workers: 1,
            timeout: DEFAULT_TIMEOUT,
            endpoint: Endpoint::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(gene_info_file: impl Into<PathBuf>) -> Self {
        Self {
            gene_info_file: gene_info_file.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.gene_info_file.as_os_str().is_empty() {
            return Err(SummaryError::Config("gene_info_file is empty".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(SummaryError::Config("chunk must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(SummaryError::Config("workers must be at least 1".to_string()));
        }
        if self.id_column.trim().is_empty() || self.summary_column.trim().is_empty() {
            return Err(SummaryError::Config("column names must not be empty".to_string()));
        }
        if self.id_column == self.summary_column {
            return Err(SummaryError::Config(format!(
                "summary column must differ from id column {}",
                self.id_column
            )));
        }
        self.endpoint.validate()
    }

    pub fn input_path(&self) -> PathBuf {
        dataset::resolve_input(&self.gene_info_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| dataset::output_path(&self.input_path()))
    }
}

/// Convert a seconds value from the command line into a pause duration.
pub fn sleep_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| SummaryError::Config(format!("Invalid sleep duration {}: {}", secs, e)))
}
