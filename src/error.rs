//! Custom error types for entrez-summary.
//!
//! Every fallible operation returns `Result<T, SummaryError>`. The remote
//! variants (`Network`, `Api`, `RateLimited`, `MalformedResponse`) abort a run
//! unless the fetcher's retry budget recovers them.

use thiserror::Error;

/// Main error type for entrez-summary operations.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// An identifier cell holds a value that cannot be coerced to an integer
    #[error("Invalid identifier {value:?} in data row {row}")]
    InvalidIdentifier {
        /// 1-based data row (header excluded)
        row: usize,
        /// Raw cell content
        value: String,
    },

    /// The identifier column is not present in the input header
    #[error("Column not found: {0}")]
    MissingColumn(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Lookup service answered with a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Status text or service message
        message: String,
    },

    /// Rate limited by the lookup service
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Response body is not the expected esummary JSON shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An identifier was aggregated twice
    #[error("Duplicate identifier in summary table: {0}")]
    DuplicateIdentifier(String),

    /// Delimited file read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl SummaryError {
    /// True for failures originating from the lookup service or the transport.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Api { .. }
                | Self::RateLimited(_)
                | Self::MalformedResponse(_)
                | Self::Json(_)
        )
    }

    /// True when repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => !e.is_builder() && !e.is_decode(),
            Self::RateLimited(_) => true,
            Self::Api { code, .. } => *code >= 500,
            _ => false,
        }
    }
}

/// Result type alias using `SummaryError`
pub type Result<T> = std::result::Result<T, SummaryError>;
