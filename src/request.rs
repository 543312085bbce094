//! Esummary request URLs.
//!
//! API Details:
//! - Endpoint: GET /entrez/eutils/esummary.fcgi
//! - `id` carries a comma-separated identifier list
//! - No URL-length check is made here; an over-long URL surfaces as an API error

use crate::batch::Chunk;
use crate::error::{Result, SummaryError};
use url::Url;

/// NCBI E-utilities esummary endpoint
pub const ESUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

/// Entrez database queried by default
pub const DEFAULT_DB: &str = "gene";

/// Response format requested from the service
pub const DEFAULT_RETMODE: &str = "json";

/// URL template parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub db: String,
    pub retmode: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            base_url: ESUMMARY_URL.to_string(),
            db: DEFAULT_DB.to_string(),
            retmode: DEFAULT_RETMODE.to_string(),
        }
    }
}

impl Endpoint {
    /// Check that the base URL is an absolute http(s) URL without a query.
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.base_url)
            .map_err(|e| {
                SummaryError::Config(format!("Invalid base URL {}: {}", self.base_url, e))
            })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SummaryError::Config(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        if parsed.query().is_some() {
            return Err(SummaryError::Config(
                "Base URL must not carry a query string".to_string(),
            ));
        }
        if self.db.trim().is_empty() {
            return Err(SummaryError::Config("Database name is empty".to_string()));
        }
        Ok(())
    }

    /// Build the request URL for one chunk.
    pub fn url_for(&self, chunk: &Chunk) -> String {
        format!(
            "{}?db={}&id={}&retmode={}",
            self.base_url,
            self.db,
            chunk.joined(),
            self.retmode
        )
    }
}
