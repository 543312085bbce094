//! # entrez-summary
//!
//! Annotate a gene table with NCBI Entrez gene summaries.
//!
//! ## Modules
//!
//! - [`dataset`] - Delimited table loading and writing
//! - [`normalize`] - Identifier coercion and deduplication
//! - [`batch`] - Request-sized identifier chunks
//! - [`request`] - Esummary URL construction
//! - [`fetch`] - Esummary client and response parsing
//! - [`throttle`] - Request pacing
//! - [`aggregate`] - Identifier to summary table
//! - [`annotate`] - Joining summaries back onto rows
//! - [`pipeline`] - One complete run
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use entrez_summary::{config::PipelineConfig, fetch::HttpTransport, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::new("genes");
//!     let transport = HttpTransport::new(config.timeout)?;
//!     let report = pipeline::run(&config, transport).await?;
//!     println!("Wrote {}", report.output.display());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod annotate;
pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod request;
pub mod throttle;

pub use error::{Result, SummaryError};
