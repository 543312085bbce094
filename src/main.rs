//! entrez-summary - Gene table annotation with NCBI Entrez summaries
//!
//! Reads a table of genes keyed by Entrez ID, looks up each gene's summary
//! through the E-utilities esummary endpoint, and writes the table back out
//! with a summary column.
//!
//! ## Usage
//!
//! ### Annotate
//! ```bash
//! entrez-summary annotate data/genes --chunk 300 --sleep-duration 3
//! ```
//!
//! ### Dry run (print request URLs)
//! ```bash
//! entrez-summary urls data/genes
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use entrez_summary::annotate::DEFAULT_SUMMARY_COLUMN;
use entrez_summary::config::{self, PipelineConfig, DEFAULT_CHUNK_SIZE, DEFAULT_ID_COLUMN};
use entrez_summary::dataset::GeneTable;
use entrez_summary::fetch::{HttpTransport, DEFAULT_RETRIES};
use entrez_summary::pipeline;
use entrez_summary::request::{Endpoint, DEFAULT_DB, ESUMMARY_URL};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Annotate gene tables with NCBI Entrez gene summaries
#[derive(Parser)]
#[command(name = "entrez-summary")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch summaries and write the annotated table
    Annotate {
        #[command(flatten)]
        input: InputArgs,

        /// Seconds to pause between chunk requests
        #[arg(long, default_value_t = 3.0)]
        sleep_duration: f64,

        /// Retries per chunk for transient failures (0 aborts on the first)
        #[arg(long, default_value_t = DEFAULT_RETRIES)]
        retries: u32,

        /// Chunks fetched concurrently (1 = sequential)
        #[arg(long, default_value_t = 1)]
        workers: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,

        /// Summary column name
        #[arg(long, default_value = DEFAULT_SUMMARY_COLUMN)]
        summary_column: String,

        /// Output file (default: <input>_summary.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the request URL of every chunk without fetching
    Urls {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Gene table; a name without extension reads <name>.csv
    gene_info_file: PathBuf,

    /// Maximum identifiers per request
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk: usize,

    /// Column holding Entrez gene IDs
    #[arg(long, default_value = DEFAULT_ID_COLUMN)]
    id_column: String,

    /// Esummary endpoint
    #[arg(long, default_value = ESUMMARY_URL)]
    base_url: String,

    /// Entrez database
    #[arg(long, default_value = DEFAULT_DB)]
    db: String,
}

impl InputArgs {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            chunk_size: self.chunk,
            id_column: self.id_column,
            endpoint: Endpoint {
                base_url: self.base_url,
                db: self.db,
                ..Default::default()
            },
            ..PipelineConfig::new(self.gene_info_file)
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    let outcome = match cli.command {
        Commands::Annotate {
            input,
            sleep_duration,
            retries,
            workers,
            timeout,
            summary_column,
            output,
        } => {
            let config = PipelineConfig {
                sleep: config::sleep_from_secs(sleep_duration)?,
                retries,
                workers,
                timeout: Duration::from_secs(timeout),
                summary_column,
                output,
                ..input.into_config()
            };
            run_annotate(config).await
        }
        Commands::Urls { input } => print_urls(&input.into_config()),
    };

    if let Err(ref e) = outcome {
        error!(error = %e, "Run aborted");
    }
    outcome
}

// ============================================================================
// Commands
// ============================================================================

async fn run_annotate(config: PipelineConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    println!("Input: {}", config.input_path().display());
    println!(
        "Chunk size: {}, pause: {:.1}s, workers: {}, retries: {}",
        config.chunk_size,
        config.sleep.as_secs_f64(),
        config.workers,
        config.retries
    );

    let transport = HttpTransport::new(config.timeout)?;
    let report = pipeline::run(&config, transport)
        .await
        .context("Annotation run failed")?;

    println!(
        "Annotated {} rows ({} unique IDs, {} chunks, {} without summary)",
        report.rows, report.unique_ids, report.chunks, report.without_summary
    );
    println!(
        "\n✓ Exported: {} (time taken {:.1}s)",
        report.output.display(),
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

fn print_urls(config: &PipelineConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let input = config.input_path();
    let table = GeneTable::load(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let plan = pipeline::plan(&table, config)?;

    for chunk in &plan.chunks {
        println!("{}", config.endpoint.url_for(chunk));
    }
    eprintln!(
        "{} unique IDs in {} chunks",
        plan.unique_ids.len(),
        plan.chunks.len()
    );
    Ok(())
}
