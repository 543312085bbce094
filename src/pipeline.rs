//! One annotation run, start to finish.
//!
//! load -> normalize -> chunk -> fetch (paced) -> aggregate -> join -> write.
//! The output file is written only after every chunk has succeeded.

use crate::aggregate::SummaryTable;
use crate::annotate;
use crate::batch::{self, Chunk};
use crate::config::PipelineConfig;
use crate::dataset::GeneTable;
use crate::error::Result;
use crate::fetch::{SummaryFetcher, SummaryRecord, Transport};
use crate::normalize;
use crate::throttle::Throttle;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Identifiers prepared for lookup
#[derive(Debug, Clone)]
pub struct Plan {
    /// Canonical identifier per table row, `None` where missing
    pub row_ids: Vec<Option<String>>,
    /// Deduplicated identifiers in first-occurrence order
    pub unique_ids: Vec<String>,
    pub chunks: Vec<Chunk>,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub rows: usize,
    pub unique_ids: usize,
    pub chunks: usize,
    /// Queried identifiers the service had no summary for
    pub without_summary: usize,
    pub output: PathBuf,
    pub elapsed: Duration,
}

/// Normalize and chunk the identifier column of a loaded table.
pub fn plan(table: &GeneTable, config: &PipelineConfig) -> Result<Plan> {
    let column = table.column(&config.id_column)?;
    let row_ids = normalize::row_identifiers(&column)?;
    let unique_ids = normalize::unique_identifiers(&row_ids);
    let chunks = batch::into_chunks(&unique_ids, config.chunk_size)?;

    info!(
        rows = row_ids.len(),
        unique = unique_ids.len(),
        chunks = chunks.len(),
        "Identifiers prepared"
    );

    Ok(Plan {
        row_ids,
        unique_ids,
        chunks,
    })
}

/// Run the whole pipeline against `transport`.
pub async fn run<T: Transport>(config: &PipelineConfig, transport: T) -> Result<RunReport> {
    config.validate()?;
    let start = Instant::now();

    let input = config.input_path();
    let table = GeneTable::load(&input)?;
    if table.headers().any(|h| h == config.summary_column) {
        warn!(
            column = %config.summary_column,
            "Input already has the summary column; a second one will be appended"
        );
    }

    let plan = plan(&table, config)?;

    let mut fetcher =
        SummaryFetcher::new(transport, config.endpoint.clone()).with_retries(config.retries);
    if config.workers > 1 {
        fetcher = fetcher.with_gate(config.sleep);
    }

    let records = fetch_all(&fetcher, &plan.chunks, config, start).await?;
    let without_summary = records.iter().filter(|r| r.is_placeholder()).count();

    let summaries = SummaryTable::from_records(records)?;
    let annotations = annotate::annotate_rows(&plan.row_ids, &summaries);

    let output = config.output_path();
    table.write_with_column(&output, &config.summary_column, &annotations)?;

    let report = RunReport {
        rows: table.len(),
        unique_ids: plan.unique_ids.len(),
        chunks: plan.chunks.len(),
        without_summary,
        output,
        elapsed: start.elapsed(),
    };

    info!(
        output = %report.output.display(),
        rows = report.rows,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "Exported annotated table"
    );

    Ok(report)
}

/// Fetch every chunk, keeping chunk order in the returned records.
///
/// With one worker chunks run strictly one after another, pausing between
/// them. With more, up to `workers` requests overlap and the fetcher's gate
/// paces request starts.
pub async fn fetch_all<T: Transport>(
    fetcher: &SummaryFetcher<T>,
    chunks: &[Chunk],
    config: &PipelineConfig,
    start: Instant,
) -> Result<Vec<SummaryRecord>> {
    let total = chunks.len();
    let mut records = Vec::with_capacity(chunks.iter().map(Chunk::len).sum());
    let mut completed = 0usize;

    if config.workers <= 1 {
        let throttle = Throttle::new(config.sleep);
        for chunk in chunks {
            let batch = fetcher.fetch_chunk(chunk).await?;
            records.extend(batch);
            completed += 1;
            report_progress(completed, total, start);

            // No pause after the final chunk; the export follows immediately
            if completed < total {
                throttle.pause().await;
            }
        }
    } else {
        let mut results = stream::iter(chunks)
            .map(|chunk| fetcher.fetch_chunk(chunk))
            .buffered(config.workers);

        while let Some(batch) = results.try_next().await? {
            records.extend(batch);
            completed += 1;
            report_progress(completed, total, start);
        }
    }

    info!(chunks = total, records = records.len(), "Retrieved summaries");
    Ok(records)
}

fn report_progress(completed: usize, total: usize, start: Instant) {
    info!(
        chunk = completed,
        total = total,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "{} out of {} chunks completed",
        completed,
        total
    );
}
