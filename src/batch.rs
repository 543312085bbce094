//! Splitting identifiers into request-sized chunks.

use crate::error::{Result, SummaryError};
use tracing::info;

/// Separator used by the esummary `id` parameter
pub const ID_SEPARATOR: char = ',';

/// One request's worth of identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    ids: Vec<String>,
    joined: String,
}

impl Chunk {
    pub fn new(ids: Vec<String>) -> Self {
        let joined = ids.join(&ID_SEPARATOR.to_string());
        Self { ids, joined }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Comma-joined form used in the request URL
    pub fn joined(&self) -> &str {
        &self.joined
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Partition identifiers into contiguous chunks of at most `chunk_size`.
pub fn into_chunks(ids: &[String], chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(SummaryError::Config("chunk size must be at least 1".to_string()));
    }

    let chunks: Vec<Chunk> = ids
        .chunks(chunk_size)
        .map(|c| Chunk::new(c.to_vec()))
        .collect();

    info!(
        ids = ids.len(),
        chunk_size = chunk_size,
        chunks = chunks.len(),
        "Chunked identifiers"
    );

    Ok(chunks)
}
