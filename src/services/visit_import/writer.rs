//! Chunked, conflict-tolerant visit writer
//!
//! Chunks are written one after another in validation order. Each chunk is a
//! single statement; there is no transaction spanning chunks, so a failure
//! leaves every earlier chunk committed.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::db::queries;
use crate::error::ImportError;
use crate::types::ImportRecord;

/// Records per insert statement
pub const CHUNK_SIZE: usize = 500;

/// Storage for imported visits
#[async_trait]
pub trait VisitSink: Send + Sync {
    /// Insert `chunk`, silently skipping rows whose (store, rep, visited_at)
    /// already exists. Returns the number of rows actually written.
    async fn insert_ignoring_duplicates(&self, chunk: &[ImportRecord]) -> Result<u64>;
}

/// Writes visits into Postgres
pub struct PgVisitSink {
    pool: PgPool,
}

impl PgVisitSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitSink for PgVisitSink {
    async fn insert_ignoring_duplicates(&self, chunk: &[ImportRecord]) -> Result<u64> {
        queries::visit::insert_imported_visits(&self.pool, chunk).await
    }
}

/// Totals across all chunks of a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteTally {
    pub imported: u64,
    pub duplicates: u64,
}

pub struct BatchWriter {
    chunk_size: usize,
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new(CHUNK_SIZE)
    }
}

impl BatchWriter {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Write all records, chunk by chunk, stopping at the first failure
    pub async fn write_all(
        &self,
        sink: &dyn VisitSink,
        records: &[ImportRecord],
    ) -> Result<WriteTally, ImportError> {
        let mut tally = WriteTally::default();
        let total_chunks = records.len().div_ceil(self.chunk_size);

        for (index, chunk) in records.chunks(self.chunk_size).enumerate() {
            let written = sink
                .insert_ignoring_duplicates(chunk)
                .await
                .map_err(|source| ImportError::Write {
                    chunk: index + 1,
                    committed_chunks: index,
                    source,
                })?;

            let size = chunk.len() as u64;
            let written = written.min(size);
            tally.imported += written;
            tally.duplicates += size - written;

            debug!(
                "Chunk {}/{}: {} written, {} duplicates",
                index + 1,
                total_chunks,
                written,
                size - written
            );
        }

        Ok(tally)
    }
}
