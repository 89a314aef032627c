//! PixSell visit import pipeline
//!
//! One pass = tokenize the upload, load the lookup snapshot, validate every
//! row in file order, and (run mode only) write the valid records in chunks.
//! Preview and run share the validation step, so their counts always agree.
//!
//! Passes are independent. Dedup across concurrent passes relies on the
//! unique (store_id, rep_id, visited_at) constraint in storage.

pub mod lookup;
pub mod mapper;
pub mod summary;
pub mod timestamp;
pub mod tokenizer;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Instant;

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::ImportError;
use crate::types::{ImportRecord, PreviewSummary, RowOutcome, RunSummary};

use lookup::{load_lookups, LookupSnapshot, PgReferenceSource, ReferenceSource};
use mapper::{map_row, preview_row};
use summary::{SummaryAggregator, PREVIEW_SAMPLE_LIMIT};
use tokenizer::{tokenize, RawRow};
use writer::{BatchWriter, PgVisitSink, VisitSink};

/// Default cap on the uploaded file size
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Runs preview and import passes over uploaded exports
pub struct VisitImporter {
    references: Arc<dyn ReferenceSource>,
    sink: Arc<dyn VisitSink>,
    writer: BatchWriter,
    max_upload_bytes: usize,
}

impl VisitImporter {
    pub fn new(
        references: Arc<dyn ReferenceSource>,
        sink: Arc<dyn VisitSink>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            references,
            sink,
            writer: BatchWriter::default(),
            max_upload_bytes,
        }
    }

    /// Importer backed by the Postgres store/user/visit tables
    pub fn postgres(pool: PgPool, max_upload_bytes: usize) -> Self {
        Self::new(
            Arc::new(PgReferenceSource::new(pool.clone())),
            Arc::new(PgVisitSink::new(pool)),
            max_upload_bytes,
        )
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    #[cfg(test)]
    fn with_writer(mut self, writer: BatchWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Validate an upload and report what an import would do. Writes nothing.
    pub async fn preview(&self, bytes: &[u8]) -> Result<PreviewSummary, ImportError> {
        let start = Instant::now();
        let pass = self.validate(bytes, PREVIEW_SAMPLE_LIMIT).await?;
        let summary = pass.summary.into_preview();

        info!(
            "Preview pass: {} rows, {} valid, {} skipped in {}ms",
            summary.total_rows,
            summary.valid_rows,
            summary.total_rows - summary.valid_rows,
            start.elapsed().as_millis()
        );
        Ok(summary)
    }

    /// Validate an upload and persist its valid rows.
    ///
    /// A failed chunk aborts the pass; chunks written before it stay.
    pub async fn run(&self, bytes: &[u8]) -> Result<RunSummary, ImportError> {
        let start = Instant::now();
        let pass = self.validate(bytes, 0).await?;

        let tally = self.writer.write_all(self.sink.as_ref(), &pass.records).await?;
        let summary = pass.summary.into_run(tally);

        info!(
            "Import pass: {} rows, {} imported, {} duplicates in {}ms",
            summary.total_rows,
            summary.imported,
            summary.duplicates,
            start.elapsed().as_millis()
        );
        Ok(summary)
    }

    async fn validate(
        &self,
        bytes: &[u8],
        sample_limit: usize,
    ) -> Result<ValidatedPass, ImportError> {
        if bytes.len() > self.max_upload_bytes {
            return Err(ImportError::UploadTooLarge {
                size: bytes.len(),
                limit: self.max_upload_bytes,
            });
        }

        let rows = tokenize(bytes)?.collect::<Result<Vec<_>, _>>()?;
        debug!("Tokenized {} data rows", rows.len());

        let lookups = load_lookups(self.references.as_ref()).await?;
        Ok(validate_rows(&rows, &lookups, sample_limit))
    }
}

/// Valid records plus counters for one pass
struct ValidatedPass {
    records: Vec<ImportRecord>,
    summary: SummaryAggregator,
}

fn validate_rows(rows: &[RawRow], lookups: &LookupSnapshot, sample_limit: usize) -> ValidatedPass {
    let mut summary = SummaryAggregator::new(sample_limit);
    let mut records = Vec::new();

    for row in rows {
        match map_row(row, lookups) {
            RowOutcome::Valid(record) => {
                summary.record_valid(|| preview_row(row, lookups));
                records.push(record);
            }
            RowOutcome::Skipped(reason) => {
                debug!("Line {} skipped: {}", row.line, reason.as_str());
                summary.record_skip(reason);
            }
        }
    }

    debug!(
        "Validated {} rows: {} valid, {} skipped",
        summary.total_rows(),
        summary.valid_rows(),
        summary.skips().total()
    );
    ValidatedPass { records, summary }
}
