//! Per-pass outcome counters

use super::writer::WriteTally;
use crate::types::{PreviewRow, PreviewSummary, RunSummary, SkipCounts, SkipReason};

/// Valid rows rendered in a preview
pub const PREVIEW_SAMPLE_LIMIT: usize = 20;

#[derive(Debug, Default)]
pub struct SummaryAggregator {
    total_rows: u32,
    valid_rows: u32,
    skips: SkipCounts,
    samples: Vec<PreviewRow>,
    sample_limit: usize,
}

impl SummaryAggregator {
    pub fn new(sample_limit: usize) -> Self {
        Self {
            sample_limit,
            ..Self::default()
        }
    }

    /// Count a valid row. `render` only runs while the sample has room.
    pub fn record_valid(&mut self, render: impl FnOnce() -> PreviewRow) {
        self.total_rows += 1;
        self.valid_rows += 1;
        if self.samples.len() < self.sample_limit {
            self.samples.push(render());
        }
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        self.total_rows += 1;
        self.skips.record(reason);
    }

    pub fn total_rows(&self) -> u32 {
        self.total_rows
    }

    pub fn valid_rows(&self) -> u32 {
        self.valid_rows
    }

    pub fn skips(&self) -> SkipCounts {
        self.skips
    }

    pub fn into_preview(self) -> PreviewSummary {
        PreviewSummary {
            total_rows: self.total_rows,
            valid_rows: self.valid_rows,
            non_zoho: self.skips.non_zoho,
            no_store: self.skips.no_store_match,
            no_rep: self.skips.no_rep(),
            no_rep_code: self.skips.no_rep_code,
            no_rep_match: self.skips.no_rep_match,
            bad_date: self.skips.bad_date,
            preview: self.samples,
        }
    }

    pub fn into_run(self, tally: WriteTally) -> RunSummary {
        RunSummary {
            ok: true,
            total_rows: self.total_rows,
            imported: tally.imported,
            duplicates: tally.duplicates,
            skipped_non_zoho: self.skips.non_zoho,
            skipped_no_store: self.skips.no_store_match,
            skipped_no_rep: self.skips.no_rep(),
            skipped_bad_date: self.skips.bad_date,
        }
    }
}
