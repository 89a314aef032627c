//! Types for the PixSell visit import pipeline

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Kind of visit recorded by a rep
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    Visit,
    Phone,
}

impl VisitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Phone => "phone",
        }
    }

    /// Map the export's category cell. Only "phone" (any case) is a call.
    pub fn from_category(category: &str) -> Self {
        if category.trim().eq_ignore_ascii_case("phone") {
            Self::Phone
        } else {
            Self::Visit
        }
    }
}

/// Why a row was left out of the import. Exactly one per skipped row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NonZoho,
    NoStoreMatch,
    NoRepCode,
    NoRepMatch,
    BadDate,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonZoho => "non_zoho",
            Self::NoStoreMatch => "no_store_match",
            Self::NoRepCode => "no_rep_code",
            Self::NoRepMatch => "no_rep_match",
            Self::BadDate => "bad_date",
        }
    }
}

/// A validated visit ready to be persisted.
///
/// `(store_id, rep_id, visited_at)` is the natural key used for dedup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub store_id: i32,
    pub rep_id: i32,
    pub visited_at: DateTime<FixedOffset>,
    pub visit_type: VisitType,
    pub note: Option<String>,
}

impl ImportRecord {
    pub fn natural_key(&self) -> (i32, i32, DateTime<FixedOffset>) {
        (self.store_id, self.rep_id, self.visited_at)
    }
}

/// Result of validating one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Valid(ImportRecord),
    Skipped(SkipReason),
}

/// Per-reason skip counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub non_zoho: u32,
    pub no_store_match: u32,
    pub no_rep_code: u32,
    pub no_rep_match: u32,
    pub bad_date: u32,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NonZoho => self.non_zoho += 1,
            SkipReason::NoStoreMatch => self.no_store_match += 1,
            SkipReason::NoRepCode => self.no_rep_code += 1,
            SkipReason::NoRepMatch => self.no_rep_match += 1,
            SkipReason::BadDate => self.bad_date += 1,
        }
    }

    /// Rep failures are reported together in the outward summaries
    pub fn no_rep(&self) -> u32 {
        self.no_rep_code + self.no_rep_match
    }

    pub fn total(&self) -> u32 {
        self.non_zoho + self.no_store_match + self.no_rep() + self.bad_date
    }
}

// =============================================================================
// SUMMARIES
// =============================================================================

/// One mapped row shown to the operator before committing an import
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewRow {
    pub date: String,
    pub start: String,
    pub account: String,
    pub store_name: String,
    pub rep_code: String,
    pub category: String,
    pub note: Option<String>,
}

/// Read-only pass result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSummary {
    pub total_rows: u32,
    pub valid_rows: u32,
    pub non_zoho: u32,
    pub no_store: u32,
    pub no_rep: u32,
    pub no_rep_code: u32,
    pub no_rep_match: u32,
    pub bad_date: u32,
    pub preview: Vec<PreviewRow>,
}

/// Persisting pass result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub ok: bool,
    pub total_rows: u32,
    pub imported: u64,
    pub duplicates: u64,
    pub skipped_non_zoho: u32,
    pub skipped_no_store: u32,
    pub skipped_no_rep: u32,
    pub skipped_bad_date: u32,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Upload carried over NATS. The file bytes travel base64-encoded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitImportRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    pub content_base64: String,
}
