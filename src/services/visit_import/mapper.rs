//! Row mapping and validation
//!
//! Checks run in a fixed order and the first failure is the reported reason.

use super::lookup::LookupSnapshot;
use super::timestamp;
use super::tokenizer::RawRow;
use crate::types::{ImportRecord, PreviewRow, RowOutcome, SkipReason, VisitType};

/// Zero-based column positions in the PixSell diary/calls export
pub mod columns {
    pub const DATE: usize = 0;
    pub const START_TIME: usize = 1;
    pub const ACCOUNT: usize = 4;
    pub const COMMENTS: usize = 7;
    pub const REP_CODE: usize = 18;
    pub const CATEGORY: usize = 27;
}

/// Account ids synced from the Zoho CRM integration carry this prefix
pub const ZOHO_ACCOUNT_PREFIX: &str = "zcrm_";

/// Validate one row against the pass's lookup snapshot
pub fn map_row(row: &RawRow, lookups: &LookupSnapshot) -> RowOutcome {
    let account = row.cell(columns::ACCOUNT).trim();
    if !account.starts_with(ZOHO_ACCOUNT_PREFIX) {
        return RowOutcome::Skipped(SkipReason::NonZoho);
    }

    let Some(store) = lookups.stores.resolve(account) else {
        return RowOutcome::Skipped(SkipReason::NoStoreMatch);
    };

    let rep_code = row.cell(columns::REP_CODE).trim();
    if rep_code.is_empty() {
        return RowOutcome::Skipped(SkipReason::NoRepCode);
    }

    let Some(rep_id) = lookups.reps.resolve(rep_code) else {
        return RowOutcome::Skipped(SkipReason::NoRepMatch);
    };

    let date = row.cell(columns::DATE);
    let Some(visited_at) = timestamp::normalize(date, row.cell(columns::START_TIME)) else {
        return RowOutcome::Skipped(SkipReason::BadDate);
    };

    RowOutcome::Valid(ImportRecord {
        store_id: store.id,
        rep_id,
        visited_at,
        visit_type: VisitType::from_category(row.cell(columns::CATEGORY)),
        note: note_from(row.cell(columns::COMMENTS)),
    })
}

/// Render a valid row the way the operator sees it in the export
pub fn preview_row(row: &RawRow, lookups: &LookupSnapshot) -> PreviewRow {
    let account = row.cell(columns::ACCOUNT).trim();
    PreviewRow {
        date: row.cell(columns::DATE).to_string(),
        start: row.cell(columns::START_TIME).to_string(),
        account: account.to_string(),
        store_name: lookups
            .stores
            .resolve(account)
            .map(|s| s.name.clone())
            .unwrap_or_default(),
        rep_code: row.cell(columns::REP_CODE).to_string(),
        category: row.cell(columns::CATEGORY).to_string(),
        note: note_from(row.cell(columns::COMMENTS)),
    }
}

fn note_from(comments: &str) -> Option<String> {
    let note = comments.trim();
    (!note.is_empty()).then(|| note.to_string())
}
