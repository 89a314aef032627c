//! In-memory reference data and storage for pipeline tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use tokio::sync::Mutex;

use super::lookup::{LookupSnapshot, RepLookup, ReferenceSource, StoreLookup};
use super::mapper::columns;
use super::tokenizer::RawRow;
use super::writer::VisitSink;
use crate::types::{ActiveRep, ActiveStore, ImportRecord, VisitType};

pub fn store(id: i32, name: &str, contact_id: &str) -> ActiveStore {
    ActiveStore {
        id,
        name: name.to_string(),
        zoho_contact_id: contact_id.to_string(),
    }
}

pub fn rep(id: i32, code: &str) -> ActiveRep {
    ActiveRep {
        id,
        rep_code: code.to_string(),
    }
}

pub fn default_stores() -> Vec<ActiveStore> {
    vec![store(1, "Bondi", "zcrm_100"), store(2, "Manly", "zcrm_200")]
}

pub fn default_reps() -> Vec<ActiveRep> {
    vec![rep(7, "CW"), rep(8, "JD")]
}

/// Snapshot with stores zcrm_100 (1, Bondi) / zcrm_200 (2, Manly) and reps CW (7) / JD (8)
pub fn snapshot() -> LookupSnapshot {
    LookupSnapshot {
        stores: StoreLookup::from_stores(default_stores()),
        reps: RepLookup::from_reps(default_reps()),
    }
}

fn cells(
    date: &str,
    start: &str,
    account: &str,
    comments: &str,
    rep_code: &str,
    category: &str,
) -> Vec<String> {
    let mut cells = vec![String::new(); columns::CATEGORY + 1];
    cells[columns::DATE] = date.to_string();
    cells[columns::START_TIME] = start.to_string();
    cells[columns::ACCOUNT] = account.to_string();
    cells[columns::COMMENTS] = comments.to_string();
    cells[columns::REP_CODE] = rep_code.to_string();
    cells[columns::CATEGORY] = category.to_string();
    cells
}

pub fn data_row(
    date: &str,
    start: &str,
    account: &str,
    comments: &str,
    rep_code: &str,
    category: &str,
) -> RawRow {
    RawRow::new(6, cells(date, start, account, comments, rep_code, category))
}

/// One CSV line in export layout. Values must not contain commas or quotes.
pub fn export_line(
    date: &str,
    start: &str,
    account: &str,
    comments: &str,
    rep_code: &str,
    category: &str,
) -> String {
    cells(date, start, account, comments, rep_code, category).join(",")
}

/// Full export file: report header followed by `lines`
pub fn export_file(lines: &[String]) -> Vec<u8> {
    let mut out = String::from(
        "PixSell Diary/Calls Report\nGenerated,05/03/2024 17:00\nRange,01/03/2024 - 05/03/2024\n\nDate,Start,End,Duration,Account\n",
    );
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.into_bytes()
}

/// `n` distinct valid records, one minute apart
pub fn records(n: usize) -> Vec<ImportRecord> {
    let start: DateTime<FixedOffset> = FixedOffset::east_opt(10 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 5, 8, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| ImportRecord {
            store_id: 1,
            rep_id: 7,
            visited_at: start + Duration::minutes(i as i64),
            visit_type: VisitType::Visit,
            note: None,
        })
        .collect()
}

/// Fixed reference tables, optionally failing one read
pub struct StaticReferences {
    stores: Vec<ActiveStore>,
    reps: Vec<ActiveRep>,
    fail_stores: bool,
    fail_reps: bool,
    store_reads: AtomicUsize,
    rep_reads: AtomicUsize,
}

impl StaticReferences {
    pub fn new(stores: Vec<ActiveStore>, reps: Vec<ActiveRep>) -> Self {
        Self {
            stores,
            reps,
            fail_stores: false,
            fail_reps: false,
            store_reads: AtomicUsize::new(0),
            rep_reads: AtomicUsize::new(0),
        }
    }

    pub fn defaults() -> Self {
        Self::new(default_stores(), default_reps())
    }

    pub fn failing_stores(mut self) -> Self {
        self.fail_stores = true;
        self
    }

    pub fn failing_reps(mut self) -> Self {
        self.fail_reps = true;
        self
    }

    /// Times each table has been read, as (stores, reps)
    pub fn reads(&self) -> (usize, usize) {
        (
            self.store_reads.load(Ordering::SeqCst),
            self.rep_reads.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl ReferenceSource for StaticReferences {
    async fn active_stores(&self) -> Result<Vec<ActiveStore>> {
        self.store_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_stores {
            return Err(anyhow!("stores table unavailable"));
        }
        Ok(self.stores.clone())
    }

    async fn active_reps(&self) -> Result<Vec<ActiveRep>> {
        self.rep_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reps {
            return Err(anyhow!("users table unavailable"));
        }
        Ok(self.reps.clone())
    }
}

type NaturalKey = (i32, i32, DateTime<FixedOffset>);

/// Visit storage with a uniqueness constraint on the natural key.
///
/// Each call is all-or-nothing, like a single INSERT statement.
#[derive(Default)]
pub struct MemoryVisitSink {
    stored: Mutex<HashSet<NaturalKey>>,
    chunk_sizes: Mutex<Vec<usize>>,
    fail_on_chunk: Option<usize>,
}

impl MemoryVisitSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th call (1-based) without storing anything from it
    pub fn failing_on_chunk(mut self, n: usize) -> Self {
        self.fail_on_chunk = Some(n);
        self
    }

    pub async fn stored_count(&self) -> usize {
        self.stored.lock().await.len()
    }

    /// Sizes of every chunk attempted, in order
    pub async fn chunk_sizes(&self) -> Vec<usize> {
        self.chunk_sizes.lock().await.clone()
    }
}

#[async_trait]
impl VisitSink for MemoryVisitSink {
    async fn insert_ignoring_duplicates(&self, chunk: &[ImportRecord]) -> Result<u64> {
        let call = {
            let mut sizes = self.chunk_sizes.lock().await;
            sizes.push(chunk.len());
            sizes.len()
        };
        if self.fail_on_chunk == Some(call) {
            return Err(anyhow!("connection reset during chunk {}", call));
        }

        let mut stored = self.stored.lock().await;
        let written = chunk
            .iter()
            .filter(|record| stored.insert(record.natural_key()))
            .count();
        Ok(written as u64)
    }
}
