//! Visit database queries

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::types::ImportRecord;

/// Tag stored on every visit that came in through the PixSell export
pub const PIXSELL_SOURCE: &str = "pixsell";

/// Insert imported visits in one statement, skipping any whose
/// (store_id, rep_id, visited_at) already exists.
///
/// Returns the number of rows actually inserted.
pub async fn insert_imported_visits(pool: &PgPool, records: &[ImportRecord]) -> Result<u64> {
    if records.is_empty() {
        return Ok(0);
    }

    let store_ids: Vec<i32> = records.iter().map(|r| r.store_id).collect();
    let rep_ids: Vec<i32> = records.iter().map(|r| r.rep_id).collect();
    let visited_at: Vec<DateTime<Utc>> = records
        .iter()
        .map(|r| r.visited_at.with_timezone(&Utc))
        .collect();
    let visit_types: Vec<&str> = records.iter().map(|r| r.visit_type.as_str()).collect();
    let notes: Vec<Option<String>> = records.iter().map(|r| r.note.clone()).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO visits (store_id, rep_id, visited_at, visit_type, note, source)
        SELECT store_id, rep_id, visited_at, visit_type, note, $6
        FROM UNNEST($1::int4[], $2::int4[], $3::timestamptz[], $4::text[], $5::text[])
            AS input(store_id, rep_id, visited_at, visit_type, note)
        ON CONFLICT (store_id, rep_id, visited_at) DO NOTHING
        "#,
    )
    .bind(&store_ids)
    .bind(&rep_ids)
    .bind(&visited_at)
    .bind(&visit_types)
    .bind(&notes)
    .bind(PIXSELL_SOURCE)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
