//! User database queries

use sqlx::PgPool;
use anyhow::Result;

use crate::types::user::ActiveRep;

/// Active users with a rep code assigned
pub async fn list_active_reps(pool: &PgPool) -> Result<Vec<ActiveRep>> {
    let reps = sqlx::query_as::<_, ActiveRep>(
        r#"
        SELECT id, rep_code
        FROM users
        WHERE active = TRUE
          AND rep_code IS NOT NULL
        ORDER BY id
        "#
    )
    .fetch_all(pool)
    .await?;

    Ok(reps)
}
