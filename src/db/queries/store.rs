//! Store database queries

use anyhow::Result;
use sqlx::PgPool;

use crate::types::ActiveStore;

/// Active stores that are linked to a CRM contact
pub async fn list_active_with_contact_id(pool: &PgPool) -> Result<Vec<ActiveStore>> {
    let stores = sqlx::query_as::<_, ActiveStore>(
        r#"
        SELECT id, name, zoho_contact_id
        FROM stores
        WHERE active = TRUE
          AND zoho_contact_id IS NOT NULL
        ORDER BY id
        "#
    )
    .fetch_all(pool)
    .await?;

    Ok(stores)
}
