//! Reference lookups resolved once per import pass
//!
//! A pass reads the active stores and reps up front and validates every row
//! against that snapshot. Nothing is cached between passes.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::queries;
use crate::error::ImportError;
use crate::types::{ActiveRep, ActiveStore};

/// Source of the reference tables a pass validates against
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Active stores that carry an external contact id
    async fn active_stores(&self) -> Result<Vec<ActiveStore>>;

    /// Active users that have a rep code assigned
    async fn active_reps(&self) -> Result<Vec<ActiveRep>>;
}

/// Reads reference tables straight from Postgres
pub struct PgReferenceSource {
    pool: PgPool,
}

impl PgReferenceSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceSource for PgReferenceSource {
    async fn active_stores(&self) -> Result<Vec<ActiveStore>> {
        queries::store::list_active_with_contact_id(&self.pool).await
    }

    async fn active_reps(&self) -> Result<Vec<ActiveRep>> {
        queries::user::list_active_reps(&self.pool).await
    }
}

/// Store resolved from an external contact id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRef {
    pub id: i32,
    pub name: String,
}

/// External contact id -> store
#[derive(Debug, Clone, Default)]
pub struct StoreLookup {
    by_contact_id: HashMap<String, StoreRef>,
}

impl StoreLookup {
    pub fn from_stores(stores: impl IntoIterator<Item = ActiveStore>) -> Self {
        let mut by_contact_id: HashMap<String, StoreRef> = HashMap::new();
        for store in stores {
            let key = store.zoho_contact_id.trim().to_string();
            if key.is_empty() {
                continue;
            }
            if let Some(existing) = by_contact_id.get(&key) {
                warn!(
                    "Contact id {} is shared by stores {} and {}; keeping {}",
                    key, existing.id, store.id, existing.id
                );
                continue;
            }
            by_contact_id.insert(key, StoreRef { id: store.id, name: store.name });
        }
        Self { by_contact_id }
    }

    pub fn resolve(&self, contact_id: &str) -> Option<&StoreRef> {
        self.by_contact_id.get(contact_id.trim())
    }

    pub fn len(&self) -> usize {
        self.by_contact_id.len()
    }
}

/// Upper-cased rep code -> user id
#[derive(Debug, Clone, Default)]
pub struct RepLookup {
    by_code: HashMap<String, i32>,
}

impl RepLookup {
    pub fn from_reps(reps: impl IntoIterator<Item = ActiveRep>) -> Self {
        let mut by_code = HashMap::new();
        for rep in reps {
            let code = rep.rep_code.trim().to_uppercase();
            if code.is_empty() {
                continue;
            }
            by_code.entry(code).or_insert(rep.id);
        }
        Self { by_code }
    }

    /// Match is case-insensitive: both sides are upper-cased
    pub fn resolve(&self, rep_code: &str) -> Option<i32> {
        self.by_code.get(&rep_code.trim().to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }
}

/// Immutable view of the reference data for one pass
#[derive(Debug, Clone, Default)]
pub struct LookupSnapshot {
    pub stores: StoreLookup,
    pub reps: RepLookup,
}

/// Read both reference tables. Either failing aborts the pass.
pub async fn load_lookups(source: &dyn ReferenceSource) -> Result<LookupSnapshot, ImportError> {
    let (stores, reps) = tokio::join!(source.active_stores(), source.active_reps());

    let stores = stores.map_err(|source| ImportError::LookupLoad { table: "stores", source })?;
    let reps = reps.map_err(|source| ImportError::LookupLoad { table: "users", source })?;

    let snapshot = LookupSnapshot {
        stores: StoreLookup::from_stores(stores),
        reps: RepLookup::from_reps(reps),
    };
    info!(
        "Loaded lookups: {} stores, {} reps",
        snapshot.stores.len(),
        snapshot.reps.len()
    );

    Ok(snapshot)
}
