//! User types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An active sales rep with an assigned rep code
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ActiveRep {
    pub id: i32,
    pub rep_code: String,
}

/// Roles allowed to import visits
pub const IMPORT_ROLES: &[&str] = &["manager", "executive"];
