//! Store reference types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An active store reachable through its external CRM contact id
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ActiveStore {
    pub id: i32,
    pub name: String,
    pub zoho_contact_id: String,
}
