//! Database queries

pub mod store;
pub mod user;
pub mod visit;
