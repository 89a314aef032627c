//! Business logic services

pub mod visit_import;
