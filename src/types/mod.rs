//! Type definitions

pub mod messages;
pub mod store;
pub mod user;
pub mod visit_import;

pub use messages::*;
pub use store::*;
pub use user::*;
pub use visit_import::*;
