//! User record store
//!
//! This module owns the persisted user collection: the record model
//! and the flat-file storage it is loaded from and saved to.

pub mod models;
pub mod file;

pub use models::UserRecord;
pub use file::FileStore;
