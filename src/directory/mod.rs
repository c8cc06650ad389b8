//! User directory module
//!
//! This module implements the create/list/update/delete operations over
//! the record store, and the HTTP handlers exposing them.

mod service;
pub mod handlers;

pub use service::{DirectoryService, UserUpdate};
