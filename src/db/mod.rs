//! Database module for the account server
//!
//! This module handles the SQLite connection pool, schema bootstrap,
//! and the account/profile data access layer.

pub mod models;
pub mod operations;

pub use models::{Account, NewAccount, Profile, ProfileChanges};
pub use operations::DbOperations;
