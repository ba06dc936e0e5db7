//! Profile module for the account server
//!
//! One profile per account, created lazily on first access.

pub mod handlers;

pub use handlers::{parse_profile_changes, ProfileView};
