//! Authentication module for the account server
//!
//! This module handles signup, credential checks, bearer-token
//! extraction and access/refresh token issuance.

pub mod extractor;
pub mod handlers;
mod service;
mod tokens;

pub use extractor::AuthenticatedAccount;
pub use service::{AuthService, SignupInput, SignupOutcome};
pub use tokens::{Claims, TokenIssuer, TokenKind, TokenPair};
