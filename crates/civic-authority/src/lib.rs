//! Credential issuance for Civic.
//!
//! The authority signs a user's 32-byte identity hash with its deterministic
//! signer and hands back a [`Credential`](civic_ledger::Credential) the user
//! can spend once on a governance ledger. Liveliness is attached here but is
//! not covered by the signature.

pub mod config;
pub mod error;
pub mod service;

pub use config::{AuthorityConfig, KeySource, DEFAULT_KEY_VAR};
pub use error::AuthorityError;
pub use service::AuthorityService;
