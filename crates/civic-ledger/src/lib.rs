//! Credential-gated governance ledger for Civic.
//!
//! This crate holds everything a single proposal needs once credentials
//! start arriving:
//! - `CredentialVerifier`, the four-step gate every credential passes
//! - `ReplayGuard`, the nonce and identity consumption sets
//! - `GovernanceLedger`, the proposal state machine with votes, comments,
//!   posts, and authority-only execution
//! - A hash-linked `Journal` of receipts over the canonical state digest
//! - `LedgerReader` for side-effect-free queries

pub mod clock;
pub mod config;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod records;
pub mod replay;
pub mod traits;
pub mod verifier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GenesisConfig;
pub use error::{LedgerError, VerifyError};
pub use journal::{Journal, JournalReport, OperationKind, TxReceipt, Violation, ViolationKind};
pub use ledger::{GovernanceLedger, LedgerSnapshot, LedgerState, Transaction};
pub use records::{Comment, Credential, Post, Proposal, ProposalStatus, Vote};
pub use replay::{Redemption, ReplayGuard};
pub use traits::LedgerReader;
pub use verifier::CredentialVerifier;
