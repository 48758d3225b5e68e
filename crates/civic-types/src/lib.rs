//! Foundation types for Civic.
//!
//! Every value that crosses a crate boundary in Civic is a fixed-width byte
//! array wrapped in a newtype. Nothing here performs group arithmetic; the
//! types only carry encodings between the signer, the ledger, and callers.
//!
//! # Key Types
//!
//! - [`UserHash`] — 32-byte identity a credential is issued for
//! - [`Nonce`] — 32-byte deterministic per-message value embedded in a signature
//! - [`Identity`] — 32-byte proposer / author identity
//! - [`CurvePoint`] — affine `(x, y)` coordinates of a group element
//! - [`ScalarBytes`] — big-endian encoding of a group scalar

pub mod bytes;
pub mod error;
pub mod point;

pub use bytes::{Identity, Nonce, UserHash};
pub use error::TypeError;
pub use point::{CurvePoint, ScalarBytes};
