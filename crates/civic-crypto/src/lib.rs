//! Cryptographic primitives for Civic.
//!
//! Provides the curve boundary (secp256k1 group operations and a SHA-256
//! oracle with a fixed truncation width), a Schnorr-variant signer whose
//! nonces are derived deterministically from the key and the message, secret
//! key providers, and domain-separated BLAKE3 hashing for ledger digests.
//!
//! All primitives wrap established libraries. No custom field or group
//! arithmetic lives here.

pub mod curve;
pub mod hasher;
pub mod provider;
pub mod signer;

pub use curve::{CurveError, CurveOps, TRUNCATED_CHALLENGE_BYTES};
pub use hasher::{ContentHasher, HasherError};
pub use provider::{
    EnvKeyProvider, HexFileProvider, ProviderError, SecretKey, SecretKeyProvider,
    StaticKeyProvider,
};
pub use signer::{
    derive_public_key, sign_message, verify_signature, CryptoError, DeterministicSigner, KeyPair,
    Signature,
};
