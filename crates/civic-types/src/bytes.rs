use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TypeError;

/// Decode a 64-character hex string into a 32-byte array.
///
/// An optional `0x` prefix is accepted.
pub fn decode_32(s: &str) -> Result<[u8; 32], TypeError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Serde adapter that writes `[u8; 32]` as a lower-case hex string.
pub mod hex32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::decode_32(&s).map_err(serde::de::Error::custom)
    }
}

macro_rules! bytes32_newtype {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "hex32")] [u8; 32]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// The raw 32 bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// `true` when every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Full hex-encoded string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Short identifier (first 8 hex characters) for logs.
            pub fn short_id(&self) -> String {
                format!("{}:{}", $tag, hex::encode(&self.0[..4]))
            }

            /// Parse from 64 hex characters.
            pub fn from_hex(s: &str) -> Result<Self, TypeError> {
                decode_32(s).map(Self)
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.short_id())
            }
        }
    };
}

bytes32_newtype!(
    /// Identity a credential is issued for. Recorded in the used-credential
    /// set and the voter registry once redeemed.
    UserHash,
    "user"
);

bytes32_newtype!(
    /// Deterministic per-message value carried inside a signature.
    ///
    /// Not secret: it is `H(secret || message)` and is published with the
    /// signature so the ledger can reject replays.
    Nonce,
    "nonce"
);

bytes32_newtype!(
    /// Proposer or bulletin-board author identity.
    Identity,
    "id"
);

impl UserHash {
    /// Derive a user hash from a human-readable label.
    ///
    /// The label is zero-padded (or truncated) to 32 bytes and hashed with
    /// SHA-256.
    pub fn from_label(label: &str) -> Self {
        Self(Sha256::digest(pad32(label.as_bytes())).into())
    }
}

impl Identity {
    /// Identity whose bytes are `label` zero-padded to 32 bytes.
    pub fn from_label(label: &str) -> Self {
        Self(pad32(label.as_bytes()))
    }
}

fn pad32(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let len = data.len().min(32);
    out[..len].copy_from_slice(&data[..len]);
    out
}
