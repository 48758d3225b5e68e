/// Domain-separated BLAKE3 hasher for ledger commitments.
///
/// Each hasher carries a domain tag that is prepended to every computation,
/// so a state digest and a receipt hash over identical bytes never collide.
/// This is independent of the SHA-256 oracle used inside signatures.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for canonical ledger state.
    pub const STATE: Self = Self {
        domain: "civic-state-v1",
    };
    /// Hasher for transaction receipts.
    pub const RECEIPT: Self = Self {
        domain: "civic-receipt-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Hash a serializable value as JSON with domain separation.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<[u8; 32], HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            ContentHasher::STATE.hash(b"ledger"),
            ContentHasher::STATE.hash(b"ledger")
        );
    }

    #[test]
    fn domains_separate_outputs() {
        assert_ne!(
            ContentHasher::STATE.hash(b"same"),
            ContentHasher::RECEIPT.hash(b"same")
        );
        assert_ne!(
            ContentHasher::STATE.hash(b"same"),
            ContentHasher::STATE.hash(b"other")
        );
    }

    #[test]
    fn hash_json_matches_manual_encoding() {
        let value = serde_json::json!({"sequence": 3});
        let expected = ContentHasher::RECEIPT.hash(&serde_json::to_vec(&value).unwrap());
        assert_eq!(ContentHasher::RECEIPT.hash_json(&value).unwrap(), expected);
    }
}
