use civic_crypto::CryptoError;

/// Reasons a credential is refused by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("liveliness {actual} does not exceed the minimum of {minimum}")]
    InsufficientLiveliness { actual: u8, minimum: u8 },

    #[error("credential public key does not match the authority key")]
    PublicKeyMismatch,

    #[error("invalid signature: {0}")]
    SignatureInvalid(String),

    #[error("nonce has already been used")]
    NonceReused,

    #[error("credential has already been used")]
    CredentialReused,
}

/// Errors produced by ledger operations.
///
/// Every variant is a hard rejection: the operation had no effect on state.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("credential rejected: {0}")]
    Verify(#[from] VerifyError),

    #[error("user has already voted")]
    AlreadyVoted,

    #[error("proposal has already been executed")]
    AlreadyExecuted,

    #[error("caller is not the authority")]
    NotAuthority,

    #[error("private key cannot be zero")]
    InvalidKey,

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },
}

impl From<CryptoError> for LedgerError {
    fn from(error: CryptoError) -> Self {
        match error {
            CryptoError::InvalidKey => Self::InvalidKey,
            other => Self::Crypto(other),
        }
    }
}

impl From<civic_crypto::HasherError> for LedgerError {
    fn from(error: civic_crypto::HasherError) -> Self {
        Self::Serialization(error.to_string())
    }
}
