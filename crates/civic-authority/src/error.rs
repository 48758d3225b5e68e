use civic_crypto::{CryptoError, ProviderError};

/// Errors produced while issuing credentials.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthorityError {
    #[error("signing key does not match the expected authority key")]
    NotAuthority,

    #[error("private key cannot be zero")]
    InvalidKey,

    #[error("liveliness {actual} does not exceed the issuance floor of {floor}")]
    InsufficientLiveliness { actual: u8, floor: u8 },

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<CryptoError> for AuthorityError {
    fn from(error: CryptoError) -> Self {
        match error {
            CryptoError::InvalidKey => Self::InvalidKey,
            other => Self::Crypto(other),
        }
    }
}

impl From<ProviderError> for AuthorityError {
    fn from(error: ProviderError) -> Self {
        Self::Crypto(CryptoError::Provider(error))
    }
}
