use std::path::PathBuf;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Raw 32-byte secret key material.
///
/// Wiped on drop. Whether the bytes form a usable (non-zero) key is decided
/// by the signer, not here.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex characters (optionally `0x`-prefixed, surrounding
    /// whitespace ignored).
    pub fn from_hex(s: &str) -> Result<Self, ProviderError> {
        civic_types::bytes::decode_32(s.trim())
            .map(Self)
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

/// Supplies the local party's secret key on demand.
///
/// Implementations return exactly 32 bytes per call. Callers use the key for
/// a single operation and drop it; nothing downstream caches it.
pub trait SecretKeyProvider: Send + Sync {
    fn secret_key(&self) -> Result<SecretKey, ProviderError>;
}

impl<P: SecretKeyProvider + ?Sized> SecretKeyProvider for &P {
    fn secret_key(&self) -> Result<SecretKey, ProviderError> {
        (**self).secret_key()
    }
}

impl<P: SecretKeyProvider + ?Sized> SecretKeyProvider for Box<P> {
    fn secret_key(&self) -> Result<SecretKey, ProviderError> {
        (**self).secret_key()
    }
}

/// Provider holding a key in memory. Used by tests, simulations, and
/// embedders that already manage the key themselves.
#[derive(Clone, Debug)]
pub struct StaticKeyProvider {
    key: SecretKey,
}

impl StaticKeyProvider {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self::new(SecretKey::from_bytes(bytes))
    }
}

impl SecretKeyProvider for StaticKeyProvider {
    fn secret_key(&self) -> Result<SecretKey, ProviderError> {
        Ok(self.key.clone())
    }
}

/// Provider reading a hex-encoded key from an environment variable on every
/// call.
#[derive(Clone, Debug)]
pub struct EnvKeyProvider {
    var: String,
}

impl EnvKeyProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl SecretKeyProvider for EnvKeyProvider {
    fn secret_key(&self) -> Result<SecretKey, ProviderError> {
        let value =
            std::env::var(&self.var).map_err(|_| ProviderError::Missing(self.var.clone()))?;
        SecretKey::from_hex(&value)
    }
}

/// Provider reading a hex-encoded key from a file on every call.
#[derive(Clone, Debug)]
pub struct HexFileProvider {
    path: PathBuf,
}

impl HexFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SecretKeyProvider for HexFileProvider {
    fn secret_key(&self) -> Result<SecretKey, ProviderError> {
        let contents = zeroize::Zeroizing::new(
            std::fs::read_to_string(&self.path)
                .map_err(|e| ProviderError::Io(format!("{}: {e}", self.path.display())))?,
        );
        SecretKey::from_hex(&contents)
    }
}

/// Errors from secret key providers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("secret key not available: {0}")]
    Missing(String),
    #[error("malformed secret key: {0}")]
    Malformed(String),
    #[error("failed to read secret key: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn static_provider_returns_same_key() {
        let provider = StaticKeyProvider::from_bytes([0x11; 32]);
        assert_eq!(provider.secret_key().unwrap().as_bytes(), &[0x11; 32]);
        assert_eq!(provider.secret_key().unwrap().as_bytes(), &[0x11; 32]);
    }

    #[test]
    fn hex_parsing_accepts_prefix_and_whitespace() {
        let key = SecretKey::from_hex(&format!("  0x{}\n", "22".repeat(32))).unwrap();
        assert_eq!(key.as_bytes(), &[0x22; 32]);
    }

    #[test]
    fn hex_parsing_rejects_short_input() {
        assert!(matches!(
            SecretKey::from_hex("abcd"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn env_provider_reports_missing_variable() {
        let provider = EnvKeyProvider::new("CIVIC_TEST_KEY_THAT_IS_NEVER_SET");
        assert_eq!(
            provider.secret_key().unwrap_err(),
            ProviderError::Missing("CIVIC_TEST_KEY_THAT_IS_NEVER_SET".into())
        );
    }

    #[test]
    fn file_provider_reads_hex() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", "33".repeat(32)).unwrap();
        let provider = HexFileProvider::new(file.path());
        assert_eq!(provider.secret_key().unwrap().as_bytes(), &[0x33; 32]);
    }

    #[test]
    fn file_provider_reports_io_error() {
        let provider = HexFileProvider::new("/nonexistent/civic/key.hex");
        assert!(matches!(provider.secret_key(), Err(ProviderError::Io(_))));
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", SecretKey::from_bytes([9; 32]));
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("09"));
    }

    #[test]
    fn boxed_provider_delegates() {
        let boxed: Box<dyn SecretKeyProvider> = Box::new(StaticKeyProvider::from_bytes([4; 32]));
        assert_eq!(boxed.secret_key().unwrap().as_bytes(), &[4; 32]);
    }
}
