use std::path::{Path, PathBuf};

use civic_crypto::{
    EnvKeyProvider, HexFileProvider, SecretKey, SecretKeyProvider, StaticKeyProvider,
};
use civic_types::CurvePoint;
use serde::{Deserialize, Serialize};

use crate::error::AuthorityError;

/// Environment variable read when no key source is configured.
pub const DEFAULT_KEY_VAR: &str = "CIVIC_AUTHORITY_KEY";

/// Where the authority's secret key comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum KeySource {
    /// Hex key in an environment variable, read on every signature.
    Env { var: String },
    /// Hex key in a file, read on every signature.
    File { path: PathBuf },
    /// Hex key inline. Intended for simulations only.
    Inline { key: String },
}

impl Default for KeySource {
    fn default() -> Self {
        Self::Env {
            var: DEFAULT_KEY_VAR.into(),
        }
    }
}

impl KeySource {
    pub fn provider(&self) -> Result<Box<dyn SecretKeyProvider>, AuthorityError> {
        Ok(match self {
            Self::Env { var } => Box::new(EnvKeyProvider::new(var.clone())),
            Self::File { path } => Box::new(HexFileProvider::new(path.clone())),
            Self::Inline { key } => {
                let key =
                    SecretKey::from_hex(key).map_err(|e| AuthorityError::Config(e.to_string()))?;
                Box::new(StaticKeyProvider::new(key))
            }
        })
    }
}

/// Issuance settings for an [`AuthorityService`](crate::AuthorityService).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    pub key: KeySource,
    /// Credentials are only issued with a liveliness strictly above this.
    pub floor: u8,
    /// When set, the service refuses to start with any other key.
    pub expected_pk: Option<CurvePoint>,
}

impl AuthorityConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, AuthorityError> {
        toml::from_str(s).map_err(|e| AuthorityError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AuthorityError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AuthorityError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }
}
