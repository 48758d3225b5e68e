use std::path::Path;

use civic_types::Identity;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Construction parameters fixed at ledger genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Identifier recorded on every vote.
    pub proposal_id: u64,
    pub description: String,
    pub proposer: Identity,
    /// Seconds since the UNIX epoch. Informational: the ledger does not
    /// enforce it.
    pub deadline_timestamp: u64,
    /// Credentials must carry a liveliness strictly above this value.
    pub min_liveliness: u8,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            proposal_id: 1,
            description: "untitled proposal".into(),
            proposer: Identity::from_bytes([0; 32]),
            deadline_timestamp: 0,
            min_liveliness: 0,
        }
    }
}

impl GenesisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.description.trim().is_empty() {
            return Err(LedgerError::Config(
                "proposal description must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let c = GenesisConfig::default();
        assert_eq!(c.proposal_id, 1);
        assert_eq!(c.min_liveliness, 0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_toml_with_partial_fields() {
        let c = GenesisConfig::from_toml_str(
            r#"
            description = "fund the library"
            min_liveliness = 50
            deadline_timestamp = 1700000000
            "#,
        )
        .unwrap();
        assert_eq!(c.description, "fund the library");
        assert_eq!(c.min_liveliness, 50);
        assert_eq!(c.deadline_timestamp, 1_700_000_000);
        assert_eq!(c.proposal_id, 1);
    }

    #[test]
    fn parses_hex_proposer() {
        let c = GenesisConfig::from_toml_str(&format!(
            "description = \"x\"\nproposer = \"{}\"\n",
            "ab".repeat(32)
        ))
        .unwrap();
        assert_eq!(c.proposer, Identity::from_bytes([0xab; 32]));
    }

    #[test]
    fn empty_description_is_rejected() {
        let err = GenesisConfig::from_toml_str("description = \"  \"").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn liveliness_out_of_range_is_rejected() {
        let err = GenesisConfig::from_toml_str("min_liveliness = 300").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "description = \"from disk\"\nproposal_id = 9").unwrap();
        let c = GenesisConfig::load(file.path()).unwrap();
        assert_eq!(c.proposal_id, 9);
        assert_eq!(c.description, "from disk");
    }

    #[test]
    fn load_missing_file_fails() {
        let err = GenesisConfig::load("/nonexistent/civic/genesis.toml").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
