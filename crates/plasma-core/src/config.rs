//! # Chain Configuration
//!
//! `ChainConfig` carries the operator-tunable parameters of a child chain.
//! It is loaded from YAML (usually a `chain.yaml` next to the operator's
//! other deployment files); every field has a default, so an empty
//! document is a valid config.
//!
//! ```yaml
//! header_version: 0
//! max_inputs: 16
//! max_outputs: 16
//! prune_spent_utxos: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PlasmaError};

/// Operator-tunable child-chain parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Version number stamped into every header the operator builds.
    #[serde(default)]
    pub header_version: u64,
    /// Maximum number of inputs a transaction may carry.
    #[serde(default = "default_max_inputs")]
    pub max_inputs: usize,
    /// Maximum number of outputs a transaction may carry.
    #[serde(default = "default_max_outputs")]
    pub max_outputs: usize,
    /// Whether the UTXO index drops outputs once an observed transaction
    /// consumes them. When false the index only ever grows.
    #[serde(default = "default_prune_spent_utxos")]
    pub prune_spent_utxos: bool,
}

fn default_max_inputs() -> usize {
    16
}

fn default_max_outputs() -> usize {
    16
}

fn default_prune_spent_utxos() -> bool {
    true
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            header_version: 0,
            max_inputs: default_max_inputs(),
            max_outputs: default_max_outputs(),
            prune_spent_utxos: default_prune_spent_utxos(),
        }
    }
}

impl ChainConfig {
    /// Parse and validate a config from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Reject configs no transaction could satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_inputs == 0 {
            return Err(ConfigError::Invalid("max_inputs must be at least 1".into()));
        }
        if self.max_outputs == 0 {
            return Err(ConfigError::Invalid("max_outputs must be at least 1".into()));
        }
        Ok(())
    }

    /// Check a transaction's input/output counts against the caps.
    ///
    /// # Errors
    ///
    /// Returns `PlasmaError::InvalidShape` when either count exceeds its cap.
    pub fn check_shape(&self, inputs: usize, outputs: usize) -> Result<(), PlasmaError> {
        if inputs > self.max_inputs {
            return Err(PlasmaError::InvalidShape(format!(
                "{inputs} inputs exceeds the limit of {}",
                self.max_inputs
            )));
        }
        if outputs > self.max_outputs {
            return Err(PlasmaError::InvalidShape(format!(
                "{outputs} outputs exceeds the limit of {}",
                self.max_outputs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ChainConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, ChainConfig::default());
        assert_eq!(config.max_inputs, 16);
        assert!(config.prune_spent_utxos);
    }

    #[test]
    fn test_partial_document() {
        let config = ChainConfig::from_yaml_str("header_version: 3\nmax_outputs: 2\n").unwrap();
        assert_eq!(config.header_version, 3);
        assert_eq!(config.max_outputs, 2);
        assert_eq!(config.max_inputs, 16);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let err = ChainConfig::from_yaml_str("max_inputs: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let err = ChainConfig::from_yaml_str("max_inputs: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prune_spent_utxos: false").unwrap();
        let config = ChainConfig::from_path(file.path()).unwrap();
        assert!(!config.prune_spent_utxos);
    }

    #[test]
    fn test_from_missing_path() {
        let err = ChainConfig::from_path("/nonexistent/chain.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_check_shape() {
        let config = ChainConfig {
            max_inputs: 2,
            max_outputs: 2,
            ..ChainConfig::default()
        };
        assert!(config.check_shape(2, 2).is_ok());
        assert!(matches!(
            config.check_shape(3, 1),
            Err(PlasmaError::InvalidShape(_))
        ));
        assert!(matches!(
            config.check_shape(1, 3),
            Err(PlasmaError::InvalidShape(_))
        ));
    }
}
