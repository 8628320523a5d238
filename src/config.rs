//! Pipeline configuration management.
//!
//! Unified configuration for the loading and inference side of the
//! pipeline, with serialization support for experiment reproducibility.
//!
//! # Features
//!
//! - **Unified configuration**: one struct for the batching/inference stage
//! - **Serialization**: save/load to TOML or JSON
//! - **Validation**: catch invalid settings before a run starts
//! - **Reproducibility**: version-control-friendly configuration files
//!
//! # Example
//!
//! ```ignore
//! use cropped_decoding::config::DecodingConfig;
//!
//! let config = DecodingConfig::default();
//! config.save_toml("experiment_config.toml")?;
//!
//! let loaded = DecodingConfig::load_toml("experiment_config.toml")?;
//! loaded.validate()?;
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DecodingError, Result};

// ============================================================================
// LoaderConfig
// ============================================================================

/// Batch loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Windows per batch (the last batch of a pass may be short).
    pub batch_size: usize,

    /// Whether to shuffle window order between passes. Must stay off for
    /// cropped inference.
    pub shuffle: bool,

    /// RNG seed for shuffled order; `None` draws from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Whether emitted batches drop the provenance element (training) or
    /// retain it (inference).
    pub drop_provenance: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            shuffle: false,
            seed: None,
            drop_provenance: true,
        }
    }
}

impl LoaderConfig {
    /// Validate settings before use.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DecodingError::InvalidConfig(
                "loader.batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// ExperimentMetadata
// ============================================================================

/// Optional experiment bookkeeping carried alongside a configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentMetadata {
    /// Experiment name
    pub name: String,

    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    /// Version or git commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Custom tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

// ============================================================================
// DecodingConfig
// ============================================================================

/// Complete configuration of the loading/inference stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodingConfig {
    /// Batch loading configuration
    pub loader: LoaderConfig,

    /// Name of the metadata field holding recording-level targets, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<String>,

    /// Experiment metadata (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExperimentMetadata>,
}

impl DecodingConfig {
    /// Validate the complete configuration.
    pub fn validate(&self) -> Result<()> {
        self.loader.validate()?;
        if let Some(field) = &self.target_field {
            if field.is_empty() {
                return Err(DecodingError::InvalidConfig(
                    "target_field must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Save to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save to a JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(DecodingConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_batch_size_fails_validation() {
        let mut config = DecodingConfig::default();
        config.loader.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_target_field_fails_validation() {
        let mut config = DecodingConfig::default();
        config.target_field = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip_preserves_settings() {
        let mut config = DecodingConfig::default();
        config.loader.batch_size = 32;
        config.loader.shuffle = true;
        config.loader.seed = Some(7);
        config.target_field = Some("pathological".to_string());
        config.metadata = Some(ExperimentMetadata {
            name: "tuh-abnormal-baseline".to_string(),
            description: Some("cropped decoding baseline".to_string()),
            created_at: None,
            version: None,
            tags: Some(vec!["cropped".to_string()]),
        });

        let text = toml::to_string_pretty(&config).unwrap();
        let loaded: DecodingConfig = toml::from_str(&text).unwrap();
        assert_eq!(loaded.loader.batch_size, 32);
        assert!(loaded.loader.shuffle);
        assert_eq!(loaded.loader.seed, Some(7));
        assert_eq!(loaded.target_field.as_deref(), Some("pathological"));
        assert_eq!(loaded.metadata.unwrap().name, "tuh-abnormal-baseline");
    }
}
