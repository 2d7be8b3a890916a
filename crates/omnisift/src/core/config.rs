//! Pipeline configuration.
//!
//! Loaded from TOML or JSON, or built programmatically. Every field has a
//! default, so an empty file is a valid configuration.

use crate::types::ProcessorOptions;
use crate::{OmnisiftError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File name searched for by [`PipelineConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "omnisift.toml";

/// Configuration for the registry lifecycle and the metadata orchestrator.
///
/// # Example
///
/// ```rust
/// use omnisift::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert!(config.fallback_to_generic);
/// assert_eq!(config.lifecycle_timeout().as_secs(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for each processor's `initialize` / `cleanup`, in milliseconds.
    #[serde(default = "default_lifecycle_timeout_ms")]
    pub lifecycle_timeout_ms: u64,

    /// Maximum concurrent extractions in batch operations (None = num_cpus * 2).
    #[serde(default)]
    pub max_concurrent_extractions: Option<usize>,

    /// Options handed to processors by the orchestrator.
    #[serde(default)]
    pub processor_options: ProcessorOptions,

    /// Replace a failed processor result with generic text extraction.
    #[serde(default = "default_true")]
    pub fallback_to_generic: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lifecycle_timeout_ms: default_lifecycle_timeout_ms(),
            max_concurrent_extractions: None,
            processor_options: ProcessorOptions::default(),
            fallback_to_generic: true,
        }
    }
}

fn default_lifecycle_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

impl PipelineConfig {
    pub fn lifecycle_timeout(&self) -> Duration {
        Duration::from_millis(self.lifecycle_timeout_ms)
    }

    pub fn max_concurrent_extractions(&self) -> usize {
        self.max_concurrent_extractions
            .unwrap_or_else(|| num_cpus::get() * 2)
            .max(1)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `OmnisiftError::Validation` if the file cannot be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| OmnisiftError::validation(format!("Failed to read config file {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| OmnisiftError::validation(format!("Invalid TOML in {}: {}", path.display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| OmnisiftError::validation(format!("Failed to read config file {}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| OmnisiftError::validation(format!("Invalid JSON in {}: {}", path.display(), e)))
    }

    /// Load configuration, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(OmnisiftError::validation(format!(
                "Unsupported config file format: {} (expected .toml or .json)",
                path.display()
            ))),
        }
    }

    /// Search the current directory and its ancestors for `omnisift.toml`.
    ///
    /// Returns `Ok(None)` when no file is found.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(OmnisiftError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}
