//! Generator configuration, read from a JSON file checked into the repo.

use crate::error::GeneratorError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Directories whose `.rs` files are introspected for schema types.
    pub source_directories: Vec<PathBuf>,
    /// Where the YAML document lands; truncated on every run.
    pub output_file: PathBuf,
    pub server_url: String,
    pub title: String,
    pub version: String,
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GeneratorError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            GeneratorError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;

        if config.source_directories.is_empty() {
            return Err(GeneratorError::Config(
                "at least one source directory is required".to_string(),
            ));
        }
        Ok(config)
    }
}
