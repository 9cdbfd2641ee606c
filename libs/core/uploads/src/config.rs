//! Upload storage configuration.

use core_config::{env_or_default, ConfigError, FromEnv};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which blob backend the upload manager talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StorageProvider {
    Filesystem,
    Memory,
    S3,
    Gcs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesystemConfig {
    pub root_directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    pub bucket_name: String,
    /// Accepted for compatibility; listing is always v2.
    #[serde(default)]
    pub use_legacy_list: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsConfig {
    pub bucket_name: String,
    /// Explicit service-account file; ambient credentials when absent.
    #[serde(default)]
    pub service_account_file: Option<String>,
}

/// Full upload-manager configuration.
///
/// Exactly one of the backend sub-configs must be present, and it must
/// match `provider` (`memory` takes no sub-config).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadsConfig {
    pub provider: StorageProvider,
    pub bucket_name: String,
    /// Prepended to every object key, invisible to callers.
    #[serde(default)]
    pub bucket_prefix: String,
    /// Path-parameter name the serving route reads the filename from.
    #[serde(default = "default_filename_key")]
    pub upload_filename_key: String,
    #[serde(default)]
    pub filesystem: Option<FilesystemConfig>,
    #[serde(default)]
    pub s3: Option<S3Config>,
    #[serde(default)]
    pub gcs: Option<GcsConfig>,
}

fn default_filename_key() -> String {
    "filename".to_string()
}

impl UploadsConfig {
    /// Minimal in-process config, used in tests and local development.
    pub fn memory(bucket_name: impl Into<String>, bucket_prefix: impl Into<String>) -> Self {
        Self {
            provider: StorageProvider::Memory,
            bucket_name: bucket_name.into(),
            bucket_prefix: bucket_prefix.into(),
            upload_filename_key: default_filename_key(),
            filesystem: None,
            s3: None,
            gcs: None,
        }
    }

    pub fn filesystem(
        bucket_name: impl Into<String>,
        root_directory: impl Into<String>,
    ) -> Self {
        Self {
            provider: StorageProvider::Filesystem,
            bucket_name: bucket_name.into(),
            bucket_prefix: String::new(),
            upload_filename_key: default_filename_key(),
            filesystem: Some(FilesystemConfig {
                root_directory: root_directory.into(),
            }),
            s3: None,
            gcs: None,
        }
    }

    /// Check the provider / sub-config pairing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_name.is_empty() {
            return Err(ConfigError::Invalid("bucket name is required".to_string()));
        }

        let present = [
            self.filesystem.is_some(),
            self.s3.is_some(),
            self.gcs.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count();

        let expected = match self.provider {
            StorageProvider::Memory => 0,
            _ => 1,
        };
        if present != expected {
            return Err(ConfigError::Invalid(format!(
                "expected {expected} backend sub-config(s) for provider '{}', found {present}",
                self.provider
            )));
        }

        let matched = match self.provider {
            StorageProvider::Filesystem => self.filesystem.is_some(),
            StorageProvider::Memory => true,
            StorageProvider::S3 => self.s3.is_some(),
            StorageProvider::Gcs => self.gcs.is_some(),
        };
        if !matched {
            return Err(ConfigError::Invalid(format!(
                "backend sub-config does not match provider '{}'",
                self.provider
            )));
        }

        Ok(())
    }
}

impl FromEnv for UploadsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let provider_raw = env_or_default("UPLOADS_PROVIDER", "memory");
        let provider: StorageProvider =
            provider_raw
                .parse()
                .map_err(|_| ConfigError::ParseError {
                    key: "UPLOADS_PROVIDER".to_string(),
                    details: format!("unknown provider '{provider_raw}'"),
                })?;

        let bucket_name = env_or_default("UPLOADS_BUCKET_NAME", "uploads");

        let config = Self {
            provider,
            bucket_name: bucket_name.clone(),
            bucket_prefix: env_or_default("UPLOADS_BUCKET_PREFIX", ""),
            upload_filename_key: env_or_default("UPLOADS_FILENAME_KEY", "filename"),
            filesystem: match provider {
                StorageProvider::Filesystem => Some(FilesystemConfig {
                    root_directory: env_or_default("UPLOADS_ROOT_DIRECTORY", "./uploads"),
                }),
                _ => None,
            },
            s3: match provider {
                StorageProvider::S3 => Some(S3Config {
                    bucket_name: bucket_name.clone(),
                    use_legacy_list: env_or_default("UPLOADS_S3_USE_LEGACY_LIST", "false")
                        .parse()
                        .unwrap_or(false),
                }),
                _ => None,
            },
            gcs: match provider {
                StorageProvider::Gcs => Some(GcsConfig {
                    bucket_name,
                    service_account_file: std::env::var("UPLOADS_GCS_SERVICE_ACCOUNT_FILE").ok(),
                }),
                _ => None,
            },
        };

        config.validate()?;
        Ok(config)
    }
}
