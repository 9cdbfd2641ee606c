//! Blob backend construction.
//!
//! All four backends present one contract: `object_store::ObjectStore`.
//! This module only decides which adapter to build from the config and
//! probes that the bucket is reachable before anything else uses it.

use crate::{
    config::{StorageProvider, UploadsConfig},
    error::UploadsError,
};
use futures::StreamExt;
use object_store::{
    aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder, local::LocalFileSystem,
    memory::InMemory, ObjectStore,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the adapter the config names.
pub fn build_store(config: &UploadsConfig) -> Result<Arc<dyn ObjectStore>, UploadsError> {
    match config.provider {
        StorageProvider::Memory => Ok(Arc::new(InMemory::new())),

        StorageProvider::Filesystem => {
            let filesystem = config
                .filesystem
                .as_ref()
                .ok_or_else(|| UploadsError::InvalidConfig("missing filesystem config".into()))?;

            // Root directory must exist or be creatable.
            std::fs::create_dir_all(&filesystem.root_directory)?;
            let store = LocalFileSystem::new_with_prefix(&filesystem.root_directory)
                .map_err(|e| UploadsError::BackendInit(e.to_string()))?;
            Ok(Arc::new(store))
        }

        StorageProvider::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| UploadsError::InvalidConfig("missing s3 config".into()))?;
            if s3.use_legacy_list {
                warn!("Legacy list requested; ignoring, listing is always v2");
            }

            let store = AmazonS3Builder::from_env()
                .with_bucket_name(&s3.bucket_name)
                .build()
                .map_err(|e| UploadsError::BackendInit(e.to_string()))?;
            Ok(Arc::new(store))
        }

        StorageProvider::Gcs => {
            let gcs = config
                .gcs
                .as_ref()
                .ok_or_else(|| UploadsError::InvalidConfig("missing gcs config".into()))?;

            let mut builder =
                GoogleCloudStorageBuilder::from_env().with_bucket_name(&gcs.bucket_name);
            if let Some(path) = &gcs.service_account_file {
                builder = builder.with_service_account_path(path);
            }
            let store = builder
                .build()
                .map_err(|e| UploadsError::BackendInit(e.to_string()))?;
            Ok(Arc::new(store))
        }
    }
}

/// Whether the store answers a list request at all.
pub async fn is_accessible(store: &dyn ObjectStore) -> bool {
    match store.list(None).next().await {
        None | Some(Ok(_)) => true,
        Some(Err(e)) => {
            warn!(error = %e, "Bucket accessibility probe failed");
            false
        }
    }
}

/// Build the store and verify the bucket is reachable.
pub async fn build_accessible_store(
    config: &UploadsConfig,
) -> Result<Arc<dyn ObjectStore>, UploadsError> {
    let store = build_store(config)?;

    if !is_accessible(store.as_ref()).await {
        return Err(UploadsError::BucketUnavailable(config.bucket_name.clone()));
    }

    info!(provider = %config.provider, bucket = %config.bucket_name, "Blob backend ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_is_always_accessible() {
        let config = UploadsConfig::memory("bucket", "");
        let store = build_accessible_store(&config).await.unwrap();
        assert!(is_accessible(store.as_ref()).await);
    }

    #[tokio::test]
    async fn filesystem_backend_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/uploads");
        let config = UploadsConfig::filesystem("bucket", root.to_string_lossy());

        let store = build_accessible_store(&config).await.unwrap();
        assert!(root.is_dir());
        assert!(is_accessible(store.as_ref()).await);
    }

    #[tokio::test]
    async fn mismatched_sub_config_fails_init() {
        let mut config = UploadsConfig::memory("bucket", "");
        config.provider = StorageProvider::Filesystem;
        assert!(matches!(
            build_store(&config),
            Err(UploadsError::InvalidConfig(_))
        ));
    }
}
