//! The upload manager: one facade over whichever blob backend is configured.
//!
//! Keys are prefixed with the configured `bucket_prefix` on the way in, so
//! callers never see it; the raw store handle stays reachable for callers
//! that need the unprefixed view.

use crate::{backends, config::UploadsConfig, error::UploadsError};
use object_store::{
    path::Path as ObjectPath, Attribute, AttributeValue, Attributes, ObjectStore, PutOptions,
    PutPayload,
};
use std::sync::Arc;
use tracing::info;

/// Content metadata for a stored blob.
#[derive(Debug, Clone)]
pub struct BlobAttributes {
    pub content_type: Option<String>,
    pub size: u64,
}

pub struct UploadManager {
    store: Arc<dyn ObjectStore>,
    bucket_prefix: String,
    upload_filename_key: String,
}

impl UploadManager {
    /// Build the backend, verify the bucket is reachable, and return the
    /// manager. Any failure here is fatal to process init.
    pub async fn new(config: Option<UploadsConfig>) -> Result<Self, UploadsError> {
        let config = config.ok_or(UploadsError::NilConfig)?;
        config
            .validate()
            .map_err(|e| UploadsError::InvalidConfig(e.to_string()))?;

        let store = backends::build_accessible_store(&config).await?;
        info!(bucket = %config.bucket_name, prefix = %config.bucket_prefix, "Upload manager ready");

        Ok(Self {
            store,
            bucket_prefix: config.bucket_prefix,
            upload_filename_key: config.upload_filename_key,
        })
    }

    /// Path-parameter name the serving route reads the filename from.
    pub fn upload_filename_key(&self) -> &str {
        &self.upload_filename_key
    }

    /// The unprefixed store handle.
    pub fn raw_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    fn key(&self, path: &str) -> ObjectPath {
        ObjectPath::from(format!("{}{}", self.bucket_prefix, path))
    }

    /// Write `content` at `path`, recording a content type guessed from the
    /// file extension.
    pub async fn save_file(&self, path: &str, content: Vec<u8>) -> Result<(), UploadsError> {
        let mut attributes = Attributes::new();
        if let Some(content_type) = content_type_for(path) {
            attributes.insert(
                Attribute::ContentType,
                AttributeValue::from(content_type.to_string()),
            );
        }

        let mut options = PutOptions::default();
        options.attributes = attributes;

        let key = self.key(path);
        let payload = PutPayload::from(content);
        match self.store.put_opts(&key, payload.clone(), options).await {
            Ok(_) => Ok(()),
            // LocalFileSystem has nowhere to keep attributes and rejects
            // them wholesale; `attributes` re-derives the content type from
            // the extension on the way out, so store the bytes plain.
            Err(object_store::Error::NotImplemented) => {
                self.store.put(&key, payload).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the blob at `path` to completion.
    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>, UploadsError> {
        let result = self
            .store
            .get(&self.key(path))
            .await
            .map_err(|e| match e {
                object_store::Error::NotFound { .. } => UploadsError::NotFound(path.to_string()),
                other => UploadsError::Store(other),
            })?;

        let bytes = result.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Content type and size of the blob at `path`.
    pub async fn attributes(&self, path: &str) -> Result<BlobAttributes, UploadsError> {
        let key = self.key(path);

        let meta = self.store.head(&key).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => UploadsError::NotFound(path.to_string()),
            other => UploadsError::Store(other),
        })?;

        // Stored content type when the backend kept it, extension guess
        // otherwise.
        let content_type = match self.store.get(&key).await {
            Ok(result) => result
                .attributes
                .get(&Attribute::ContentType)
                .map(|value| value.to_string())
                .or_else(|| content_type_for(path).map(str::to_string)),
            Err(_) => content_type_for(path).map(str::to_string),
        };

        Ok(BlobAttributes {
            content_type,
            size: meta.size as u64,
        })
    }

    /// Read a blob for serving: content plus its attributes.
    pub async fn serve_file(&self, path: &str) -> Result<(BlobAttributes, Vec<u8>), UploadsError> {
        let attributes = self.attributes(path).await?;
        let content = self.read_file(path).await?;
        Ok((attributes, content))
    }
}

/// Content type from a filename's extension.
fn content_type_for(path: &str) -> Option<&'static str> {
    let extension = path.rsplit('.').next()?;
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        "json" => Some("application/json"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadsConfig;

    async fn memory_manager(prefix: &str) -> UploadManager {
        UploadManager::new(Some(UploadsConfig::memory("b", prefix)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn round_trips_through_a_prefix() {
        let manager = memory_manager("pfx/").await;

        manager.save_file("x.txt", b"hello".to_vec()).await.unwrap();
        let content = manager.read_file("x.txt").await.unwrap();
        assert_eq!(content, b"hello");

        // The backend sees the prefixed key; the unprefixed one is absent.
        let raw = manager.raw_store();
        let stored = raw.get(&ObjectPath::from("pfx/x.txt")).await.unwrap();
        assert_eq!(stored.bytes().await.unwrap().to_vec(), b"hello");
        assert!(raw.get(&ObjectPath::from("x.txt")).await.is_err());
    }

    #[tokio::test]
    async fn missing_blob_reads_as_not_found() {
        let manager = memory_manager("").await;
        let result = manager.read_file("absent.png").await;
        assert!(matches!(result, Err(UploadsError::NotFound(_))));
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn attributes_report_size_and_content_type() {
        let manager = memory_manager("").await;
        manager
            .save_file("avatar.png", vec![0u8; 128])
            .await
            .unwrap();

        let attributes = manager.attributes("avatar.png").await.unwrap();
        assert_eq!(attributes.size, 128);
        assert_eq!(attributes.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn filesystem_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadsConfig::filesystem("b", dir.path().to_string_lossy());
        let manager = UploadManager::new(Some(config)).await.unwrap();

        manager
            .save_file("docs/readme.txt", b"contents".to_vec())
            .await
            .unwrap();
        assert_eq!(
            manager.read_file("docs/readme.txt").await.unwrap(),
            b"contents"
        );

        // The filesystem backend keeps no attributes; the content type
        // still comes back from the extension.
        let attributes = manager.attributes("docs/readme.txt").await.unwrap();
        assert_eq!(attributes.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn nil_config_is_rejected() {
        assert!(matches!(
            UploadManager::new(None).await,
            Err(UploadsError::NilConfig)
        ));
    }

    #[tokio::test]
    async fn overwrite_replaces_content() {
        let manager = memory_manager("p/").await;
        manager.save_file("k", b"one".to_vec()).await.unwrap();
        manager.save_file("k", b"two".to_vec()).await.unwrap();
        assert_eq!(manager.read_file("k").await.unwrap(), b"two");
    }
}
