//! Content-addressed blob storage for user uploads.
//!
//! One facade ([`UploadManager`]) over four `object_store` backends
//! (filesystem, memory, S3, GCS), selected and validated from config at
//! init. All keys are transparently namespaced by an optional bucket
//! prefix.

pub mod backends;
pub mod config;
pub mod error;
pub mod manager;

pub use config::{FilesystemConfig, GcsConfig, S3Config, StorageProvider, UploadsConfig};
pub use error::UploadsError;
pub use manager::{BlobAttributes, UploadManager};
