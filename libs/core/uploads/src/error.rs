//! Upload subsystem errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadsError {
    /// No configuration was supplied at all.
    #[error("Upload configuration is absent")]
    NilConfig,

    #[error("Invalid upload configuration: {0}")]
    InvalidConfig(String),

    /// The accessibility probe failed; the bucket cannot be reached.
    #[error("Bucket '{0}' is unavailable")]
    BucketUnavailable(String),

    #[error("Backend initialization failed: {0}")]
    BackendInit(String),

    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("Blob storage error: {0}")]
    Store(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadsError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            UploadsError::NotFound(_) | UploadsError::Store(object_store::Error::NotFound { .. })
        )
    }
}
