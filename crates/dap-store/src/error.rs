//! Error types for the Zarr store.

use dap_protocol::DapError;
use thiserror::Error;

/// Errors that can occur while resolving or reading a store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No group exists at the requested location.
    #[error("dataset not found: {0}")]
    NotFound(String),

    /// Failed to open a Zarr node.
    #[error("failed to open zarr node: {0}")]
    OpenFailed(String),

    /// Failed to read array data.
    #[error("failed to read array data: {0}")]
    ReadFailed(String),

    /// A `zarr.json` document could not be understood.
    #[error("invalid zarr metadata: {0}")]
    InvalidMetadata(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}

impl From<StoreError> for DapError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DapError::DatasetNotFound(id),
            other => DapError::DataAccess(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
