//! DAP error types.

use thiserror::Error;

/// Result type for DAP operations.
pub type DapResult<T> = Result<T, DapError>;

/// Broad class of a failure, used by the transport layer to pick a status
/// and by metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The client asked for something malformed or contradictory.
    Request,
    /// The request named something that does not exist.
    NotFound,
    /// The request tried to leave the permitted storage root.
    Access,
    /// Storage or internal failure.
    Server,
}

impl ErrorClass {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Request => "request",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Access => "access",
            ErrorClass::Server => "server",
        }
    }
}

/// Errors that can occur while serving a DAP request.
#[derive(Debug, Error)]
pub enum DapError {
    /// Malformed or contradictory request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// More than one projection was bound to the same variable.
    #[error("Variable projected more than once: {0}")]
    DuplicateProjection(String),

    /// A projection named a variable the dataset does not have.
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    /// Object identifier did not resolve to a dataset.
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// Object identifier escapes the permitted root.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Failure reading the underlying dataset.
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DapError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            DapError::InvalidRequest(_) | DapError::DuplicateProjection(_) => ErrorClass::Request,
            DapError::UnknownVariable(_) | DapError::DatasetNotFound(_) => ErrorClass::NotFound,
            DapError::AccessDenied(_) => ErrorClass::Access,
            DapError::DataAccess(_) | DapError::Internal(_) => ErrorClass::Server,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self.class() {
            ErrorClass::Request => 400,
            ErrorClass::NotFound => 404,
            ErrorClass::Access => 403,
            ErrorClass::Server => 500,
        }
    }

    /// Create a DataAccess error.
    pub fn data_access(msg: impl Into<String>) -> Self {
        Self::DataAccess(msg.into())
    }

    /// Create an InvalidRequest error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

impl From<std::io::Error> for DapError {
    fn from(err: std::io::Error) -> Self {
        Self::DataAccess(err.to_string())
    }
}
