//! Common error types for Cairn comms components.
//!
//! These are the errors external collaborators (entity store, token issuer)
//! surface across the component boundary. Component-local errors wrap them.

use thiserror::Error;

/// Errors reported by external collaborators.
#[derive(Error, Debug)]
pub enum CommonError {
    /// Entity store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Collaborator did not answer within the bounded wait
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using `CommonError`
pub type Result<T> = std::result::Result<T, CommonError>;
