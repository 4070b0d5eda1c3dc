//! Error types for the temple site behaviour layer

use thiserror::Error;

use crate::dom::ElementId;

/// Main error type for page behaviour operations
#[derive(Error, Debug)]
pub enum SiteError {
    /// A required element matched no node in the document
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An element handle was passed to a controller that does not manage it
    #[error("Unknown element: {0}")]
    UnknownElement(ElementId),

    /// A DOM call failed in the host environment
    #[error("DOM error: {0}")]
    Dom(String),

    /// Configuration value was rejected
    #[error("Config error: {0}")]
    Config(String),

    /// Configuration JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SiteError
pub type SiteResult<T> = Result<T, SiteError>;
