use thiserror::Error;

/// Errors produced while recording, resuming or exporting a listing session
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The node carries neither an id nor a usable class signature
    #[error("Selected element has no id or classes to distinguish it")]
    EmptySelector,

    /// The annotation prompt was cancelled or left blank
    #[error("Annotation title is empty")]
    EmptyTitle,

    /// An annotation was attempted before the result item was selected
    #[error("A result item must be selected before annotating")]
    SelectionRequired,

    /// The page limit supplied by the panel is unusable
    #[error("Invalid page limit: {0}")]
    InvalidPageLimit(u32),

    /// A custom wizard flow failed validation
    #[error("Invalid wizard flow: {0}")]
    InvalidFlow(String),

    /// The reloaded page is not the page the walker navigated to
    #[error("Expected to land on '{expected}' but found '{actual}'")]
    ResumeMismatch { expected: String, actual: String },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Marker store failure: {0}")]
    Store(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Failed to parse DOM: {0}")]
    DomParseFailed(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RecorderError>;
