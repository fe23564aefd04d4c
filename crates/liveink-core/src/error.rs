//! Error types shared across the ink subsystem.

use crate::tools::InkingTool;
use thiserror::Error;

/// Errors raised by the ink subsystem.
#[derive(Debug, Error)]
pub enum InkError {
    /// The manager was built without a required host collaborator.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A tool that cannot produce strokes was used where a stroke tool is required.
    #[error("Unsupported tool: {0:?}")]
    UnsupportedTool(InkingTool),
    /// A tool name that does not map to any known tool.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Canvas already acquired: {0}")]
    CanvasAlreadyAcquired(String),
    #[error("Canvas not checked out: {0}")]
    CanvasNotAcquired(String),
    #[error("Unknown stroke: {0}")]
    UnknownStroke(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for ink operations.
pub type InkResult<T> = Result<T, InkError>;
