//! Error types for the frame editor

use thiserror::Error;

/// Editor errors
///
/// Every failed operation surfaces one of these and leaves the graph
/// unmodified. Commands validate before mutating, so a returned error
/// never corresponds to a partially-applied edit.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Frame '{0}' already exists")]
    DuplicateName(String),

    #[error("Parent frame '{0}' is not known")]
    InvalidParent(String),

    #[error("Operation would create a cycle through '{0}'")]
    CycleDetected(String),

    #[error("Frame '{0}' not found")]
    NotFound(String),

    #[error("Source frame '{0}' cannot be resolved")]
    UnknownSource(String),

    #[error("Transform chain for '{0}' cannot be resolved")]
    Unresolvable(String),

    #[error("Transform lookup for '{0}' timed out")]
    Timeout(String),

    #[error("Orientation is not a valid unit quaternion")]
    InvalidOrientation,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
