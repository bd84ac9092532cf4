//! Error types for the editor tree
//!
//! Recoverable failures are [`EditorError`]s. Hooks supplied by editor kinds
//! report failures through [`HookResult`] and are always invoked through
//! [`execute_safely`], so a failing hook never corrupts editor state.

use thiserror::Error;
use tracing::warn;

use crate::accessor::Accessor;
use crate::tree::EditorId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Editor {0} no longer exists")]
    StaleEditor(EditorId),

    #[error("Editor {id} is a {found}, expected a {expected}")]
    WrongKind {
        id: EditorId,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Editor {id} has no sub-editor at {accessor}")]
    InvalidAccessor { id: EditorId, accessor: Accessor },

    #[error("Unknown editor class '{0}'")]
    UnknownClass(String),

    #[error("Snapshot does not record an editor class")]
    MissingClass,

    #[error("Context does not provide a {0}")]
    MissingService(&'static str),

    #[error("Snapshot mismatch: expected {expected}, found {found}")]
    SnapshotMismatch { expected: String, found: String },

    #[error("Compound '{kind}' expects {expected} components, got {found}")]
    ComponentCount {
        kind: String,
        expected: usize,
        found: usize,
    },

    #[error("Editor {0} is already attached to a parent")]
    AlreadyAttached(EditorId),

    #[error("No factory for key '{0}' registered")]
    UnknownKey(String),

    #[error("Index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Editor {0} does not support copy and paste")]
    CopyPasteUnsupported(EditorId),
}

impl From<serde_json::Error> for EditorError {
    fn from(e: serde_json::Error) -> Self {
        EditorError::Serialization(e.to_string())
    }
}

/// Result of a user-supplied hook
pub type HookResult<T> = anyhow::Result<T>;

/// Run a hook, logging a failure and replacing it with `default`
pub fn execute_safely<T>(what: &str, default: T, hook: impl FnOnce() -> HookResult<T>) -> T {
    match hook() {
        Ok(value) => value,
        Err(error) => {
            warn!(error = %error, "Failed {} - continuing without result", what);
            default
        }
    }
}
