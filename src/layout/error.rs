//! Layout error types.

use std::path::PathBuf;
use thiserror::Error;

use super::NodeId;

/// Failures that leave the layout untouched.
///
/// Looking up an id that is not in the tree is not an error; those
/// operations are no-ops.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A split request refers to a node that is no longer in the tree.
    #[error("insertion point {0} is no longer part of the layout")]
    StaleInsertionPoint(NodeId),

    /// A persisted layout failed validation.
    #[error("corrupt layout: {0}")]
    CorruptLayout(String),

    /// A layout name that cannot be stored as a single file in the layouts directory.
    #[error("invalid layout name: {0:?}")]
    InvalidName(String),

    /// Failed to read or write a layout file.
    #[error("failed to access layout file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to encode a layout document.
    #[error("failed to encode layout: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayoutError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        LayoutError::CorruptLayout(reason.into())
    }
}
