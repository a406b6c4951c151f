use std::io;
use thiserror::Error;

/// User-facing rejections from structural tree operations. The state is
/// never partially applied when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("Node {0} not found")]
    NodeNotFound(String),

    #[error("Cannot delete the root node")]
    CannotDeleteRoot,

    #[error("Cannot move node: the root cannot move and a node cannot be dropped into its own subtree")]
    InvalidMove,
}

/// Failures of the AI-expansion pipeline.
#[derive(Error, Debug)]
pub enum ExpandError {
    #[error("No generation result to apply")]
    NotReady,

    #[error("Could not parse an outline structure from the draft")]
    UnparseableDraft,

    #[error("Generation failed: {0}")]
    Stream(String),

    #[error(transparent)]
    Map(#[from] MapError),
}

/// Document store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document {0} not found")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
