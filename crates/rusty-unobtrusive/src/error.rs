// File: src/error.rs
// Purpose: Error types for document access and remote validation

use crate::dom::NodeId;

/// Errors raised by document queries and mutations
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0:?} is detached from the document")]
    Detached(NodeId),

    #[error("no element with id '{0}'")]
    UnknownId(String),

    #[error("element '{0}' is not inside a form")]
    NoForm(String),
}

/// Errors from a remote validation round-trip.
///
/// These never reach callers of the binder; the runner turns them into an
/// invalid outcome.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
