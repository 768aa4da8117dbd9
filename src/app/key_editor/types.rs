//! Error types for the key editor.

use crate::services::node::NodeError;
use thiserror::Error;

/// A key URI that does not have the `<scheme>@<body>/<documentname>` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyUriError {
    #[error("key URI has no '@': {0}")]
    MissingAt(String),
    #[error("key URI has no '/' after the key body: {0}")]
    MissingSlash(String),
}

/// Key-pair generation failed.
///
/// Never fatal: the working key pair is left untouched and the session can
/// retry or be closed.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error("node returned a malformed key: {0}")]
    MalformedUri(#[from] KeyUriError),
    #[error("key generation was aborted")]
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("a key pair is already being generated")]
    GenerationPending,
}
