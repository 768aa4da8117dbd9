//! Core data types shared by the key editor, the node client and the CLI.

use serde::{Deserialize, Serialize};

/// A public/private key pair as edited by the user.
///
/// Both halves are opaque strings. Nothing here validates their shape; the
/// node is the authority on whether a key is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    /// The request key, shared with readers
    pub public_key: String,
    /// The insert key, kept by the publisher
    pub private_key: String,
}

impl KeyPair {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.public_key.is_empty() && self.private_key.is_empty()
    }
}

/// A publishing project the keys can be copied from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub request_uri: String,
    pub insert_uri: String,
}

/// One of the user's own identities the keys can be copied from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnIdentity {
    pub nickname: String,
    pub request_uri: String,
    pub insert_uri: String,
}

/// A freshly generated key pair, as full URIs straight from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKeyPair {
    pub insert_uri: String,
    pub request_uri: String,
}

/// How an editing session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOutcome {
    pub cancelled: bool,
    /// The confirmed pair; `None` when the session was cancelled
    pub key_pair: Option<KeyPair>,
}

impl EditorOutcome {
    pub fn confirmed(key_pair: KeyPair) -> Self {
        Self {
            cancelled: false,
            key_pair: Some(key_pair),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            cancelled: true,
            key_pair: None,
        }
    }
}
