//! Helper/utility functions for the key editor.

use super::types::KeyUriError;
use crate::types::{GeneratedKeyPair, KeyPair, OwnIdentity};

/// Return the identities ordered by nickname, ignoring case.
///
/// The sort is stable, so identities with equal nicknames keep the order
/// they were supplied in.
pub fn sorted_by_nickname(identities: impl IntoIterator<Item = OwnIdentity>) -> Vec<OwnIdentity> {
    let mut sorted: Vec<OwnIdentity> = identities.into_iter().collect();
    sorted.sort_by_cached_key(|identity| identity.nickname.to_lowercase());
    sorted
}

/// Format an identity for display in a selection list
///
/// Produces `"<nickname> (<request URI up to the first comma>)"`, which is
/// enough of the routing key to tell identities with the same nickname apart.
pub fn identity_display_hint(identity: &OwnIdentity) -> String {
    let uri = identity.request_uri.as_str();
    let prefix = uri.split_once(',').map_or(uri, |(head, _)| head);
    format!("{} ({})", identity.nickname, prefix)
}

/// Extract the key body from a full key URI.
///
/// The body is everything after the first `@` and before the last `/`, so
/// `"USK@abc123/documentname"` yields `"abc123"` and
/// `"SSK@priv111,pub222/site/0"` yields `"priv111,pub222/site"`.
pub fn extract_key_body(uri: &str) -> Result<&str, KeyUriError> {
    let at = uri.find('@').ok_or_else(|| KeyUriError::MissingAt(uri.to_string()))?;
    let slash = uri
        .rfind('/')
        .filter(|&slash| slash > at)
        .ok_or_else(|| KeyUriError::MissingSlash(uri.to_string()))?;
    Ok(&uri[at + 1..slash])
}

/// Reduce a generated pair to its key bodies; fails unless both are well formed.
pub fn key_pair_from_generated(generated: &GeneratedKeyPair) -> Result<KeyPair, KeyUriError> {
    Ok(KeyPair::new(
        extract_key_body(&generated.request_uri)?,
        extract_key_body(&generated.insert_uri)?,
    ))
}
