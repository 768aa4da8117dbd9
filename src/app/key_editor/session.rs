//! State of a single key-editing session.

use super::helpers::{key_pair_from_generated, sorted_by_nickname};
use super::types::GenerationError;
use crate::services::node::{NodeError, NodeInterface};
use crate::types::{GeneratedKeyPair, KeyPair, OwnIdentity, Project};

/// The working state of one key editor invocation.
///
/// Holds the key pair being edited, the projects and identities it can be
/// copied from, and whether the session ended in a cancel. A session starts
/// out cancelled; only [`EditorSession::confirm`] clears the flag.
#[derive(Debug, Clone)]
pub struct EditorSession {
    key_pair: KeyPair,
    cancelled: bool,
    projects: Vec<Project>,
    own_identities: Vec<OwnIdentity>,
    selected_project: Option<usize>,
    selected_identity: Option<usize>,
}

impl EditorSession {
    pub fn new(initial: KeyPair) -> Self {
        Self {
            key_pair: initial,
            cancelled: true,
            projects: Vec::new(),
            own_identities: Vec::new(),
            selected_project: None,
            selected_identity: None,
        }
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// The identities, always ordered by nickname (case-insensitive).
    pub fn own_identities(&self) -> &[OwnIdentity] {
        &self.own_identities
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn set_public_key(&mut self, public_key: impl Into<String>) {
        self.key_pair.public_key = public_key.into();
    }

    pub fn set_private_key(&mut self, private_key: impl Into<String>) {
        self.key_pair.private_key = private_key.into();
    }

    /// Replace the project list and clear the project selection.
    pub fn set_projects(&mut self, projects: impl IntoIterator<Item = Project>) {
        self.projects = projects.into_iter().collect();
        self.selected_project = None;
        tracing::debug!(count = self.projects.len(), "Key editor projects replaced");
    }

    /// Replace the identity list.
    ///
    /// The list is re-sorted by nickname. If an identity carries exactly the
    /// working key pair it becomes the selection (the first one wins);
    /// otherwise the selection is cleared.
    pub fn set_own_identities(&mut self, identities: impl IntoIterator<Item = OwnIdentity>) {
        self.own_identities = sorted_by_nickname(identities);
        self.selected_identity = self.own_identities.iter().position(|identity| {
            identity.insert_uri == self.key_pair.private_key
                && identity.request_uri == self.key_pair.public_key
        });
        tracing::debug!(
            count = self.own_identities.len(),
            matched = ?self.selected_identity,
            "Key editor identities replaced"
        );
    }

    pub fn selected_project_index(&self) -> Option<usize> {
        self.selected_project
    }

    pub fn selected_identity_index(&self) -> Option<usize> {
        self.selected_identity
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.selected_project.and_then(|index| self.projects.get(index))
    }

    pub fn selected_identity(&self) -> Option<&OwnIdentity> {
        self.selected_identity
            .and_then(|index| self.own_identities.get(index))
    }

    /// Select a project by index. Out-of-range indices clear the selection.
    pub fn select_project(&mut self, index: Option<usize>) {
        self.selected_project = index.filter(|&i| i < self.projects.len());
    }

    /// Select an identity by index. Out-of-range indices clear the selection.
    pub fn select_identity(&mut self, index: Option<usize>) {
        self.selected_identity = index.filter(|&i| i < self.own_identities.len());
    }

    pub fn can_copy_from_project(&self) -> bool {
        self.selected_project.is_some()
    }

    pub fn can_copy_from_identity(&self) -> bool {
        self.selected_identity.is_some()
    }

    /// Take both keys from `selected`. Does nothing when no project is given.
    pub fn copy_from_project(&mut self, selected: Option<&Project>) -> Option<KeyPair> {
        let project = selected?;
        self.key_pair = KeyPair::new(&project.request_uri, &project.insert_uri);
        tracing::debug!(project = %project.name, "Copied keys from project");
        Some(self.key_pair.clone())
    }

    /// Take both keys from `selected`. Does nothing when no identity is given.
    pub fn copy_from_identity(&mut self, selected: Option<&OwnIdentity>) -> Option<KeyPair> {
        let identity = selected?;
        self.key_pair = KeyPair::new(&identity.request_uri, &identity.insert_uri);
        tracing::debug!(identity = %identity.nickname, "Copied keys from identity");
        Some(self.key_pair.clone())
    }

    pub fn copy_from_selected_project(&mut self) -> Option<KeyPair> {
        let project = self.selected_project()?.clone();
        self.copy_from_project(Some(&project))
    }

    pub fn copy_from_selected_identity(&mut self) -> Option<KeyPair> {
        let identity = self.selected_identity()?.clone();
        self.copy_from_identity(Some(&identity))
    }

    /// Ask the node for a new key pair and make it the working pair.
    pub async fn generate(
        &mut self,
        node: &dyn NodeInterface,
    ) -> Result<KeyPair, GenerationError> {
        let result = node.generate_key_pair().await;
        self.apply_generated(result)
    }

    /// Apply the outcome of a node generation request.
    ///
    /// Both key bodies are extracted before anything is stored, so on any
    /// error the working pair is exactly what it was before.
    pub fn apply_generated(
        &mut self,
        result: Result<GeneratedKeyPair, NodeError>,
    ) -> Result<KeyPair, GenerationError> {
        let generated = result.inspect_err(|e| {
            tracing::warn!("Key pair generation failed: {}", e);
        })?;
        self.key_pair = key_pair_from_generated(&generated)?;
        tracing::debug!("Applied generated key pair");
        Ok(self.key_pair.clone())
    }

    /// Accept the session, returning the key pair exactly as currently held.
    pub fn confirm(&mut self) -> KeyPair {
        self.cancelled = false;
        self.key_pair.clone()
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }
}
