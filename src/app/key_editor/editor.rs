//! The key editor controller.
//!
//! Ties an [`EditorSession`] to a view and a node. All user actions go
//! through here; the view is re-rendered after each state change.

use super::session::EditorSession;
use super::types::{EditorError, GenerationError};
use super::view::KeyEditorView;
use crate::i18n;
use crate::services::key_generation::{
    start_key_generation, GenerationPoll, KeyGenerationHandle, KeyGenerationResult,
};
use crate::services::node::NodeInterface;
use crate::types::{EditorOutcome, KeyPair, OwnIdentity, Project};
use std::sync::Arc;

/// An open key editor.
///
/// Only one key generation may be outstanding at a time; a second request
/// is rejected with [`EditorError::GenerationPending`]. Closing the editor
/// aborts an outstanding generation and drops its result.
pub struct KeyEditor<V: KeyEditorView> {
    session: EditorSession,
    node: Arc<dyn NodeInterface>,
    view: V,
    locale: String,
    pending: Option<KeyGenerationHandle>,
}

impl<V: KeyEditorView> KeyEditor<V> {
    pub fn open(
        initial: KeyPair,
        projects: Vec<Project>,
        identities: Vec<OwnIdentity>,
        node: Arc<dyn NodeInterface>,
        view: V,
        locale: &str,
    ) -> Self {
        let mut session = EditorSession::new(initial);
        session.set_projects(projects);
        session.set_own_identities(identities);
        let mut editor = Self {
            session,
            node,
            view,
            locale: locale.to_string(),
            pending: None,
        };
        editor.render_key_pair();
        editor.render_projects();
        editor.render_identities();
        tracing::debug!(locale = %editor.locale, "Key editor opened");
        editor
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn key_pair(&self) -> &KeyPair {
        self.session.key_pair()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn set_projects(&mut self, projects: Vec<Project>) {
        self.session.set_projects(projects);
        self.render_projects();
    }

    pub fn set_own_identities(&mut self, identities: Vec<OwnIdentity>) {
        self.session.set_own_identities(identities);
        self.render_identities();
    }

    pub fn select_project(&mut self, index: Option<usize>) {
        self.session.select_project(index);
        self.render_projects();
    }

    pub fn select_identity(&mut self, index: Option<usize>) {
        self.session.select_identity(index);
        self.render_identities();
    }

    /// Copy both keys from the selected project. No-op without a selection.
    pub fn copy_from_project(&mut self) -> Option<KeyPair> {
        let copied = self.session.copy_from_selected_project()?;
        self.render_key_pair();
        Some(copied)
    }

    /// Copy both keys from the selected identity. No-op without a selection.
    pub fn copy_from_identity(&mut self) -> Option<KeyPair> {
        let copied = self.session.copy_from_selected_identity()?;
        self.render_key_pair();
        Some(copied)
    }

    pub fn edit_public_key(&mut self, public_key: impl Into<String>) {
        self.session.set_public_key(public_key);
    }

    pub fn edit_private_key(&mut self, private_key: impl Into<String>) {
        self.session.set_private_key(private_key);
    }

    /// Ask the node for a new key pair in the background.
    ///
    /// Returns `Ok(false)` if the view declined to overwrite the current
    /// keys. Must be called from within a tokio runtime.
    pub fn request_generation(&mut self) -> Result<bool, EditorError> {
        if self.pending.is_some() {
            tracing::debug!("Rejecting key generation request, one is already pending");
            return Err(EditorError::GenerationPending);
        }
        if !self.view.confirm_regenerate() {
            tracing::debug!("Key regeneration declined");
            return Ok(false);
        }
        self.pending = Some(start_key_generation(Arc::clone(&self.node)));
        Ok(true)
    }

    /// Apply the generation result if it has arrived, without blocking.
    pub fn poll_generation(&mut self) -> Option<Result<KeyPair, GenerationError>> {
        let result = match self.pending.as_mut()?.try_get_result() {
            GenerationPoll::Pending => return None,
            GenerationPoll::Ready(result) => Some(result),
            GenerationPoll::Lost => None,
        };
        self.pending = None;
        Some(self.apply(result))
    }

    /// Wait for the outstanding generation and apply it.
    ///
    /// `None` if no generation was requested. Cancel safe: if the returned
    /// future is dropped early the request stays pending.
    pub async fn finish_generation(&mut self) -> Option<Result<KeyPair, GenerationError>> {
        let result = self.pending.as_mut()?.wait().await;
        self.pending = None;
        Some(self.apply(result))
    }

    fn apply(&mut self, result: Option<KeyGenerationResult>) -> Result<KeyPair, GenerationError> {
        let outcome = match result {
            Some(result) => self.session.apply_generated(result),
            None => Err(GenerationError::Aborted),
        };
        match &outcome {
            Ok(_) => self.render_key_pair(),
            Err(e) => {
                let error = e.to_string();
                let message = i18n::format_message(
                    &self.locale,
                    "key_dialog.error.keygen_io",
                    &[("error", error.as_str())],
                );
                self.view.show_error(&message);
            }
        }
        outcome
    }

    /// Accept the edited keys and close the editor.
    pub fn confirm(mut self) -> EditorOutcome {
        self.discard_pending();
        let key_pair = self.session.confirm();
        self.view.close(false);
        tracing::debug!("Key editor confirmed");
        EditorOutcome::confirmed(key_pair)
    }

    /// Discard the edited keys and close the editor.
    pub fn cancel(mut self) -> EditorOutcome {
        self.discard_pending();
        self.session.cancel();
        self.view.close(true);
        tracing::debug!("Key editor cancelled");
        EditorOutcome::cancelled()
    }

    fn discard_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    fn render_key_pair(&mut self) {
        self.view.render_key_pair(self.session.key_pair());
    }

    fn render_projects(&mut self) {
        self.view
            .render_projects(self.session.projects(), self.session.selected_project_index());
    }

    fn render_identities(&mut self) {
        self.view.render_identities(
            self.session.own_identities(),
            self.session.selected_identity_index(),
        );
    }
}
