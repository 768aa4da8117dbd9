use crate::types::{KeyPair, OwnIdentity, Project};

/// Presentation side of the key editor.
///
/// The editor calls into the view whenever its state changes; a view never
/// mutates editor state itself. Implement this once per front-end.
pub trait KeyEditorView {
    fn render_key_pair(&mut self, key_pair: &KeyPair);

    fn render_projects(&mut self, projects: &[Project], selected: Option<usize>);

    /// `identities` is already ordered by nickname.
    fn render_identities(&mut self, identities: &[OwnIdentity], selected: Option<usize>);

    /// Ask whether the current keys may be replaced by freshly generated ones.
    fn confirm_regenerate(&mut self) -> bool;

    /// Show a recoverable error. The session stays open.
    fn show_error(&mut self, message: &str);

    fn close(&mut self, cancelled: bool);
}

impl<T: KeyEditorView + ?Sized> KeyEditorView for &mut T {
    fn render_key_pair(&mut self, key_pair: &KeyPair) {
        (**self).render_key_pair(key_pair)
    }

    fn render_projects(&mut self, projects: &[Project], selected: Option<usize>) {
        (**self).render_projects(projects, selected)
    }

    fn render_identities(&mut self, identities: &[OwnIdentity], selected: Option<usize>) {
        (**self).render_identities(identities, selected)
    }

    fn confirm_regenerate(&mut self) -> bool {
        (**self).confirm_regenerate()
    }

    fn show_error(&mut self, message: &str) {
        (**self).show_error(message)
    }

    fn close(&mut self, cancelled: bool) {
        (**self).close(cancelled)
    }
}
