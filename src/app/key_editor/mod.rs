//! Key Editor
//!
//! Edits the insert/request key pair of a project. Keys can be typed in,
//! copied from another project or from one of the user's own identities,
//! or generated by the node. The session ends with a confirm or a cancel.

mod editor;
mod helpers;
mod session;
mod types;
mod view;

pub use editor::KeyEditor;
pub use helpers::{
    extract_key_body, identity_display_hint, key_pair_from_generated, sorted_by_nickname,
};
pub use session::EditorSession;
pub use types::*;
pub use view::KeyEditorView;
