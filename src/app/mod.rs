pub mod key_editor;
pub mod terminal_view;
