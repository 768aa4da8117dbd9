#![deny(clippy::let_underscore_must_use)]

// Key editor library - exposes all core modules for testing

pub mod app;
pub mod config;
pub mod i18n;
pub mod services;
pub mod types;
