//! Localized dialog messages.
//!
//! Lookups are plain functions of `(locale, key)`. There is no process-wide
//! "current locale": callers pass the locale they are rendering for.

pub mod runtime_backend;

pub use runtime_backend::FALLBACK_LOCALE;
use runtime_backend::RuntimeBackend;

/// Look up `key` for `locale`, falling back to English and then to the key.
pub fn message(locale: &str, key: &str) -> String {
    RuntimeBackend.render(locale, key, &[])
}

/// Look up `key` and substitute `%{name}` placeholders from `args`.
pub fn format_message(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    RuntimeBackend.render(locale, key, args)
}

/// Whether messages exist for `locale` (or its base language).
pub fn is_supported(locale: &str) -> bool {
    RuntimeBackend.supports(locale)
}
