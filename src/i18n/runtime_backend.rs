//! Translation tables for the key dialog, served through rust-i18n's
//! `Backend` trait.
//!
//! Each locale file is compiled in and parsed on first use. Lookups walk a
//! fallback chain: the requested locale, its base language (`de-AT` to
//! `de`), then English. Messages may carry `%{name}` placeholders.

use once_cell::sync::Lazy;
use rust_i18n::Backend;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Locale used when nothing more specific has the message
pub const FALLBACK_LOCALE: &str = "en";

const EMBEDDED_LOCALES: &[(&str, &str)] = &[
    (
        "de",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/locales/de.json")),
    ),
    (
        "en",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/locales/en.json")),
    ),
    (
        "fr",
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/locales/fr.json")),
    ),
];

/// Flattened `dotted.key -> message` table of one locale
type Catalog = HashMap<String, String>;

static CATALOGS: Lazy<HashMap<&'static str, Catalog>> = Lazy::new(|| {
    EMBEDDED_LOCALES
        .iter()
        .map(|(locale, json)| (*locale, load_catalog(locale, json)))
        .collect()
});

fn load_catalog(locale: &str, json: &str) -> Catalog {
    let mut catalog = Catalog::new();
    match serde_json::from_str::<Map<String, Value>>(json) {
        Ok(root) => collect_messages(&root, "", &mut catalog),
        Err(e) => tracing::warn!(locale, "Ignoring unparseable locale table: {}", e),
    }
    catalog
}

/// Walk nested objects, joining keys with dots. Keys starting with `_` are
/// metadata and are skipped, as are non-string leaves.
fn collect_messages(object: &Map<String, Value>, prefix: &str, catalog: &mut Catalog) {
    for (key, value) in object.iter().filter(|(key, _)| !key.starts_with('_')) {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) => collect_messages(nested, &path, catalog),
            Value::String(message) => {
                catalog.insert(path, message.clone());
            }
            _ => {}
        }
    }
}

/// Base language of a locale tag, e.g. `pt` for `pt-BR`
pub fn base_language(locale: &str) -> &str {
    locale
        .split_once(['-', '_'])
        .map_or(locale, |(base, _)| base)
}

/// Locales to try for `locale`, most specific first
fn fallback_chain(locale: &str) -> Vec<&str> {
    let mut chain = vec![locale];
    let base = base_language(locale);
    if base != locale {
        chain.push(base);
    }
    if !chain.contains(&FALLBACK_LOCALE) {
        chain.push(FALLBACK_LOCALE);
    }
    chain
}

/// Fill `%{name}` placeholders from `args` in a single pass.
///
/// Placeholders without a matching argument are left as written, and
/// substituted values are never scanned again.
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            rest = &rest[start..];
            break;
        };
        let name = &after[..end];
        match args.iter().find(|(arg, _)| *arg == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 3]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Translation backend over the embedded tables
#[derive(Debug, Clone, Copy)]
pub struct RuntimeBackend;

impl RuntimeBackend {
    /// Find `key` along the fallback chain of `locale`.
    pub fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        fallback_chain(locale)
            .into_iter()
            .find_map(|candidate| self.translate(candidate, key))
    }

    /// The message for `key` with placeholders filled in, or the key itself
    /// when no table has it.
    pub fn render(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> String {
        match self.lookup(locale, key) {
            Some(template) => interpolate(template, args),
            None => {
                tracing::debug!(locale, key, "No translation found");
                key.to_string()
            }
        }
    }

    /// Whether `locale`, or its base language, has a table of its own.
    pub fn supports(&self, locale: &str) -> bool {
        let available = self.available_locales();
        available.contains(&locale) || available.contains(&base_language(locale))
    }
}

impl Backend for RuntimeBackend {
    fn available_locales(&self) -> Vec<&str> {
        EMBEDDED_LOCALES.iter().map(|(locale, _)| *locale).collect()
    }

    /// Exact lookup in one table, without fallback.
    fn translate(&self, locale: &str, key: &str) -> Option<&str> {
        CATALOGS.get(locale)?.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_locale_covers_english_messages() {
        let english = &CATALOGS[FALLBACK_LOCALE];
        assert!(english.contains_key("key_dialog.error.keygen_io"));
        for (locale, catalog) in CATALOGS.iter() {
            for key in english.keys() {
                assert!(catalog.contains_key(key), "Locale {} lacks {}", locale, key);
            }
        }
    }

    #[test]
    fn test_placeholders_survive_translation() {
        for (locale, catalog) in CATALOGS.iter() {
            assert!(
                catalog["key_dialog.error.keygen_io"].contains("%{error}"),
                "Locale {} drops the error placeholder",
                locale
            );
            assert!(catalog["key_dialog.prompt.unknown_command"].contains("%{command}"));
        }
    }

    #[test]
    fn test_version_metadata_is_not_a_message() {
        assert!(CATALOGS.values().all(|catalog| !catalog.contains_key("_version")));
    }

    #[test]
    fn test_unparseable_table_is_empty() {
        assert!(load_catalog("xx", "{ nope").is_empty());
        assert!(load_catalog("xx", r#"["not", "an", "object"]"#).is_empty());
    }

    #[test]
    fn test_fallback_chain() {
        assert_eq!(fallback_chain("de-AT"), vec!["de-AT", "de", "en"]);
        assert_eq!(fallback_chain("fr"), vec!["fr", "en"]);
        assert_eq!(fallback_chain("en_GB"), vec!["en_GB", "en"]);
        assert_eq!(fallback_chain("en"), vec!["en"]);
    }

    #[test]
    fn test_lookup_uses_base_language() {
        assert_eq!(
            RuntimeBackend.lookup("de-CH", "key_dialog.button.cancel"),
            Some("Abbrechen")
        );
        assert_eq!(RuntimeBackend.translate("de-CH", "key_dialog.button.cancel"), None);
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate("a %{x} b", &[("x", "1")]), "a 1 b");
        assert_eq!(interpolate("%{x}%{x}", &[("x", "ab")]), "abab");
        assert_eq!(interpolate("keep %{y}", &[("x", "1")]), "keep %{y}");
        assert_eq!(interpolate("open %{x", &[("x", "1")]), "open %{x");
        assert_eq!(interpolate("no placeholders", &[]), "no placeholders");
    }

    #[test]
    fn test_interpolate_does_not_rescan_values() {
        assert_eq!(
            interpolate("%{a} %{b}", &[("a", "%{b}"), ("b", "2")]),
            "%{b} 2"
        );
    }

    #[test]
    fn test_supports() {
        assert!(RuntimeBackend.supports("fr"));
        assert!(RuntimeBackend.supports("fr-CA"));
        assert!(!RuntimeBackend.supports("pl"));
    }
}
