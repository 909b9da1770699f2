//! DTC-I18N: Dotted-key translation lookup with language fallback
//!
//! Translations live in one JSON document per language (`<dir>/<lang>.json`)
//! with arbitrarily nested objects. A key such as `report.vehicle.vin` walks
//! that tree.
//!
//! Resolution order for every lookup:
//! 1. The requested language
//! 2. The default language (when different)
//! 3. The caller's default text
//! 4. The key itself
//!
//! Catalogs are read on first use and cached for the life of the process.

pub mod catalog;
pub mod placeholders;

use dtc_core::settings::default_i18n_dir;
use dtc_core::DEFAULT_LANGUAGE;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

pub use placeholders::substitute;

/// Process-wide translator over the shipped `i18n/` directory.
///
/// `VEHICLESCAN_I18N_DIR` overrides the location.
static GLOBAL: Lazy<Translator> = Lazy::new(|| {
    let dir = std::env::var_os("VEHICLESCAN_I18N_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(default_i18n_dir);
    Translator::new(dir, DEFAULT_LANGUAGE)
});

/// Shared translator instance
pub fn global() -> &'static Translator {
    &GLOBAL
}

/// Translate through the shared instance
pub fn translate(
    key: &str,
    language: &str,
    default: Option<&str>,
    params: &[(&str, &str)],
) -> String {
    GLOBAL.translate(key, language, default, params)
}

/// Translation catalogs for one directory
#[derive(Debug)]
pub struct Translator {
    dir: PathBuf,
    default_language: String,
    catalogs: RwLock<HashMap<String, Arc<Value>>>,
}

impl Translator {
    pub fn new(dir: impl Into<PathBuf>, default_language: impl Into<String>) -> Self {
        Translator {
            dir: dir.into(),
            default_language: default_language.into(),
            catalogs: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Resolve `key` for `language`, then substitute `params`.
    ///
    /// Never fails; see the crate docs for the fallback order.
    pub fn translate(
        &self,
        key: &str,
        language: &str,
        default: Option<&str>,
        params: &[(&str, &str)],
    ) -> String {
        match self.lookup(key, language) {
            Some(Value::String(template)) => substitute(&template, params),
            Some(other) => catalog::value_to_text(&other),
            None => match default {
                Some(text) => substitute(text, params),
                None => {
                    debug!("no translation for {} ({})", key, language);
                    key.to_string()
                }
            },
        }
    }

    /// Raw value for `key` from the requested or default language tree
    pub fn lookup(&self, key: &str, language: &str) -> Option<Value> {
        let requested = self.catalog(language);
        if let Some(value) = catalog::lookup(&requested, key) {
            return Some(value.clone());
        }

        if language != self.default_language {
            let fallback = self.catalog(&self.default_language);
            if let Some(value) = catalog::lookup(&fallback, key) {
                debug!("{} missing in {}, using {}", key, language, self.default_language);
                return Some(value.clone());
            }
        }

        None
    }

    /// Language codes that have a catalog file, sorted
    pub fn available_languages(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("cannot list {}: {}", self.dir.display(), err);
                return Vec::new();
            }
        };

        let mut languages: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str()).map(String::from))
            .filter(|stem| catalog::is_safe_language(stem))
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }

    /// `language` when a catalog exists for it, otherwise the default language
    pub fn resolve_language(&self, language: Option<&str>) -> String {
        match language {
            Some(requested) if self.available_languages().iter().any(|l| l == requested) => {
                requested.to_string()
            }
            _ => self.default_language.clone(),
        }
    }

    pub fn localizer(&self, language: impl Into<String>) -> Localizer<'_> {
        Localizer {
            translator: self,
            language: language.into(),
        }
    }

    fn catalog(&self, language: &str) -> Arc<Value> {
        {
            let cache = self.catalogs.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(tree) = cache.get(language) {
                return Arc::clone(tree);
            }
        }

        let mut cache = self.catalogs.write().unwrap_or_else(PoisonError::into_inner);
        self.load_into(&mut cache, language)
    }

    fn load_into(&self, cache: &mut HashMap<String, Arc<Value>>, language: &str) -> Arc<Value> {
        if let Some(tree) = cache.get(language) {
            return Arc::clone(tree);
        }

        match catalog::read_catalog(&self.dir, language) {
            Some(tree) => {
                let tree = Arc::new(tree);
                cache.insert(language.to_string(), Arc::clone(&tree));
                tree
            }
            None if language == self.default_language => {
                let tree = Arc::new(catalog::empty());
                cache.insert(language.to_string(), Arc::clone(&tree));
                tree
            }
            // Not cached under `language`: unknown codes must not grow the cache
            None => self.load_into(cache, &self.default_language),
        }
    }
}

/// A translator bound to one language
#[derive(Debug, Clone)]
pub struct Localizer<'a> {
    translator: &'a Translator,
    language: String,
}

impl<'a> Localizer<'a> {
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn translator(&self) -> &'a Translator {
        self.translator
    }

    /// Translated text with a fallback
    pub fn text(&self, key: &str, default: &str) -> String {
        self.translator.translate(key, &self.language, Some(default), &[])
    }

    /// Translated text with placeholder parameters
    pub fn text_with(&self, key: &str, default: &str, params: &[(&str, &str)]) -> String {
        self.translator
            .translate(key, &self.language, Some(default), params)
    }
}
