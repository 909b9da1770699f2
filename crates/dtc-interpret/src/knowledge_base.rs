//! Knowledge Base: code → description, advice, severity
//!
//! The dataset is a JSON object keyed by code:
//!
//! ```json
//! { "P0300": { "description": {"en": "..."}, "advice": {"en": "..."}, "severity": "high" } }
//! ```
//!
//! Records are normalized once at load:
//! - Codes become uppercase keys
//! - Bare-string text fields become a mapping under the default language
//! - Non-string leaves are stringified

use dtc_core::Severity;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// Text in several languages, keyed by language code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: impl Into<String>, text: impl Into<String>) {
        self.0.insert(language.into(), text.into());
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0.get(language).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text for `language`, else `default_language`, else the first entry by key.
    ///
    /// An empty mapping resolves to "".
    pub fn resolve(&self, language: &str, default_language: &str) -> &str {
        self.get(language)
            .or_else(|| self.get(default_language))
            .or_else(|| self.0.values().next().map(String::as_str))
            .unwrap_or("")
    }

    fn from_value(value: Option<&Value>, default_language: &str) -> Self {
        let mut text = LocalizedText::new();
        match value {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (language, leaf) in map {
                    if let Some(leaf) = leaf_text(leaf) {
                        text.insert(language.clone(), leaf);
                    }
                }
            }
            Some(other) => {
                if let Some(leaf) = leaf_text(other) {
                    text.insert(default_language, leaf);
                }
            }
        }
        text
    }
}

fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// One dataset entry after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBaseRecord {
    pub description: LocalizedText,
    pub advice: LocalizedText,
    pub severity: Severity,
}

/// Read-only code dataset
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    records: HashMap<String, KnowledgeBaseRecord>,
    default_language: String,
}

impl KnowledgeBase {
    /// A dataset with no records: every code is unknown
    pub fn empty(default_language: &str) -> Self {
        KnowledgeBase {
            records: HashMap::new(),
            default_language: default_language.to_string(),
        }
    }

    /// Load from a JSON file.
    ///
    /// A missing or malformed file yields an empty dataset.
    pub fn load(path: &Path, default_language: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!("knowledge base {} unavailable: {}", path.display(), err);
                return Self::empty(default_language);
            }
        };

        match Self::from_json_str(&content, default_language) {
            Some(kb) => {
                debug!("loaded {} knowledge base record(s) from {}", kb.len(), path.display());
                kb
            }
            None => {
                warn!("knowledge base {} is malformed, treating as empty", path.display());
                Self::empty(default_language)
            }
        }
    }

    /// Parse and normalize a dataset. `None` unless the document is a JSON object.
    pub fn from_json_str(content: &str, default_language: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(map)) => Some(Self::from_map(&map, default_language)),
            Ok(_) => None,
            Err(err) => {
                debug!("knowledge base parse error: {}", err);
                None
            }
        }
    }

    fn from_map(map: &Map<String, Value>, default_language: &str) -> Self {
        let mut records = HashMap::with_capacity(map.len());

        for (code, record) in map {
            let Some(fields) = record.as_object() else {
                warn!("knowledge base entry {} is not an object, skipping", code);
                continue;
            };

            let severity = match fields.get("severity") {
                None | Some(Value::Null) => Severity::Unknown,
                Some(Value::String(name)) => Severity::from(name.as_str()),
                Some(other) => Severity::from(other.to_string().as_str()),
            };

            records.insert(
                code.trim().to_ascii_uppercase(),
                KnowledgeBaseRecord {
                    description: LocalizedText::from_value(fields.get("description"), default_language),
                    advice: LocalizedText::from_value(fields.get("advice"), default_language),
                    severity,
                },
            );
        }

        KnowledgeBase {
            records,
            default_language: default_language.to_string(),
        }
    }

    /// Record for a code, case-insensitive
    pub fn get(&self, code: &str) -> Option<&KnowledgeBaseRecord> {
        self.records.get(&code.to_ascii_uppercase())
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
