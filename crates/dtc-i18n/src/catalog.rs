//! Loading and walking language catalogs (`<dir>/<language>.json`).

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// Language codes that may be turned into a file name
pub fn is_safe_language(language: &str) -> bool {
    !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Read one catalog.
///
/// `None` when there is no file for the language (or the code is unsafe).
/// A file that is not a JSON object is reported and treated as empty.
pub fn read_catalog(dir: &Path, language: &str) -> Option<Value> {
    if !is_safe_language(language) {
        debug!("refusing language code {:?}", language);
        return None;
    }

    let path = dir.join(format!("{}.json", language));
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!("cannot read catalog {}: {}", path.display(), err);
            return Some(empty());
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(tree @ Value::Object(_)) => {
            debug!("loaded catalog {}", path.display());
            Some(tree)
        }
        Ok(_) => {
            warn!("catalog {} is not a JSON object, ignoring", path.display());
            Some(empty())
        }
        Err(err) => {
            warn!("catalog {} is malformed: {}", path.display(), err);
            Some(empty())
        }
    }
}

pub fn empty() -> Value {
    Value::Object(Map::new())
}

/// Walk a dotted key through nested objects.
///
/// A `null` leaf counts as absent.
pub fn lookup<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    let mut node = tree;
    for segment in key.split('.') {
        node = node.as_object()?.get(segment)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// Text form of a resolved value. Strings are used as-is, anything else as JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
