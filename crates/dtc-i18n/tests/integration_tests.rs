//! Integration tests for dtc-i18n against the shipped `i18n/` catalogs.

use dtc_i18n::placeholders::placeholder_names;
use dtc_i18n::Translator;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

fn i18n_dir() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    workspace_root.join("i18n")
}

fn leaf_keys(prefix: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                leaf_keys(&path, child, out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

// =============================================================================
// Shipped Catalogs
// =============================================================================

#[test]
fn test_shipped_languages() {
    let translator = Translator::new(i18n_dir(), "en");
    assert_eq!(translator.available_languages(), vec!["de", "en"]);
}

#[test]
fn test_german_catalog_is_used() {
    let translator = Translator::new(i18n_dir(), "en");
    assert_eq!(
        translator.translate("report.vehicle.vin", "de", Some("VIN"), &[]),
        "FIN"
    );
    assert_eq!(
        translator.translate("report.generated_on", "de", None, &[("timestamp", "2024-01-02 03:04 UTC")]),
        "Erstellt am 2024-01-02 03:04 UTC"
    );
}

#[test]
fn test_german_gap_falls_back_to_english() {
    let translator = Translator::new(i18n_dir(), "en");
    // de.json has no severity.critical
    assert_eq!(
        translator.translate("severity.critical", "de", Some("Critical!"), &[]),
        "Critical"
    );
}

#[test]
fn test_unknown_code_templates() {
    let translator = Translator::new(i18n_dir(), "en");
    let text = translator.translate(
        "report.unknown_code_description",
        "en",
        Some("No database entry for code {code}."),
        &[("code", "P9999")],
    );
    assert_eq!(text, "No database entry for code P9999.");
}

#[test]
fn test_every_english_key_resolves_in_german() {
    let en: Value =
        serde_json::from_str(&std::fs::read_to_string(i18n_dir().join("en.json")).unwrap()).unwrap();
    let mut keys = Vec::new();
    leaf_keys("", &en, &mut keys);
    assert!(!keys.is_empty());

    let translator = Translator::new(i18n_dir(), "en");
    for key in keys {
        let text = translator.translate(&key, "de", None, &[]);
        assert_ne!(text, key, "{} did not resolve", key);
    }
}

#[test]
fn test_catalogs_use_same_placeholders() {
    let translator = Translator::new(i18n_dir(), "en");
    for key in [
        "upload.errors.invalid_images",
        "upload.errors.parse_failed",
        "report.generated_on",
        "report.unknown_code_description",
        "email.subject",
        "email.body",
    ] {
        let en = translator.lookup(key, "en").unwrap();
        let de = translator.lookup(key, "de").unwrap();
        assert_eq!(
            placeholder_names(en.as_str().unwrap()),
            placeholder_names(de.as_str().unwrap()),
            "placeholder mismatch in {}",
            key
        );
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_lookups_agree() {
    let translator = Arc::new(Translator::new(i18n_dir(), "en"));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let translator = Arc::clone(&translator);
            std::thread::spawn(move || {
                let language = if i % 2 == 0 { "en" } else { "de" };
                translator.translate("report.title", language, None, &[])
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let title = handle.join().unwrap();
        let expected = if i % 2 == 0 {
            "Vehicle Diagnostic Report"
        } else {
            "Fahrzeug-Diagnosebericht"
        };
        assert_eq!(title, expected);
    }
}

#[test]
fn test_global_instance_finds_shipped_catalogs() {
    let title = dtc_i18n::translate("report.title", "en", None, &[]);
    assert_eq!(title, "Vehicle Diagnostic Report");
}
