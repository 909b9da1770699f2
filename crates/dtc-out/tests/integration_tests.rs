//! Integration tests for dtc-out with the shipped translation catalogs.
//!
//! These tests run the full rendering path (layout in a real language,
//! pagination, image embedding, file output) and check the resulting PDF.

use chrono::{TimeZone, Utc};
use dtc_core::{CodeStatus, InterpretedCode, ReportContext, Severity, VehicleInfo};
use dtc_i18n::Translator;
use dtc_out::layout::{self, Block};
use dtc_out::{render, RenderError};
use std::path::PathBuf;

fn translator() -> Translator {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    Translator::new(workspace_root.join("i18n"), "en")
}

fn context(language: &str, codes: Vec<InterpretedCode>) -> ReportContext {
    ReportContext {
        report_id: "0f8e2c4b9a1d4e6f8a2b3c4d5e6f7a8b".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
        language: language.to_string(),
        vehicle: VehicleInfo {
            vin: Some("WVWZZZ1JZXW000001".to_string()),
            mileage: Some("128000 km".to_string()),
            notes: None,
        },
        codes,
        images: Vec::new(),
    }
}

fn misfire() -> InterpretedCode {
    InterpretedCode {
        code: "P0300".to_string(),
        description: "Random/Multiple Cylinder Misfire Detected".to_string(),
        severity: Severity::High,
        severity_label: "High".to_string(),
        advice: "Check ignition coils, spark plugs and injectors.".to_string(),
        status: Some(CodeStatus::Stored),
        known: true,
    }
}

fn jpeg(dir: &std::path::Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save(&path).unwrap();
    path
}

// =============================================================================
// Layout In A Real Language
// =============================================================================

#[test]
fn test_german_labels() {
    let t = translator();
    let ctx = context("de", vec![misfire()]);
    let doc = layout::build(&ctx, &t.localizer("de")).unwrap();

    assert_eq!(doc.title, "Fahrzeug-Diagnosebericht");
    let texts = doc.texts();
    assert!(texts.contains(&"Erstellt am 2024-06-01 09:30 UTC"));
    assert!(texts.contains(&"FIN"));
    assert!(texts.contains(&"Empfehlung"));
    assert!(texts.contains(&"Haftungsausschluss"));
}

#[test]
fn test_zero_codes_has_sentence_and_no_rows() {
    let t = translator();
    let ctx = context("en", Vec::new());
    let doc = layout::build(&ctx, &t.localizer("en")).unwrap();

    assert!(doc.diagnostic_rows().is_empty());
    assert!(doc.blocks.contains(&Block::Paragraph(
        "No diagnostic trouble codes were detected.".to_string()
    )));
}

#[test]
fn test_fingerprint_differs_by_language() {
    let t = translator();
    let ctx = context("en", vec![misfire()]);
    let en = layout::build(&ctx, &t.localizer("en")).unwrap();
    let de = layout::build(&ctx, &t.localizer("de")).unwrap();
    assert_ne!(en.fingerprint(), de.fingerprint());
}

// =============================================================================
// PDF Output
// =============================================================================

#[test]
fn test_render_report_with_images() {
    let dir = tempfile::tempdir().unwrap();
    let t = translator();

    let mut ctx = context("en", vec![misfire()]);
    ctx.vehicle.notes = Some("Customer reports rough idle.\nCheck engine light flashing.".to_string());
    ctx.images = vec![
        jpeg(dir.path(), "engine.jpg", 800, 600),
        jpeg(dir.path(), "dash.jpeg", 200, 150),
    ];

    let out = dir.path().join("report.pdf");
    let rendered = render(&ctx, &t.localizer("en"), &out).unwrap();

    let bytes = std::fs::read(&rendered.path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(rendered.pages >= 1);
    assert_eq!(rendered.fingerprint.len(), 64);
}

#[test]
fn test_many_codes_span_pages() {
    let dir = tempfile::tempdir().unwrap();
    let t = translator();
    let codes = (0..150).map(|_| misfire()).collect();
    let ctx = context("en", codes);

    let rendered = render(&ctx, &t.localizer("en"), &dir.path().join("long.pdf")).unwrap();
    assert!(rendered.pages > 1);
}

#[test]
fn test_long_notes_continue_on_next_page() {
    let dir = tempfile::tempdir().unwrap();
    let t = translator();
    let mut ctx = context("en", vec![misfire()]);
    ctx.vehicle.notes = Some((0..150).map(|i| format!("note line {}\n", i)).collect());

    let rendered = render(&ctx, &t.localizer("en"), &dir.path().join("notes.pdf")).unwrap();
    assert!(rendered.pages > 1);
}

#[test]
fn test_corrupt_image_aborts_render() {
    let dir = tempfile::tempdir().unwrap();
    let t = translator();
    let broken = dir.path().join("broken.jpg");
    std::fs::write(&broken, b"\xFF\xD8 not really a jpeg").unwrap();

    let mut ctx = context("en", vec![misfire()]);
    ctx.images = vec![jpeg(dir.path(), "ok.jpg", 50, 50), broken];

    let out = dir.path().join("report.pdf");
    let result = render(&ctx, &t.localizer("en"), &out);
    assert!(matches!(result, Err(RenderError::Image { .. })));
    assert!(!out.exists());
}

#[test]
fn test_identical_context_identical_layout() {
    let dir = tempfile::tempdir().unwrap();
    let t = translator();
    let ctx = context("en", vec![misfire()]);

    let a = render(&ctx, &t.localizer("en"), &dir.path().join("a.pdf")).unwrap();
    let b = render(&ctx, &t.localizer("en"), &dir.path().join("b.pdf")).unwrap();
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(a.pages, b.pages);
}
