//! Layout: ReportContext → ordered document blocks
//!
//! This is the whole data-to-document transformation. The PDF writer only
//! paginates what is produced here, so two identical contexts always
//! yield identical blocks (and the same [`ReportDocument::fingerprint`]).
//!
//! Sections, in order:
//! - Title and generation time
//! - Vehicle details (only when a field is filled in)
//! - Diagnostics table, or the "no codes" sentence
//! - Images (only when attached)
//! - Disclaimer

use crate::style::{self, CONTENT_HEIGHT, MAX_IMAGE_WIDTH};
use crate::RenderError;
use dtc_core::ReportContext;
use dtc_i18n::Localizer;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// One unit of report content
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    Title(String),
    Heading(String),
    Paragraph(String),
    /// Two-column label/value rows
    KeyValueTable(Vec<(String, String)>),
    /// Header row plus one row per code
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Drawn at `width` x `height` points
    Image {
        path: PathBuf,
        width: f32,
        height: f32,
    },
    Spacer(f32),
    Disclaimer {
        title: String,
        body: String,
    },
}

/// A laid-out report, ready for pagination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub language: String,
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    /// blake3 hex digest of the document content
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.title.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.language.as_bytes());
        for block in &self.blocks {
            hasher.update(b"\0");
            // Serializing plain strings and floats cannot fail
            let bytes = serde_json::to_vec(block).unwrap_or_default();
            hasher.update(&bytes);
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Rows of the diagnostics table (empty when no codes were found)
    pub fn diagnostic_rows(&self) -> &[Vec<String>] {
        self.blocks
            .iter()
            .find_map(|block| match block {
                Block::Table { rows, .. } => Some(rows.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// All text of the document in reading order, one entry per string
    pub fn texts(&self) -> Vec<&str> {
        let mut out = vec![self.title.as_str()];
        for block in &self.blocks {
            match block {
                Block::Title(text) | Block::Heading(text) | Block::Paragraph(text) => {
                    out.push(text)
                }
                Block::KeyValueTable(rows) => {
                    for (label, value) in rows {
                        out.push(label);
                        out.push(value);
                    }
                }
                Block::Table { header, rows } => {
                    out.extend(header.iter().map(String::as_str));
                    for row in rows {
                        out.extend(row.iter().map(String::as_str));
                    }
                }
                Block::Disclaimer { title, body } => {
                    out.push(title);
                    out.push(body);
                }
                Block::Image { .. } | Block::Spacer(_) => {}
            }
        }
        out
    }
}

/// Lay out a report in the localizer's language.
///
/// Fails only when an attached image cannot be read.
pub fn build(context: &ReportContext, localizer: &Localizer<'_>) -> Result<ReportDocument, RenderError> {
    let l = localizer;
    let mut blocks = Vec::new();

    let title = clean(&l.text("report.title", "Vehicle Diagnostic Report"));
    blocks.push(Block::Title(title.clone()));

    let timestamp = context.created_at.format(TIMESTAMP_FORMAT).to_string();
    blocks.push(Block::Paragraph(clean(&l.text_with(
        "report.generated_on",
        "Generated on {timestamp}",
        &[("timestamp", timestamp.as_str())],
    ))));
    blocks.push(Block::Spacer(12.0));

    let vehicle_rows = vehicle_rows(context, l);
    if !vehicle_rows.is_empty() {
        blocks.push(Block::Heading(clean(&l.text("report.vehicle.heading", "Vehicle"))));
        blocks.push(Block::KeyValueTable(vehicle_rows));
        blocks.push(Block::Spacer(12.0));
    }

    blocks.push(Block::Heading(clean(&l.text("report.diagnostics.heading", "Diagnostics"))));
    if context.codes.is_empty() {
        blocks.push(Block::Paragraph(clean(&l.text(
            "report.diagnostics.no_codes",
            "No diagnostic trouble codes were detected.",
        ))));
    } else {
        let header = [
            ("report.diagnostics.code", "Code"),
            ("report.diagnostics.status", "Status"),
            ("report.diagnostics.severity", "Severity"),
            ("report.diagnostics.description", "Description"),
            ("report.diagnostics.recommendation", "Recommendation"),
        ]
        .iter()
        .map(|(key, default)| clean(&l.text(key, default)))
        .collect();

        let rows = context
            .codes
            .iter()
            .map(|code| {
                vec![
                    clean(&code.code),
                    code.status.map(|s| s.as_str()).unwrap_or("-").to_string(),
                    clean(&code.severity_label),
                    clean(&code.description),
                    clean(&code.advice),
                ]
            })
            .collect();

        blocks.push(Block::Table { header, rows });
    }
    blocks.push(Block::Spacer(12.0));

    if !context.images.is_empty() {
        blocks.push(Block::Heading(clean(&l.text("report.images.heading", "Images"))));
        for path in &context.images {
            let (width, height) = image_size(path)?;
            blocks.push(Block::Image {
                path: path.clone(),
                width,
                height,
            });
            blocks.push(Block::Spacer(6.0));
        }
    }

    blocks.push(Block::Spacer(12.0));
    blocks.push(Block::Disclaimer {
        title: clean(&l.text("report.disclaimer.title", "Disclaimer")),
        body: clean(&l.text(
            "report.disclaimer.body",
            "This report is provided for informational purposes only. Seek assistance from a certified technician for any required repairs.",
        )),
    });

    debug!("laid out {} block(s) for report {}", blocks.len(), context.report_id);

    Ok(ReportDocument {
        title,
        language: l.language().to_string(),
        blocks,
    })
}

fn vehicle_rows(context: &ReportContext, l: &Localizer<'_>) -> Vec<(String, String)> {
    let fields = [
        ("report.vehicle.vin", "VIN", &context.vehicle.vin),
        ("report.vehicle.mileage", "Mileage", &context.vehicle.mileage),
        ("report.vehicle.notes", "Notes", &context.vehicle.notes),
    ];

    fields
        .iter()
        .filter_map(|(key, default, value)| {
            let value = value.as_deref().filter(|v| !v.trim().is_empty())?;
            Some((clean(&l.text(key, default)), clean(value)))
        })
        .collect()
}

/// Drawn size in points: one pixel per point, scaled down to the
/// maximum width and to the height of one page.
fn image_size(path: &Path) -> Result<(f32, f32), RenderError> {
    let (px_width, px_height) =
        image::image_dimensions(path).map_err(|source| RenderError::Image {
            path: path.display().to_string(),
            source,
        })?;

    let (width, height) = (px_width as f32, px_height as f32);
    let scale = (MAX_IMAGE_WIDTH / width)
        .min(CONTENT_HEIGHT / height)
        .min(1.0);
    Ok((width * scale, height * scale))
}

/// Make text safe for the base fonts.
///
/// Line endings become `\n`, tabs become spaces, other control characters
/// are dropped and characters outside WinAnsi become `?`.
pub fn clean(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() => None,
            c if is_winansi(c) => Some(c),
            _ => Some('?'),
        })
        .collect()
}

/// Characters the standard Type 1 fonts can show under WinAnsiEncoding
pub fn is_winansi(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7E | 0xA0..=0xFF)
        || matches!(
            c,
            '€' | '‚' | 'ƒ' | '„' | '…' | '†' | '‡' | 'ˆ' | '‰' | 'Š' | '‹' | 'Œ' | 'Ž'
                | '‘' | '’' | '“' | '”' | '•' | '–' | '—' | '˜' | '™' | 'š' | '›' | 'œ'
                | 'ž' | 'Ÿ'
        )
}

/// Lines of a cell or paragraph after wrapping to `width`
pub fn wrap_cell(text: &str, size: f32, bold: bool, width: f32) -> Vec<String> {
    style::wrap(text, size, bold, width - 2.0 * style::CELL_PADDING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dtc_core::{CodeStatus, InterpretedCode, Severity, VehicleInfo};
    use dtc_i18n::Translator;

    fn context(codes: Vec<InterpretedCode>) -> ReportContext {
        ReportContext {
            report_id: "abc123".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 59).unwrap(),
            language: "en".to_string(),
            vehicle: VehicleInfo::default(),
            codes,
            images: Vec::new(),
        }
    }

    fn code(code: &str, status: Option<CodeStatus>) -> InterpretedCode {
        InterpretedCode {
            code: code.to_string(),
            description: format!("{} description", code),
            severity: Severity::High,
            severity_label: "High".to_string(),
            advice: "Check it".to_string(),
            status,
            known: true,
        }
    }

    fn translator() -> Translator {
        // No catalogs: every string falls back to its built-in default
        Translator::new("/nonexistent/i18n", "en")
    }

    #[test]
    fn test_no_codes_sentence_instead_of_table() {
        let t = translator();
        let doc = build(&context(Vec::new()), &t.localizer("en")).unwrap();

        assert!(doc.diagnostic_rows().is_empty());
        assert!(!doc.blocks.iter().any(|b| matches!(b, Block::Table { .. })));
        assert!(doc
            .blocks
            .contains(&Block::Paragraph("No diagnostic trouble codes were detected.".to_string())));
    }

    #[test]
    fn test_rows_follow_code_order() {
        let t = translator();
        let codes = vec![
            code("P0420", Some(CodeStatus::Pending)),
            code("P0300", None),
            code("P0420", Some(CodeStatus::Pending)),
        ];
        let doc = build(&context(codes), &t.localizer("en")).unwrap();
        let rows = doc.diagnostic_rows();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["P0420", "pending", "High", "P0420 description", "Check it"]);
        assert_eq!(rows[1][0], "P0300");
        assert_eq!(rows[1][1], "-");
        assert_eq!(rows[2][0], "P0420");
    }

    #[test]
    fn test_generated_on_timestamp() {
        let t = translator();
        let doc = build(&context(Vec::new()), &t.localizer("en")).unwrap();
        assert_eq!(
            doc.blocks[1],
            Block::Paragraph("Generated on 2024-03-05 14:07 UTC".to_string())
        );
    }

    #[test]
    fn test_vehicle_block_only_when_present() {
        let t = translator();
        let doc = build(&context(Vec::new()), &t.localizer("en")).unwrap();
        assert!(!doc.blocks.iter().any(|b| matches!(b, Block::KeyValueTable(_))));

        let mut ctx = context(Vec::new());
        ctx.vehicle = VehicleInfo {
            vin: Some("1HGCM82633A004352".to_string()),
            mileage: Some("   ".to_string()),
            notes: Some("Rough idle\r\nCEL on".to_string()),
        };
        let doc = build(&ctx, &t.localizer("en")).unwrap();
        let rows = doc
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::KeyValueTable(rows) => Some(rows.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            rows,
            vec![
                ("VIN".to_string(), "1HGCM82633A004352".to_string()),
                ("Notes".to_string(), "Rough idle\nCEL on".to_string()),
            ]
        );
    }

    #[test]
    fn test_disclaimer_always_last() {
        let t = translator();
        let doc = build(&context(vec![code("P0300", None)]), &t.localizer("en")).unwrap();
        assert!(matches!(doc.blocks.last(), Some(Block::Disclaimer { .. })));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean("a\u{0007}b\tc"), "ab c");
        assert_eq!(clean("line1\r\nline2\rline3"), "line1\nline2\nline3");
        assert_eq!(clean("Prüfung – 5 €"), "Prüfung – 5 €");
        assert_eq!(clean("Łódź 日本"), "?ód? ??");
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let t = translator();
        let ctx = context(vec![code("P0300", Some(CodeStatus::Stored))]);
        let a = build(&ctx, &t.localizer("en")).unwrap();
        let b = build(&ctx, &t.localizer("en")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut other = ctx.clone();
        other.codes[0].status = None;
        let c = build(&other, &t.localizer("en")).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_image_scaled_to_max_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.jpg");
        image::RgbImage::new(936, 200).save(&path).unwrap();

        let t = translator();
        let mut ctx = context(Vec::new());
        ctx.images = vec![path.clone()];
        let doc = build(&ctx, &t.localizer("en")).unwrap();

        let image = doc
            .blocks
            .iter()
            .find(|b| matches!(b, Block::Image { .. }))
            .unwrap();
        assert_eq!(
            image,
            &Block::Image {
                path,
                width: 468.0,
                height: 100.0
            }
        );
    }

    #[test]
    fn test_small_image_keeps_native_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.jpg");
        image::RgbImage::new(120, 80).save(&path).unwrap();
        assert_eq!(image_size(&path).unwrap(), (120.0, 80.0));
    }

    #[test]
    fn test_unreadable_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not a jpeg").unwrap();

        let t = translator();
        let mut ctx = context(Vec::new());
        ctx.images = vec![path];
        assert!(matches!(
            build(&ctx, &t.localizer("en")),
            Err(RenderError::Image { .. })
        ));
    }
}
