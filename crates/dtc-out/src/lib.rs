//! DTC-OUT: Interpreted Codes to a Localized PDF Report
//!
//! Rendering happens in two stages:
//! - [`layout::build`] turns a [`ReportContext`] into ordered [`layout::Block`]s
//!   with every label resolved in the report language
//! - [`pdf::PdfWriter`] paginates those blocks onto US Letter pages
//!
//! The PDF is assembled in memory and written with a single file handle, so
//! a failed render (for example an unreadable image) leaves nothing behind.
//!
//! # Example
//!
//! ```ignore
//! use dtc_out::render;
//!
//! let translator = dtc_i18n::global();
//! let rendered = render(&context, &translator.localizer(&context.language), &out_path)?;
//! println!("{} ({} pages)", rendered.path.display(), rendered.pages);
//! ```

pub mod layout;
pub mod pdf;
pub mod style;

use dtc_core::ReportContext;
use dtc_i18n::Localizer;
use layout::ReportDocument;
use pdf::{PdfOutput, PdfWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors that can occur during rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Image unreadable {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("PDF generation failed: {0}")]
    Pdf(String),
    #[error("Failed to write report {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a successful render
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub path: PathBuf,
    pub pages: usize,
    /// Fingerprint of the laid-out content
    pub fingerprint: String,
}

/// Lay out and produce the PDF bytes without touching the filesystem
pub fn render_to_bytes(
    context: &ReportContext,
    localizer: &Localizer<'_>,
) -> Result<(ReportDocument, PdfOutput), RenderError> {
    let document = layout::build(context, localizer)?;
    let output = PdfWriter::new(&document.title)?.write(&document)?;
    Ok((document, output))
}

/// Render `context` to a PDF at `output`, creating the parent directory
pub fn render(
    context: &ReportContext,
    localizer: &Localizer<'_>,
    output: &Path,
) -> Result<RenderedReport, RenderError> {
    let (document, pdf) = render_to_bytes(context, localizer)?;

    let write_error = |source| RenderError::Write {
        path: output.display().to_string(),
        source,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    std::fs::write(output, &pdf.bytes).map_err(write_error)?;

    info!(
        "rendered report {} to {} ({} page(s))",
        context.report_id,
        output.display(),
        pdf.pages
    );

    Ok(RenderedReport {
        path: output.to_path_buf(),
        pages: pdf.pages,
        fingerprint: document.fingerprint(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dtc_core::VehicleInfo;
    use dtc_i18n::Translator;

    fn empty_context() -> ReportContext {
        ReportContext {
            report_id: "r1".to_string(),
            created_at: Utc::now(),
            language: "en".to_string(),
            vehicle: VehicleInfo::default(),
            codes: Vec::new(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_render_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports").join("r1.pdf");
        let translator = Translator::new("/nonexistent", "en");

        let rendered = render(&empty_context(), &translator.localizer("en"), &out).unwrap();
        assert_eq!(rendered.path, out);
        assert_eq!(rendered.pages, 1);
        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_failed_render_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("r1.pdf");
        let translator = Translator::new("/nonexistent", "en");

        let mut context = empty_context();
        context.images = vec![dir.path().join("missing.jpg")];

        let err = render(&context, &translator.localizer("en"), &out).unwrap_err();
        assert!(matches!(err, RenderError::Image { .. }));
        assert!(!out.exists());
    }
}
