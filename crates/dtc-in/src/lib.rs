//! DTC-IN: Scanner Output to Diagnostic Trouble Codes
//!
//! This crate turns the raw dump written by third-party scanner software
//! into an ordered list of [`RawCodeEntry`] values.
//!
//! Two input shapes are understood:
//! - CSV exports with a header row (code column located by name)
//! - Free text, scanned line by line
//!
//! A CSV file in which no row yields a code is re-read as free text, which
//! recovers exports with unexpected headers or misaligned columns.
//!
//! # Example
//!
//! ```
//! use dtc_in::{extract, SourceFormat};
//!
//! let entries = extract(b"Code,Status\nP0300,Pending\n", SourceFormat::Csv);
//! assert_eq!(entries[0].code, "P0300");
//! ```

pub mod csv_export;
pub mod patterns;
pub mod text;

use dtc_core::RawCodeEntry;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Format hint supplied by the caller, derived from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Text,
}

impl SourceFormat {
    /// `.csv` (any case) is CSV; every other extension is text
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SourceFormat::Csv,
            _ => SourceFormat::Text,
        }
    }
}

/// Errors that can occur while reading scanner output
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read scanner file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Extract codes from scanner output.
///
/// Never fails: undecodable bytes are dropped and input without codes
/// yields an empty list.
pub fn extract(content: &[u8], format: SourceFormat) -> Vec<RawCodeEntry> {
    let text = decode_lossy(content);

    let entries = match format {
        SourceFormat::Csv => {
            let entries = csv_export::extract_csv(&text);
            if entries.is_empty() {
                debug!("no codes in csv rows, re-reading as text");
                text::extract_text(&text)
            } else {
                entries
            }
        }
        SourceFormat::Text => text::extract_text(&text),
    };

    debug!("extracted {} code(s) from {:?} input", entries.len(), format);
    entries
}

/// Read a scanner file and extract codes, using its extension as the format hint
pub fn extract_file(path: &Path) -> Result<Vec<RawCodeEntry>, ExtractError> {
    let content = std::fs::read(path).map_err(|source| ExtractError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(extract(&content, SourceFormat::from_path(path)))
}

/// Decode UTF-8, skipping a leading BOM and dropping invalid byte sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut rest = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut out = String::with_capacity(rest.len());

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => rest = &after[len..],
                    None => return out,
                }
            }
        }
    }
}
