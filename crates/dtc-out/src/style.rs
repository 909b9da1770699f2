//! Page geometry, type sizes and text metrics for the report.
//!
//! All lengths are PostScript points (1/72 in). Text is set in the
//! Helvetica base fonts, so widths come from the standard Helvetica metrics.

/// US Letter
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

pub const MARGIN_TOP: f32 = 36.0;
pub const MARGIN_BOTTOM: f32 = 36.0;
pub const MARGIN_LEFT: f32 = 72.0;
pub const MARGIN_RIGHT: f32 = 72.0;

/// Usable width between the side margins (6.5 in)
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
pub const CONTENT_HEIGHT: f32 = PAGE_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

/// Widest an embedded image may be drawn
pub const MAX_IMAGE_WIDTH: f32 = 6.5 * 72.0;

pub const TITLE_SIZE: f32 = 18.0;
pub const HEADING_SIZE: f32 = 14.0;
pub const BODY_SIZE: f32 = 10.0;
pub const TABLE_SIZE: f32 = 9.0;
pub const DISCLAIMER_SIZE: f32 = 8.0;

/// Baseline-to-baseline distance as a multiple of the font size
pub const LEADING: f32 = 1.25;
pub const CELL_PADDING: f32 = 4.0;

/// Code, Status, Severity, Description, Recommendation
pub const DIAGNOSTIC_COLUMNS: [f32; 5] = [56.0, 56.0, 72.0, 142.0, 142.0];
/// Label, value
pub const VEHICLE_COLUMNS: [f32; 2] = [120.0, 348.0];

pub type Rgb = (f32, f32, f32);

pub const TEXT_COLOR: Rgb = (0.0, 0.0, 0.0);
pub const MUTED_COLOR: Rgb = (0.333, 0.333, 0.333);
pub const GRID_COLOR: Rgb = (0.5, 0.5, 0.5);
/// Diagnostics header row (#003366) with white text
pub const HEADER_FILL: Rgb = (0.0, 0.2, 0.4);
pub const HEADER_TEXT: Rgb = (1.0, 1.0, 1.0);
/// First row of the vehicle table (#f0f0f0)
pub const LIGHT_FILL: Rgb = (0.941, 0.941, 0.941);

/// Helvetica advance widths for U+0020..=U+007E, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Bold glyphs run wider; scaled rather than tabulated
const BOLD_FACTOR: f32 = 1.08;

/// Width of `text` in points
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7E => u32::from(HELVETICA_WIDTHS[(code - 0x20) as usize]),
            _ => 556,
        })
        .sum();
    let width = units as f32 * size / 1000.0;
    if bold {
        width * BOLD_FACTOR
    } else {
        width
    }
}

/// Break `text` into lines no wider than `max_width`.
///
/// `\n` forces a break. Words wider than a whole line are split by character.
pub fn wrap(text: &str, size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate, size, bold) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, size, bold) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width(&current, size, bold) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }

        lines.push(current);
    }

    lines
}

pub fn line_height(size: f32) -> f32 {
    size * LEADING
}
