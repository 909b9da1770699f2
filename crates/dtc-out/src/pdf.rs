//! PDF writer: paginates a [`ReportDocument`] onto US Letter pages.
//!
//! The whole file is produced in memory; nothing touches the output path
//! until every page and image is in place.

use crate::layout::{wrap_cell, Block, ReportDocument};
use crate::style::{
    self, CELL_PADDING, CONTENT_HEIGHT, CONTENT_WIDTH, DIAGNOSTIC_COLUMNS, DISCLAIMER_SIZE,
    GRID_COLOR, HEADER_FILL, HEADER_TEXT, HEADING_SIZE, LIGHT_FILL, MARGIN_LEFT, MARGIN_TOP,
    MUTED_COLOR, PAGE_HEIGHT, PAGE_WIDTH, TABLE_SIZE, TEXT_COLOR, TITLE_SIZE, VEHICLE_COLUMNS,
    BODY_SIZE,
};
use crate::RenderError;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Polygon, Pt,
};
use std::path::Path;
use tracing::debug;

/// Bytes of a finished PDF
#[derive(Debug, Clone)]
pub struct PdfOutput {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// Drawing state: the current page and the distance already used from its top
pub struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Points consumed below the top margin on the current page
    cursor: f32,
    pages: usize,
}

/// Font and colors of one table row
#[derive(Debug, Clone, Copy)]
struct RowStyle {
    size: f32,
    bold: bool,
    background: Option<style::Rgb>,
    text: style::Rgb,
}

impl RowStyle {
    fn body() -> Self {
        RowStyle {
            size: TABLE_SIZE,
            bold: false,
            background: None,
            text: TEXT_COLOR,
        }
    }
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn color((r, g, b): style::Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

fn pdf_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf(err.to_string())
}

impl PdfWriter {
    pub fn new(title: &str) -> Result<Self, RenderError> {
        let (doc, page, layer) =
            PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Page 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(PdfWriter {
            doc,
            layer,
            regular,
            bold,
            cursor: 0.0,
            pages: 1,
        })
    }

    /// Lay every block out and serialize the document
    pub fn write(mut self, document: &ReportDocument) -> Result<PdfOutput, RenderError> {
        for block in &document.blocks {
            self.block(block)?;
        }

        let pages = self.pages;
        let bytes = self.doc.save_to_bytes().map_err(pdf_error)?;
        debug!("wrote {} page(s), {} bytes", pages, bytes.len());
        Ok(PdfOutput { bytes, pages })
    }

    fn block(&mut self, block: &Block) -> Result<(), RenderError> {
        match block {
            Block::Title(text) => self.paragraph(text, TITLE_SIZE, true, TEXT_COLOR, 6.0),
            Block::Heading(text) => self.paragraph(text, HEADING_SIZE, true, TEXT_COLOR, 6.0),
            Block::Paragraph(text) => self.paragraph(text, BODY_SIZE, false, TEXT_COLOR, 12.0),
            Block::KeyValueTable(rows) => {
                for (index, (label, value)) in rows.iter().enumerate() {
                    let row_style = RowStyle {
                        size: BODY_SIZE,
                        bold: false,
                        background: (index == 0).then_some(LIGHT_FILL),
                        text: TEXT_COLOR,
                    };
                    self.row(&[label.as_str(), value.as_str()], &VEHICLE_COLUMNS, row_style, None);
                }
            }
            Block::Table { header, rows } => {
                let header: Vec<&str> = header.iter().map(String::as_str).collect();
                self.header_row(&header);
                for row in rows {
                    let cells: Vec<&str> = row.iter().map(String::as_str).collect();
                    self.row(&cells, &DIAGNOSTIC_COLUMNS, RowStyle::body(), Some(&header));
                }
            }
            Block::Image { path, width, height } => self.image(path, *width, *height)?,
            Block::Spacer(height) => {
                self.cursor = (self.cursor + height).min(CONTENT_HEIGHT);
            }
            Block::Disclaimer { title, body } => {
                self.paragraph(title, HEADING_SIZE, true, TEXT_COLOR, 6.0);
                self.paragraph(body, DISCLAIMER_SIZE, false, MUTED_COLOR, 0.0);
            }
        }
        Ok(())
    }

    fn needs_page(&self, height: f32) -> bool {
        self.cursor > 0.0 && self.cursor + height > CONTENT_HEIGHT
    }

    fn new_page(&mut self) {
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            mm(PAGE_WIDTH),
            mm(PAGE_HEIGHT),
            format!("Page {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = 0.0;
    }

    /// Page y coordinate (from the bottom) of a point `offset` below the cursor
    fn y(&self, offset: f32) -> f32 {
        PAGE_HEIGHT - MARGIN_TOP - self.cursor - offset
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    fn text(&self, text: &str, size: f32, bold: bool, x: f32, baseline: f32, fill: style::Rgb) {
        if text.is_empty() {
            return;
        }
        self.layer.set_fill_color(color(fill));
        self.layer
            .use_text(text, size, mm(x), mm(baseline), self.font(bold));
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool, fill: style::Rgb, space_after: f32) {
        let leading = style::line_height(size);
        for line in style::wrap(text, size, bold, CONTENT_WIDTH) {
            if self.needs_page(leading) {
                self.new_page();
            }
            let baseline = self.y(size);
            self.text(&line, size, bold, MARGIN_LEFT, baseline, fill);
            self.cursor += leading;
        }
        self.cursor += space_after;
    }

    fn row_height(&self, cells: &[&str], widths: &[f32], size: f32, bold: bool) -> f32 {
        let lines = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| wrap_cell(cell, size, bold, *width).len())
            .max()
            .unwrap_or(1);
        lines as f32 * style::line_height(size) + 2.0 * CELL_PADDING
    }

    fn header_row(&mut self, cells: &[&str]) {
        let height = self.row_height(cells, &DIAGNOSTIC_COLUMNS, TABLE_SIZE, true);
        if self.needs_page(height) {
            self.new_page();
        }
        let row_style = RowStyle {
            size: TABLE_SIZE,
            bold: true,
            background: Some(HEADER_FILL),
            text: HEADER_TEXT,
        };
        self.row(cells, &DIAGNOSTIC_COLUMNS, row_style, None);
    }

    /// Wrapped lines of a row that still fit below the cursor
    fn lines_fitting(&self, leading: f32) -> usize {
        ((CONTENT_HEIGHT - self.cursor - 2.0 * CELL_PADDING) / leading)
            .floor()
            .max(0.0) as usize
    }

    /// Page break inside a table; `header` is repeated on the new page
    fn break_page(&mut self, header: Option<&[&str]>) {
        self.new_page();
        if let Some(header) = header {
            self.header_row(header);
        }
    }

    /// One table row at the cursor. Cells are top-aligned and wrapped.
    ///
    /// A row that does not fit moves to the next page; a row taller than a
    /// page is split into page-sized parts.
    fn row(&mut self, cells: &[&str], widths: &[f32], row_style: RowStyle, header: Option<&[&str]>) {
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| wrap_cell(cell, row_style.size, row_style.bold, *width))
            .collect();
        let total_lines = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let leading = style::line_height(row_style.size);
        let page_lines = ((CONTENT_HEIGHT - 2.0 * CELL_PADDING) / leading).floor().max(1.0) as usize;

        let mut start = 0;
        loop {
            let remaining = total_lines - start;
            let fits = self.lines_fitting(leading);
            // Only the first part may move; continuations fill what is left
            let moves = start == 0 && self.cursor > 0.0 && fits < remaining;
            if moves && (remaining <= page_lines || fits == 0) {
                self.break_page(header);
            }

            let take = remaining.min(self.lines_fitting(leading).max(1));
            self.row_part(&wrapped, widths, &row_style, start, take);
            start += take;
            if start >= total_lines {
                break;
            }
            self.break_page(header);
        }
    }

    /// Draw lines `start..start + count` of every cell as one framed band
    fn row_part(&mut self, wrapped: &[Vec<String>], widths: &[f32], row_style: &RowStyle, start: usize, count: usize) {
        let leading = style::line_height(row_style.size);
        let height = count as f32 * leading + 2.0 * CELL_PADDING;
        let top = self.y(0.0);
        let bottom = top - height;
        let total: f32 = widths.iter().sum();

        if let Some(fill) = row_style.background {
            self.fill_rect(MARGIN_LEFT, bottom, total, height, fill);
        }

        let mut x = MARGIN_LEFT;
        for (lines, width) in wrapped.iter().zip(widths) {
            for (index, line) in lines.iter().skip(start).take(count).enumerate() {
                let baseline = top - CELL_PADDING - row_style.size - index as f32 * leading;
                self.text(line, row_style.size, row_style.bold, x + CELL_PADDING, baseline, row_style.text);
            }
            self.stroke_rect(x, bottom, *width, height);
            x += width;
        }

        self.cursor += height;
    }

    fn image(&mut self, path: &Path, width: f32, height: f32) -> Result<(), RenderError> {
        let decoded = image::open(path).map_err(|source| RenderError::Image {
            path: path.display().to_string(),
            source,
        })?;
        let rgb = decoded.to_rgb8();
        let (px_width, px_height) = (rgb.width() as f32, rgb.height() as f32);
        let rgb = image::DynamicImage::ImageRgb8(rgb);

        if self.needs_page(height) {
            self.new_page();
        }

        // At 72 dpi one pixel is one point
        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(mm(MARGIN_LEFT)),
                translate_y: Some(mm(self.y(height))),
                scale_x: Some(width / px_width),
                scale_y: Some(height / px_height),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
        self.cursor += height;
        Ok(())
    }

    fn corners(x: f32, y: f32, width: f32, height: f32) -> Vec<(Point, bool)> {
        vec![
            (Point::new(mm(x), mm(y)), false),
            (Point::new(mm(x + width), mm(y)), false),
            (Point::new(mm(x + width), mm(y + height)), false),
            (Point::new(mm(x), mm(y + height)), false),
        ]
    }

    fn fill_rect(&self, x: f32, y: f32, width: f32, height: f32, fill: style::Rgb) {
        self.layer.set_fill_color(color(fill));
        self.layer.add_polygon(Polygon {
            rings: vec![Self::corners(x, y, width, height)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn stroke_rect(&self, x: f32, y: f32, width: f32, height: f32) {
        self.layer.set_outline_color(color(GRID_COLOR));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: Self::corners(x, y, width, height),
            is_closed: true,
        });
    }
}
