use crate::error::ApiError;
use crate::shopping_list::ShoppingListItem;
use printpdf::{Mm, PdfDocument};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const LINES_PER_PAGE: usize = 36;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TITLE: &str = "Shopping list";
const TITLE_SIZE: f32 = 20.0;
const LINE_SIZE: f32 = 14.0;
const FOOTER_SIZE: f32 = 10.0;
const LEFT_MARGIN_MM: f32 = 35.0;
const TITLE_Y_MM: f32 = 277.0;
const FIRST_LINE_Y_MM: f32 = 260.0;
const LINE_STEP_MM: f32 = 5.5;
const FOOTER_Y_MM: f32 = 12.0;

pub fn format_line(item: &ShoppingListItem) -> String {
    format!(
        "{} - {} {}",
        item.name, item.total_amount, item.measurement_unit
    )
}

pub fn page_count(line_count: usize) -> usize {
    if line_count == 0 {
        1
    } else {
        (line_count + LINES_PER_PAGE - 1) / LINES_PER_PAGE
    }
}

/// Renders the aggregated list to PDF bytes: a fixed title header and a
/// page-number footer on every page, one line per item, a page break
/// every `LINES_PER_PAGE` lines. A missing or unreadable font fails the
/// whole render; no bytes are produced.
pub fn render(items: &[ShoppingListItem], font_path: &Path) -> Result<Vec<u8>, ApiError> {
    let font_file = File::open(font_path).map_err(|e| {
        ApiError::ResourceUnavailable(format!("font {} unavailable: {}", font_path.display(), e))
    })?;

    let (doc, first_page, first_layer) = PdfDocument::new(
        TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_external_font(BufReader::new(font_file))
        .map_err(|e| {
            ApiError::ResourceUnavailable(format!(
                "font {} could not be loaded: {}",
                font_path.display(),
                e
            ))
        })?;

    let total_pages = page_count(items.len());
    for page_no in 0..total_pages {
        let layer = if page_no == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Page {} layer", page_no + 1),
            );
            doc.get_page(page).get_layer(layer)
        };

        layer.use_text(TITLE, TITLE_SIZE, Mm(LEFT_MARGIN_MM), Mm(TITLE_Y_MM), &font);

        let start = page_no * LINES_PER_PAGE;
        let end = (start + LINES_PER_PAGE).min(items.len());
        for (line_no, item) in items[start..end].iter().enumerate() {
            let y = FIRST_LINE_Y_MM - LINE_STEP_MM * line_no as f32;
            layer.use_text(format_line(item), LINE_SIZE, Mm(LEFT_MARGIN_MM), Mm(y), &font);
        }

        layer.use_text(
            format!("Page {}/{}", page_no + 1, total_pages),
            FOOTER_SIZE,
            Mm(PAGE_WIDTH_MM / 2.0),
            Mm(FOOTER_Y_MM),
            &font,
        );
    }

    doc.save_to_bytes()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("serializing shopping list pdf: {}", e)))
}
