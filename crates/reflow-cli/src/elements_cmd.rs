use std::io::{self, BufWriter, Write};
use std::path::Path;

use reflow::reflow_core::{ImageElement, TextElement};
use reflow::reflow_parse::{SourceDocument, locate_images, locate_text};

use crate::page_range::parse_page_range;

pub fn run(file: &Path, pages: Option<&str>, offset: f64) -> Result<(), i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }
    let doc = SourceDocument::open_path(file).map_err(|e| {
        eprintln!("Error: failed to open PDF: {e}");
        1
    })?;
    let page_indices = match pages {
        Some(range) => parse_page_range(range, doc.page_count()).map_err(|e| {
            eprintln!("Error: {e}");
            1
        })?,
        None => (0..doc.page_count()).collect(),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for idx in page_indices {
        let page = doc.page(idx).map_err(|e| {
            eprintln!("Error reading page {}: {e}", idx + 1);
            1
        })?;
        let texts = locate_text(&page).map_err(|e| {
            eprintln!("Error extracting text from page {}: {e}", idx + 1);
            1
        })?;
        let images = locate_images(&page, offset).map_err(|e| {
            eprintln!("Error extracting images from page {}: {e}", idx + 1);
            1
        })?;

        let lines = texts
            .iter()
            .map(text_to_json)
            .chain(images.iter().map(image_to_json));
        for value in lines {
            writeln!(out, "{value}").map_err(|e| {
                eprintln!("Error: {e}");
                1
            })?;
        }
    }
    out.flush().map_err(|e| {
        eprintln!("Error: {e}");
        1
    })
}

fn text_to_json(t: &TextElement) -> serde_json::Value {
    serde_json::json!({
        "kind": "text",
        "page": t.page_index + 1,
        "text": t.text,
        "x": t.x,
        "y": t.y,
        "font_family": t.font_family,
        "font_size": t.font_size,
        "color": [t.color.r, t.color.g, t.color.b],
        "bold": t.bold,
        "italic": t.italic,
        "line_spacing": t.line_spacing,
    })
}

fn image_to_json(i: &ImageElement) -> serde_json::Value {
    serde_json::json!({
        "kind": "image",
        "page": i.page_index + 1,
        "x": i.x,
        "y": i.y,
        "width": i.width,
        "height": i.height,
        "bytes": i.data.len(),
    })
}
