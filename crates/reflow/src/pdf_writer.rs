//! Paginated PDF output for a [`FlowLayout`].
//!
//! Each layout page becomes one PDF page using a single standard Type1 font
//! in WinAnsiEncoding. Every visible glyph is drawn by its own text object.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use reflow_core::{FlowConfig, FlowLayout, ReflowError};
use reflow_parse::StandardFont;
use reflow_parse::encoding::win_ansi_byte;
use tracing::debug;

/// Build a PDF document for `layout`.
pub fn layout_to_pdf(
    layout: &FlowLayout,
    config: &FlowConfig,
    font: StandardFont,
) -> Result<Document, ReflowError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(font.name().as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(layout.page_count);
    for page in 0..layout.page_count {
        let content = page_content(layout, page, config.font_size);
        let encoded = content
            .encode()
            .map_err(|e| ReflowError::Other(format!("content stream encoding failed: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(config.page_width as f32),
                Object::Real(config.page_height as f32),
            ],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::from(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => layout.page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    debug!(pages = layout.page_count, glyphs = layout.glyphs.len(), "built PDF");
    Ok(doc)
}

fn page_content(layout: &FlowLayout, page: usize, font_size: f64) -> Content {
    let mut operations = Vec::new();
    for glyph in layout.page_glyphs(page).filter(|g| !g.ch.is_whitespace()) {
        let byte = win_ansi_byte(glyph.ch).unwrap_or(b'?');
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Real(font_size as f32)]),
            Operation::new(
                "Td",
                vec![Object::Real(glyph.x as f32), Object::Real(glyph.y as f32)],
            ),
            Operation::new("Tj", vec![Object::String(vec![byte], StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }
    Content { operations }
}

/// Write `layout` to `path` as PDF.
pub fn write_pdf_file(
    layout: &FlowLayout,
    config: &FlowConfig,
    font: StandardFont,
    path: &Path,
) -> Result<(), ReflowError> {
    let mut doc = layout_to_pdf(layout, config, font)?;
    doc.save(path)
        .map_err(|e| ReflowError::Other(format!("cannot write {}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflow_core::FlowRenderer;
    use reflow_parse::{SourceDocument, locate_text};

    fn config() -> FlowConfig {
        FlowConfig {
            page_width: 300.0,
            page_height: 200.0,
            margin_top: 20.0,
            margin_bottom: 20.0,
            margin_left: 20.0,
            margin_right: 20.0,
            font_size: 10.0,
            line_spacing: 2.0,
        }
    }

    fn to_bytes(mut doc: Document) -> Vec<u8> {
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn one_pdf_page_per_layout_page() {
        let lines: Vec<String> = (0..30).map(|i| format!("line {i}")).collect();
        let renderer = FlowRenderer::new(config(), StandardFont::Helvetica);
        let layout = renderer.render_lines(&lines).unwrap();
        assert!(layout.page_count > 1);

        let doc = layout_to_pdf(&layout, &config(), StandardFont::Helvetica).unwrap();
        assert_eq!(doc.get_pages().len(), layout.page_count);
    }

    #[test]
    fn written_text_is_extractable_at_layout_positions() {
        let renderer = FlowRenderer::new(config(), StandardFont::Courier);
        let layout = renderer.render_lines(&["Hi there"]).unwrap();
        let doc = layout_to_pdf(&layout, &config(), StandardFont::Courier).unwrap();

        let source = SourceDocument::open(&to_bytes(doc)).unwrap();
        let glyphs = locate_text(&source.page(0).unwrap()).unwrap();
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "Hithere");
        assert_eq!(glyphs[0].font_family, "Courier");
        assert_eq!(glyphs[0].x, 20.0);
        assert_eq!(glyphs[0].y, 180.0);
    }

    #[test]
    fn unencodable_characters_become_question_marks() {
        let renderer = FlowRenderer::new(config(), StandardFont::Helvetica);
        let layout = renderer.render_lines(&["é中"]).unwrap();
        let doc = layout_to_pdf(&layout, &config(), StandardFont::Helvetica).unwrap();

        let source = SourceDocument::open(&to_bytes(doc)).unwrap();
        let glyphs = locate_text(&source.page(0).unwrap()).unwrap();
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "é?");
    }
}
