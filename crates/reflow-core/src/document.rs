//! Target-side document model: paragraphs of styled runs, and tables.

use crate::element::TextElement;
use crate::style::Rgb;

/// Character formatting shared by every piece of a [`Run`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunStyle {
    pub font_family: String,
    /// Font size in points.
    pub font_size: f64,
    pub color: Rgb,
    pub bold: bool,
    pub italic: bool,
}

impl RunStyle {
    /// Style of a text element, taken verbatim.
    pub fn from_text(element: &TextElement) -> Self {
        Self {
            font_family: element.font_family.clone(),
            font_size: element.font_size,
            color: element.color,
            bold: element.bold,
            italic: element.italic,
        }
    }

    /// Whether `element` can extend a run with this style.
    ///
    /// Only family, size and colour take part; weight and slant follow the
    /// run's first glyph.
    pub fn matches_text(&self, element: &TextElement) -> bool {
        self.font_family == element.font_family
            && self.font_size == element.font_size
            && self.color == element.color
    }
}

/// An image placed inline in a paragraph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InlineImage {
    pub data: Vec<u8>,
    pub width_pt: f64,
    pub height_pt: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunContent {
    Text(String),
    Image(InlineImage),
}

/// A maximal span of content sharing one style.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Run {
    pub style: RunStyle,
    pub content: RunContent,
}

impl Run {
    pub fn text(style: RunStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            content: RunContent::Text(text.into()),
        }
    }

    pub fn image(image: InlineImage) -> Self {
        Self {
            style: RunStyle::default(),
            content: RunContent::Image(image),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            RunContent::Text(s) => Some(s),
            RunContent::Image(_) => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.content, RunContent::Image(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Paragraph {
    /// Left indentation in target units (twips for DOCX).
    pub indent_left: i64,
    /// Line spacing multiplier (1.0 = single).
    pub line_spacing: f64,
    pub runs: Vec<Run>,
    /// Source page the paragraph started on.
    pub page_index: usize,
}

impl Paragraph {
    pub fn new(indent_left: i64, line_spacing: f64, page_index: usize) -> Self {
        Self {
            indent_left,
            line_spacing,
            runs: Vec::new(),
            page_index,
        }
    }

    /// A paragraph holding one unstyled text run.
    pub fn plain(text: impl Into<String>, style: RunStyle) -> Self {
        let mut p = Self::new(0, 1.0, 0);
        p.runs.push(Run::text(style, text));
        p
    }

    /// Concatenated text of all text runs.
    pub fn text(&self) -> String {
        self.runs.iter().filter_map(Run::as_text).collect()
    }

    pub fn image_count(&self) -> usize {
        self.runs.iter().filter(|r| r.is_image()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// An ordered sequence of blocks forming a reconstructed document.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowDocument {
    pub blocks: Vec<Block>,
}

impl FlowDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            blocks: paragraphs.into_iter().map(Block::Paragraph).collect(),
        }
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    pub fn push_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    /// Flatten to plain lines: one per paragraph, one per table row with
    /// cells joined by `cell_separator`.
    pub fn plain_lines(&self, cell_separator: &str) -> Vec<String> {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Paragraph(p) => lines.push(p.text()),
                Block::Table(t) => lines.extend(t.rows.iter().map(|row| row.join(cell_separator))),
            }
        }
        lines
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(family: &str, size: f64, color: Rgb, bold: bool) -> TextElement {
        TextElement {
            page_index: 0,
            x: 0.0,
            y: 0.0,
            page_width: 612.0,
            page_height: 792.0,
            text: "x".to_string(),
            font_family: family.to_string(),
            font_size: size,
            color,
            bold,
            italic: false,
            left_margin: 0.0,
            line_spacing: None,
        }
    }

    #[test]
    fn style_match_ignores_weight() {
        let style = RunStyle::from_text(&element("Helvetica", 12.0, Rgb::BLACK, false));
        assert!(style.matches_text(&element("Helvetica", 12.0, Rgb::BLACK, true)));
        assert!(!style.matches_text(&element("Helvetica", 11.0, Rgb::BLACK, false)));
        assert!(!style.matches_text(&element("Times-Roman", 12.0, Rgb::BLACK, false)));
        assert!(!style.matches_text(&element("Helvetica", 12.0, Rgb::new(255, 0, 0), false)));
    }

    #[test]
    fn paragraph_text_skips_images() {
        let mut p = Paragraph::new(0, 1.5, 0);
        p.runs.push(Run::text(RunStyle::default(), "Hello "));
        p.runs.push(Run::image(InlineImage {
            data: vec![0],
            width_pt: 10.0,
            height_pt: 10.0,
        }));
        p.runs.push(Run::text(RunStyle::default(), "world"));
        assert_eq!(p.text(), "Hello world");
        assert_eq!(p.image_count(), 1);
    }

    #[test]
    fn plain_lines_flattens_tables() {
        let mut doc = FlowDocument::new();
        doc.push_paragraph(Paragraph::plain("title", RunStyle::default()));
        doc.push_table(Table {
            rows: vec![
                vec!["a".into(), "b".into()],
                vec!["c".into(), "d".into()],
            ],
        });
        assert_eq!(doc.plain_lines("\t"), vec!["title", "a\tb", "c\td"]);
        assert_eq!(doc.paragraphs().count(), 1);
    }
}
