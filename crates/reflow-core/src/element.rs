//! Positioned elements produced by the source locators.
//!
//! Coordinates are in source units (PDF points) with the origin at the
//! bottom-left of the page, so `y` grows upward. Text `y` is the glyph
//! baseline; image `y` is the translated origin of the image's unit square.

use crate::style::Rgb;

/// One rendered glyph (or a contiguous same-style run of glyphs).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextElement {
    /// 0-based page index.
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub page_width: f64,
    pub page_height: f64,
    pub text: String,
    pub font_family: String,
    pub font_size: f64,
    pub color: Rgb,
    pub bold: bool,
    pub italic: bool,
    /// Left edge of the page's crop box.
    pub left_margin: f64,
    /// Baseline delta to the previous glyph on the same page.
    ///
    /// `None` for the first glyph of a page.
    pub line_spacing: Option<f64>,
}

/// An embedded raster, re-encoded to PNG or kept as JPEG.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageElement {
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub page_width: f64,
    pub page_height: f64,
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Rendered width on the page, in points.
    pub width: f64,
    /// Rendered height on the page, in points.
    pub height: f64,
}

/// Either kind of positioned element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "lowercase")
)]
pub enum PageElement {
    Text(TextElement),
    Image(ImageElement),
}

impl PageElement {
    pub fn page_index(&self) -> usize {
        match self {
            PageElement::Text(t) => t.page_index,
            PageElement::Image(i) => i.page_index,
        }
    }

    pub fn x(&self) -> f64 {
        match self {
            PageElement::Text(t) => t.x,
            PageElement::Image(i) => i.x,
        }
    }

    pub fn y(&self) -> f64 {
        match self {
            PageElement::Text(t) => t.y,
            PageElement::Image(i) => i.y,
        }
    }

    pub fn page_width(&self) -> f64 {
        match self {
            PageElement::Text(t) => t.page_width,
            PageElement::Image(i) => i.page_width,
        }
    }

    pub fn page_height(&self) -> f64 {
        match self {
            PageElement::Text(t) => t.page_height,
            PageElement::Image(i) => i.page_height,
        }
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            PageElement::Text(t) => Some(t),
            PageElement::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageElement> {
        match self {
            PageElement::Image(i) => Some(i),
            PageElement::Text(_) => None,
        }
    }
}

impl From<TextElement> for PageElement {
    fn from(t: TextElement) -> Self {
        PageElement::Text(t)
    }
}

impl From<ImageElement> for PageElement {
    fn from(i: ImageElement) -> Self {
        PageElement::Image(i)
    }
}
