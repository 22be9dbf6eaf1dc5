//! reflow-parse: PDF source access and element locators.
//!
//! Wraps an [lopdf](https://crates.io/crates/lopdf) document as a
//! [`SourceDocument`] and extracts positioned elements from its pages:
//!
//! - [`transform_resolver`] walks a page's content stream with a save/restore
//!   transform stack and reports the transform in force when an image is painted.
//! - [`image_locator`] turns each image XObject into an [`ImageElement`]
//!   placed with the resolved transform.
//! - [`text_locator`] runs a text-state machine over the content stream and
//!   emits one [`TextElement`] per glyph.
//!
//! [`ImageElement`]: reflow_core::ImageElement
//! [`TextElement`]: reflow_core::TextElement

pub mod cmap;
pub mod encoding;
pub mod error;
pub mod font_metrics;
pub mod image_locator;
pub mod source;
pub mod standard_fonts;
pub mod text_locator;
pub mod text_state;
pub mod transform_resolver;

pub use error::SourceError;
pub use image_locator::locate_images;
pub use reflow_core;
pub use source::{PageBox, RawImage, SourceDocument, SourcePage};
pub use standard_fonts::StandardFont;
pub use text_locator::locate_text;
pub use transform_resolver::{InstructionDispatcher, TransformResolver, resolve_transform};

use reflow_core::PageElement;

/// Extract every text and image element from `doc`, page by page.
///
/// Unsupported images are skipped; any other failure aborts extraction.
pub fn extract_elements(
    doc: &SourceDocument,
    page_origin_offset: f64,
) -> Result<Vec<PageElement>, SourceError> {
    let mut elements = Vec::new();
    for index in 0..doc.page_count() {
        let page = doc.page(index)?;
        elements.extend(locate_text(&page)?.into_iter().map(PageElement::Text));
        elements.extend(
            locate_images(&page, page_origin_offset)?
                .into_iter()
                .map(PageElement::Image),
        );
    }
    tracing::debug!(count = elements.len(), "extracted page elements");
    Ok(elements)
}
