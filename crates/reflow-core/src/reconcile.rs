//! Element reconciliation: positioned elements to paragraphs and runs.
//!
//! Elements from every page are sorted into reading order (page ascending,
//! then top of page first, then left to right) and walked once. A new
//! [`Paragraph`] opens whenever the vertical position moves by more than
//! [`ReconcileOptions::epsilon`] or the page changes. Inside a paragraph,
//! glyphs with the same family, size and colour extend the open text run;
//! anything else opens a new one. Images always get a run of their own and
//! move the paragraph's indentation to their x position.

use std::cmp::Ordering;

use crate::document::{FlowDocument, InlineImage, Paragraph, Run, RunContent, RunStyle};
use crate::element::{ImageElement, PageElement, TextElement};

/// Tunable constants of the reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ReconcileOptions {
    /// Maximum vertical drift (source units) still considered the same line.
    pub epsilon: f64,
    /// Source units to target units (points to twips = 20).
    pub unit_scale: f64,
    /// Subtracted from every scaled indentation to cancel the target's
    /// default page margin (1800 twips = 1.25in).
    pub base_offset: i64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            unit_scale: 20.0,
            base_offset: 1800,
        }
    }
}

/// Groups positioned elements into a paragraph sequence.
#[derive(Debug, Clone)]
pub struct Reconciler {
    options: ReconcileOptions,
    line_spacing: f64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(ReconcileOptions::default())
    }
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self {
            options,
            line_spacing: 1.5,
        }
    }

    /// Line spacing multiplier stamped on every produced paragraph.
    pub fn with_line_spacing(mut self, line_spacing: f64) -> Self {
        self.line_spacing = line_spacing;
        self
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Convert a source x coordinate into a target indentation.
    pub fn indent_for(&self, x: f64) -> i64 {
        (x * self.options.unit_scale).round() as i64 - self.options.base_offset
    }

    /// Reconcile elements into a document of paragraphs.
    pub fn reconcile_document(&self, elements: Vec<PageElement>) -> FlowDocument {
        FlowDocument::from_paragraphs(self.reconcile(elements))
    }

    /// Reconcile elements into paragraphs, consuming them.
    pub fn reconcile(&self, mut elements: Vec<PageElement>) -> Vec<Paragraph> {
        sort_reading_order(&mut elements);

        let mut walk = Walk {
            reconciler: self,
            paragraphs: Vec::new(),
            current_y: 0.0,
            current_page: 0,
            text_run_open: false,
        };
        for element in elements {
            walk.push(element);
        }
        walk.paragraphs
    }
}

/// Sort by page ascending, then y descending, then x ascending.
pub fn sort_reading_order(elements: &mut [PageElement]) {
    elements.sort_by(reading_order);
}

/// Reading-order comparison used by [`sort_reading_order`].
pub fn reading_order(a: &PageElement, b: &PageElement) -> Ordering {
    a.page_index()
        .cmp(&b.page_index())
        .then_with(|| b.y().total_cmp(&a.y()))
        .then_with(|| a.x().total_cmp(&b.x()))
}

/// Mutable state of one reconciliation pass.
struct Walk<'a> {
    reconciler: &'a Reconciler,
    paragraphs: Vec<Paragraph>,
    current_y: f64,
    current_page: usize,
    /// Whether the last run of the last paragraph is a text run that may
    /// still be extended.
    text_run_open: bool,
}

impl Walk<'_> {
    fn push(&mut self, element: PageElement) {
        let page = element.page_index();
        let y = element.y();
        if self.needs_new_paragraph(page, y) {
            let indent = self.reconciler.indent_for(element.x());
            self.paragraphs
                .push(Paragraph::new(indent, self.reconciler.line_spacing, page));
            self.text_run_open = false;
        }
        self.current_y = y;
        self.current_page = page;

        match element {
            PageElement::Text(text) => self.push_text(text),
            PageElement::Image(image) => self.push_image(image),
        }
    }

    fn needs_new_paragraph(&self, page: usize, y: f64) -> bool {
        self.paragraphs.is_empty()
            || page != self.current_page
            || (y - self.current_y).abs() > self.reconciler.options.epsilon
    }

    fn push_text(&mut self, text: TextElement) {
        let open = self.text_run_open;
        let Some(paragraph) = self.paragraphs.last_mut() else {
            return;
        };
        if open {
            if let Some(Run {
                style,
                content: RunContent::Text(buf),
            }) = paragraph.runs.last_mut()
            {
                if style.matches_text(&text) {
                    buf.push_str(&text.text);
                    return;
                }
            }
        }
        let style = RunStyle::from_text(&text);
        paragraph.runs.push(Run::text(style, text.text));
        self.text_run_open = true;
    }

    fn push_image(&mut self, image: ImageElement) {
        let indent = self.reconciler.indent_for(image.x);
        let Some(paragraph) = self.paragraphs.last_mut() else {
            return;
        };
        paragraph.indent_left = indent;
        paragraph.runs.push(Run::image(InlineImage {
            data: image.data,
            width_pt: image.width,
            height_pt: image.height,
        }));
        self.text_run_open = false;
    }
}
