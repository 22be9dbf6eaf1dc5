//! reflow-core: Backend-independent data types and layout algorithms.
//!
//! This crate provides the positioned element model ([`TextElement`],
//! [`ImageElement`]), the target-side document model ([`Paragraph`], [`Run`],
//! [`FlowDocument`]) and the two layout algorithms that connect them: the
//! [`Reconciler`] that groups positioned elements into paragraphs and runs,
//! and the [`FlowRenderer`] that paginates plain lines with font metrics.
//! It has no PDF library dependency; source access lives in `reflow-parse`.

pub mod document;
pub mod element;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod reconcile;
pub mod style;

pub use document::{
    Block, FlowDocument, InlineImage, Paragraph, Run, RunContent, RunStyle, Table,
};
pub use element::{ImageElement, PageElement, TextElement};
pub use error::ReflowError;
pub use flow::{FlowConfig, FlowCursor, FlowLayout, FlowRenderer, GlyphMetrics, PlacedGlyph};
pub use geometry::{Point, Transform};
pub use reconcile::{ReconcileOptions, Reconciler};
pub use style::Rgb;
