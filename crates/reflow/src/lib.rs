//! reflow: Convert between positioned PDF content and flowing documents.
//!
//! This is the public API facade crate. It re-exports types from reflow-core
//! and uses reflow-parse to read PDF sources.
//!
//! # Architecture
//!
//! - **reflow-core**: Element and document models, reconciliation and flow layout
//! - **reflow-parse**: PDF source access, transform resolution and element locators
//! - **reflow** (this crate): Target writers, plain and spreadsheet sources and the [`Converter`]
//!
//! ```ignore
//! let converter = Converter::new(ConvertOptions::default());
//! let written = converter.convert(Path::new("report.pdf"), TargetFormat::Docx, None)?;
//! ```

pub mod convert;
pub mod docx;
pub mod error;
pub mod json;
pub mod options;
mod package;
pub mod pdf_writer;
pub mod plain;
pub mod xlsx;

pub use convert::{Converter, SourceFormat, TargetFormat};
pub use error::{ConvertError, Stage};
pub use json::JsonEntry;
pub use options::ConvertOptions;
pub use reflow_core;
pub use reflow_parse;
