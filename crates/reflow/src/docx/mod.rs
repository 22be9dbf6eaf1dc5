//! Word-processing (DOCX) packages.
//!
//! [`DocxWriter`] serialises a [`FlowDocument`] as a minimal Office Open XML
//! package; [`read_docx_blocks`] reads paragraph text and tables back.
//!
//! [`FlowDocument`]: reflow_core::FlowDocument

mod reader;
mod writer;

pub use reader::{read_docx_blocks, read_docx_file};
pub use writer::{DocxWriter, EMU_PER_POINT, write_docx_file};

pub(crate) const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
