//! Spreadsheet workbooks.
//!
//! [`read_workbook_rows`] reads every sheet's cells as text through
//! calamine (xlsx, xlsm, xlsb, xls and ods). [`write_xlsx`] writes rows to a
//! single-sheet `.xlsx` package of inline strings.

mod reader;
mod writer;

pub use reader::{read_workbook_file, read_workbook_rows};
pub use writer::{write_xlsx, write_xlsx_file};
