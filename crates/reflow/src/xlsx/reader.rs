use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use reflow_core::ReflowError;
use tracing::{debug, warn};

/// Rows of every sheet in workbook order, each cell rendered as text.
///
/// Trailing empty cells are dropped and rows without any text are skipped.
pub fn read_workbook_rows<RS>(source: RS) -> Result<Vec<Vec<String>>, ReflowError>
where
    RS: Read + Seek + Clone,
{
    let mut workbook = open_workbook_auto_from_rs(source)
        .map_err(|e| ReflowError::InvalidInput(format!("not a spreadsheet: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(ReflowError::InvalidInput("workbook has no sheets".to_string()));
    }

    let mut rows = Vec::new();
    for name in &sheet_names {
        match workbook.worksheet_range(name) {
            Ok(range) => {
                let before = rows.len();
                rows.extend(sheet_rows(&range));
                debug!(sheet = %name, rows = rows.len() - before, "read sheet");
            }
            Err(e) => warn!(sheet = %name, "skipping unreadable sheet: {e}"),
        }
    }
    Ok(rows)
}

pub fn read_workbook_file(path: &Path) -> Result<Vec<Vec<String>>, ReflowError> {
    let bytes = std::fs::read(path)?;
    read_workbook_rows(Cursor::new(bytes))
}

fn sheet_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    range
        .rows()
        .filter_map(|row| {
            let mut cells: Vec<String> = row.iter().map(cell_text).collect();
            while cells.last().is_some_and(String::is_empty) {
                cells.pop();
            }
            (!cells.is_empty()).then_some(cells)
        })
        .collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Whole numbers print without a fraction.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::Error(e) => format!("#ERR:{e:?}"),
    }
}
