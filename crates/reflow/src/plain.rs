//! Plain-text sources: `.txt` lines and `.csv`/`.tsv` rows.

use std::path::Path;

use reflow_core::ReflowError;

pub fn read_lines(path: &Path) -> Result<Vec<String>, ReflowError> {
    let text = std::fs::read_to_string(path)?;
    Ok(split_lines(&text))
}

/// Read delimited rows. Cells are split on `delimiter` verbatim; quoting is
/// not interpreted.
pub fn read_rows(path: &Path, delimiter: char) -> Result<Vec<Vec<String>>, ReflowError> {
    let text = std::fs::read_to_string(path)?;
    Ok(split_rows(&text, delimiter))
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Cells of one text line, split on commas or tabs and trimmed.
pub fn line_cells(line: &str) -> Vec<String> {
    line.split([',', '\t']).map(|c| c.trim().to_string()).collect()
}

pub fn split_rows(text: &str, delimiter: char) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split(delimiter).map(str::to_string).collect())
        .collect()
}
