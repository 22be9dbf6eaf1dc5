//! JSON output: a flat array of paragraph, line and row entries.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use reflow_core::{Block, FlowDocument, ReflowError};
use serde::{Deserialize, Serialize};

/// One output entry, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JsonEntry {
    Paragraph {
        content: String,
        #[serde(default)]
        indent_left: i64,
        #[serde(default)]
        page_index: usize,
        #[serde(default)]
        images: usize,
    },
    Line {
        content: String,
    },
    Row {
        cells: Vec<String>,
    },
}

/// Entries for a reconstructed document: paragraphs, then each table's rows
/// in place.
pub fn document_entries(doc: &FlowDocument) -> Vec<JsonEntry> {
    let mut entries = Vec::new();
    for block in &doc.blocks {
        match block {
            Block::Paragraph(p) => entries.push(JsonEntry::Paragraph {
                content: p.text(),
                indent_left: p.indent_left,
                page_index: p.page_index,
                images: p.image_count(),
            }),
            Block::Table(t) => entries.extend(
                t.rows
                    .iter()
                    .map(|cells| JsonEntry::Row { cells: cells.clone() }),
            ),
        }
    }
    entries
}

pub fn line_entries(lines: &[String]) -> Vec<JsonEntry> {
    lines
        .iter()
        .map(|content| JsonEntry::Line {
            content: content.clone(),
        })
        .collect()
}

pub fn row_entries(rows: &[Vec<String>]) -> Vec<JsonEntry> {
    rows.iter()
        .map(|cells| JsonEntry::Row { cells: cells.clone() })
        .collect()
}

pub fn write_json_file(entries: &[JsonEntry], path: &Path) -> Result<(), ReflowError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, entries)
        .map_err(|e| ReflowError::Other(format!("JSON serialisation failed: {e}")))?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflow_core::{Paragraph, RunStyle, Table};

    #[test]
    fn entries_are_tagged_by_kind() {
        let json = serde_json::to_value(line_entries(&["a".to_string()])).unwrap();
        assert_eq!(json, serde_json::json!([{"kind": "line", "content": "a"}]));

        let json = serde_json::to_value(row_entries(&[vec!["x".into(), "y".into()]])).unwrap();
        assert_eq!(json, serde_json::json!([{"kind": "row", "cells": ["x", "y"]}]));
    }

    #[test]
    fn document_tables_expand_to_rows() {
        let mut doc = FlowDocument::from_paragraphs(vec![Paragraph::plain("intro", RunStyle::default())]);
        doc.push_table(Table {
            rows: vec![vec!["1".into()], vec!["2".into()]],
        });
        let entries = document_entries(&doc);
        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[0], JsonEntry::Paragraph { content, .. } if content == "intro"));
        assert_eq!(entries[2], JsonEntry::Row { cells: vec!["2".into()] });
    }

    #[test]
    fn written_file_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let entries = line_entries(&["one".into(), "two".into()]);
        write_json_file(&entries, &path).unwrap();
        let back: Vec<JsonEntry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, entries);
    }
}
