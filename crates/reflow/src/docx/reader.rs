use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use reflow_core::{FlowDocument, Paragraph, ReflowError, RunStyle, Table};
use zip::ZipArchive;

/// Read body paragraphs and tables from a DOCX package.
///
/// Paragraph text is the concatenation of its `w:t` elements, with a
/// `w:tab` inside a run as a tab character (tab-stop definitions under
/// `w:tabs` are not text). Run formatting is not read back. Cells holding
/// several paragraphs are joined with a space.
pub fn read_docx_blocks<R: Read + Seek>(source: R) -> Result<FlowDocument, ReflowError> {
    let mut archive = ZipArchive::new(source)
        .map_err(|e| ReflowError::InvalidInput(format!("not a DOCX package: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ReflowError::InvalidInput(format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut xml)?;
    parse_document_xml(&xml)
}

pub fn read_docx_file(path: &Path) -> Result<FlowDocument, ReflowError> {
    read_docx_blocks(File::open(path)?)
}

#[derive(Default)]
struct BodyState {
    doc: FlowDocument,
    paragraph: Option<String>,
    in_text: bool,
    in_run: bool,
    in_tabs: bool,
    table_depth: usize,
    table: Table,
    row: Vec<String>,
    cell: Option<String>,
}

impl BodyState {
    fn push_str(&mut self, s: &str) {
        if self.in_text {
            if let Some(p) = self.paragraph.as_mut() {
                p.push_str(s);
            }
        }
    }

    fn end_paragraph(&mut self) {
        let Some(text) = self.paragraph.take() else {
            return;
        };
        match self.cell.as_mut() {
            Some(cell) => {
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(&text);
            }
            None if self.table_depth == 0 => self
                .doc
                .push_paragraph(Paragraph::plain(text, RunStyle::default())),
            None => {}
        }
    }
}

pub(crate) fn parse_document_xml(xml: &str) -> Result<FlowDocument, ReflowError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();
    let mut state = BodyState::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => state.paragraph = Some(String::new()),
                b"t" => state.in_text = true,
                b"r" => state.in_run = true,
                b"tabs" => state.in_tabs = true,
                b"tbl" => {
                    state.table_depth += 1;
                    if state.table_depth == 1 {
                        state.table = Table::default();
                    }
                }
                b"tr" if state.table_depth == 1 => state.row.clear(),
                b"tc" if state.table_depth == 1 => state.cell = Some(String::new()),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" if state.in_run && !state.in_tabs => {
                    if let Some(p) = state.paragraph.as_mut() {
                        p.push('\t');
                    }
                }
                b"p" => {
                    state.paragraph = Some(String::new());
                    state.end_paragraph();
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"p" => state.end_paragraph(),
                b"t" => state.in_text = false,
                b"r" => state.in_run = false,
                b"tabs" => state.in_tabs = false,
                b"tc" if state.table_depth == 1 => {
                    if let Some(cell) = state.cell.take() {
                        state.row.push(cell);
                    }
                }
                b"tr" if state.table_depth == 1 => {
                    let row = std::mem::take(&mut state.row);
                    state.table.rows.push(row);
                }
                b"tbl" => {
                    state.table_depth = state.table_depth.saturating_sub(1);
                    if state.table_depth == 0 {
                        let table = std::mem::take(&mut state.table);
                        state.doc.push_table(table);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| ReflowError::InvalidInput(format!("bad XML text: {err}")))?;
                state.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ReflowError::InvalidInput(format!(
                    "XML parse error at {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(state.doc)
}
