//! The conversion pipeline: detect the source format, build the target, and
//! write it atomically next to its final path.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reflow_core::{
    Block, FlowDocument, FlowLayout, FlowRenderer, Paragraph, ReflowError, RunStyle, Table,
};
use reflow_parse::{SourceDocument, StandardFont, extract_elements};
use tracing::{debug, info, warn};

use crate::docx::{read_docx_file, write_docx_file};
use crate::error::{ConvertError, Stage, StageExt};
use crate::json::{JsonEntry, document_entries, line_entries, row_entries, write_json_file};
use crate::options::ConvertOptions;
use crate::pdf_writer::write_pdf_file;
use crate::plain::{line_cells, read_lines, read_rows};
use crate::xlsx::{read_workbook_file, write_xlsx_file};

/// Kind of input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Docx,
    Text,
    /// Rows of cells split on the given character.
    Delimited(char),
    /// A workbook; the rows of every sheet are read in order.
    Spreadsheet,
}

impl SourceFormat {
    /// Detect the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, ReflowError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(SourceFormat::Pdf),
            "docx" => Ok(SourceFormat::Docx),
            "txt" | "text" => Ok(SourceFormat::Text),
            "csv" => Ok(SourceFormat::Delimited(',')),
            "tsv" => Ok(SourceFormat::Delimited('\t')),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            "" => Err(ReflowError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(ReflowError::UnsupportedFormat(format!(
                "unsupported input extension .{other}"
            ))),
        }
    }
}

/// Kind of output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Docx,
    Pdf,
    Json,
    Xlsx,
}

impl TargetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Docx => "docx",
            TargetFormat::Pdf => "pdf",
            TargetFormat::Json => "json",
            TargetFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = ReflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "docx" => Ok(TargetFormat::Docx),
            "pdf" => Ok(TargetFormat::Pdf),
            "json" => Ok(TargetFormat::Json),
            "xlsx" => Ok(TargetFormat::Xlsx),
            other => Err(ReflowError::UnsupportedFormat(format!(
                "unsupported target format {other:?}"
            ))),
        }
    }
}

/// Content read from the input, before it is shaped for a target.
enum Loaded {
    Document(FlowDocument),
    Lines(Vec<String>),
    Rows(Vec<Vec<String>>),
}

/// What gets written to the output path.
enum Output {
    Docx(FlowDocument),
    Pdf(FlowLayout),
    Json(Vec<JsonEntry>),
    Xlsx(Vec<Vec<String>>),
}

/// Runs conversions with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `input` to `target`, returning the path written.
    ///
    /// Without an explicit `output`, the input path with the target's
    /// extension is used. The file appears only once it is complete.
    pub fn convert(
        &self,
        input: &Path,
        target: TargetFormat,
        output: Option<&Path>,
    ) -> Result<PathBuf, ConvertError> {
        let source = SourceFormat::from_path(input).at(Stage::Input)?;
        if !input.is_file() {
            return Err(ConvertError::new(
                Stage::Input,
                ReflowError::InvalidInput(format!("{} does not exist", input.display())),
            ));
        }
        let font = self.options.standard_font().at(Stage::Input)?;
        if target == TargetFormat::Pdf {
            self.options.flow_config().validate().at(Stage::Input)?;
        }
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension(target.extension()));
        if output == input {
            return Err(ConvertError::new(
                Stage::Input,
                ReflowError::InvalidInput(format!(
                    "output {} would overwrite the input",
                    output.display()
                )),
            ));
        }
        info!(input = %input.display(), ?source, %target, "converting");

        let loaded = self.load(input, source)?;
        let built = self.build(loaded, target, font)?;
        self.write(&built, &output, font)?;
        info!(output = %output.display(), "conversion finished");
        Ok(output)
    }

    fn load(&self, input: &Path, source: SourceFormat) -> Result<Loaded, ConvertError> {
        match source {
            SourceFormat::Pdf => {
                let doc = SourceDocument::open_path(input).at(Stage::Input)?;
                let elements =
                    extract_elements(&doc, self.options.page_origin_offset).at(Stage::Extraction)?;
                debug!(elements = elements.len(), pages = doc.page_count(), "extracted");
                let reconciled = self.options.reconciler().reconcile_document(elements);
                if reconciled.is_empty() {
                    warn!(input = %input.display(), "no text or images found");
                }
                Ok(Loaded::Document(reconciled))
            }
            SourceFormat::Docx => read_docx_file(input).at(Stage::Input).map(Loaded::Document),
            SourceFormat::Text => read_lines(input).at(Stage::Input).map(Loaded::Lines),
            SourceFormat::Delimited(delimiter) => {
                read_rows(input, delimiter).at(Stage::Input).map(Loaded::Rows)
            }
            SourceFormat::Spreadsheet => {
                read_workbook_file(input).at(Stage::Input).map(Loaded::Rows)
            }
        }
    }

    fn build(
        &self,
        loaded: Loaded,
        target: TargetFormat,
        font: StandardFont,
    ) -> Result<Output, ConvertError> {
        let separator = self.options.cell_separator.as_str();
        let renderer = FlowRenderer::new(self.options.flow_config(), font);
        let output = match (target, loaded) {
            (TargetFormat::Docx, Loaded::Document(doc)) => Output::Docx(doc),
            (TargetFormat::Docx, Loaded::Lines(lines)) => {
                let style = self.text_style();
                Output::Docx(FlowDocument::from_paragraphs(
                    lines
                        .into_iter()
                        .map(|line| Paragraph::plain(line, style.clone()))
                        .collect(),
                ))
            }
            (TargetFormat::Docx, Loaded::Rows(rows)) => {
                let mut doc = FlowDocument::new();
                doc.push_table(Table { rows });
                Output::Docx(doc)
            }
            (TargetFormat::Pdf, Loaded::Document(doc)) => {
                let lines = doc.plain_lines(separator);
                Output::Pdf(renderer.render_lines(&lines).at(Stage::Render)?)
            }
            (TargetFormat::Pdf, Loaded::Lines(lines)) => {
                Output::Pdf(renderer.render_lines(&lines).at(Stage::Render)?)
            }
            (TargetFormat::Pdf, Loaded::Rows(rows)) => {
                Output::Pdf(renderer.render_rows(&rows, separator).at(Stage::Render)?)
            }
            (TargetFormat::Json, Loaded::Document(doc)) => Output::Json(document_entries(&doc)),
            (TargetFormat::Json, Loaded::Lines(lines)) => Output::Json(line_entries(&lines)),
            (TargetFormat::Json, Loaded::Rows(rows)) => Output::Json(row_entries(&rows)),
            (TargetFormat::Xlsx, Loaded::Document(doc)) => Output::Xlsx(document_rows(&doc)),
            (TargetFormat::Xlsx, Loaded::Lines(lines)) => Output::Xlsx(
                lines
                    .iter()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| line_cells(line))
                    .collect(),
            ),
            (TargetFormat::Xlsx, Loaded::Rows(rows)) => Output::Xlsx(rows),
        };
        Ok(output)
    }

    fn text_style(&self) -> RunStyle {
        RunStyle {
            font_family: self.options.font.clone(),
            font_size: self.options.font_size,
            ..RunStyle::default()
        }
    }

    fn write(&self, built: &Output, output: &Path, font: StandardFont) -> Result<(), ConvertError> {
        let partial = partial_path(output);
        let result = match built {
            Output::Docx(doc) => write_docx_file(doc, &partial),
            Output::Pdf(layout) => {
                write_pdf_file(layout, &self.options.flow_config(), font, &partial)
            }
            Output::Json(entries) => write_json_file(entries, &partial),
            Output::Xlsx(rows) => write_xlsx_file(rows, &partial),
        }
        .and_then(|()| fs::rename(&partial, output).map_err(ReflowError::from));

        if let Err(err) = result {
            if partial.exists() {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    warn!(path = %partial.display(), error = %cleanup, "cannot remove partial output");
                }
            }
            return Err(ConvertError::new(Stage::Write, err));
        }
        Ok(())
    }
}

/// Sheet rows for a document: one single-cell row per paragraph with text,
/// and each table's rows in place.
fn document_rows(doc: &FlowDocument) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for block in &doc.blocks {
        match block {
            Block::Paragraph(p) => {
                let text = p.text();
                if !text.trim().is_empty() {
                    rows.push(vec![text]);
                }
            }
            Block::Table(t) => rows.extend(t.rows.iter().cloned()),
        }
    }
    rows
}

/// Hidden sibling of `output` that receives the bytes until they are complete.
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!(".{name}.partial"))
}
