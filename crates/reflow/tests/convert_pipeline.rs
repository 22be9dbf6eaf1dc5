//! End-to-end conversions through [`Converter`].

mod common;

use std::fs::File;

use reflow::docx::read_docx_file;
use reflow::xlsx::read_workbook_file;
use reflow::reflow_core::Block;
use reflow::reflow_parse::{SourceDocument, locate_text};
use reflow::{ConvertOptions, Converter, JsonEntry, Stage, TargetFormat};
use zip::ZipArchive;

use common::{TEXT_AND_IMAGE, sample_pdf, write_fixture};

fn read_entries(path: &std::path::Path) -> Vec<JsonEntry> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn pdf_to_json_lists_reconciled_paragraphs() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "report.pdf", &sample_pdf(TEXT_AND_IMAGE));

    let out = Converter::default()
        .convert(&input, TargetFormat::Json, None)
        .unwrap();
    assert_eq!(out, dir.path().join("report.json"));

    let entries = read_entries(&out);
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[0],
        JsonEntry::Paragraph {
            content: "Hello".to_string(),
            indent_left: 72 * 20 - 1800,
            page_index: 0,
            images: 0,
        }
    );
    assert!(matches!(&entries[1], JsonEntry::Paragraph { content, .. } if content == "World"));
    assert!(matches!(
        &entries[2],
        JsonEntry::Paragraph { content, images: 1, indent_left: 200, .. } if content.is_empty()
    ));
}

#[test]
fn pdf_to_docx_embeds_text_and_image() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "report.pdf", &sample_pdf(TEXT_AND_IMAGE));
    let output = dir.path().join("nested.docx");

    let out = Converter::default()
        .convert(&input, TargetFormat::Docx, Some(&output))
        .unwrap();
    assert_eq!(out, output);

    let back = read_docx_file(&out).unwrap();
    assert_eq!(back.plain_lines("\t"), vec!["Hello", "World", ""]);

    let mut archive = ZipArchive::new(File::open(&out).unwrap()).unwrap();
    assert!(archive.by_name("word/media/image1.png").is_ok());
}

#[test]
fn pdf_to_pdf_reflows_the_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "in.pdf", &sample_pdf(TEXT_AND_IMAGE));
    let output = dir.path().join("out.pdf");

    Converter::new(ConvertOptions::default().with_margin(36.0))
        .convert(&input, TargetFormat::Pdf, Some(&output))
        .unwrap();

    let doc = SourceDocument::open_path(&output).unwrap();
    assert_eq!(doc.page_count(), 1);
    let glyphs = locate_text(&doc.page(0).unwrap()).unwrap();
    let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
    assert_eq!(text, "HelloWorld");
    assert_eq!(glyphs[0].x, 36.0);
    assert_eq!(glyphs[0].y, 792.0 - 36.0);
}

#[test]
fn long_text_paginates() {
    let dir = tempfile::tempdir().unwrap();
    let body: String = (0..120).map(|i| format!("line number {i}\n")).collect();
    let input = write_fixture(dir.path(), "long.txt", body.as_bytes());

    let out = Converter::default()
        .convert(&input, TargetFormat::Pdf, None)
        .unwrap();
    let doc = SourceDocument::open_path(&out).unwrap();
    // 648 points of usable height at 15 points per line fit 44 lines.
    assert_eq!(doc.page_count(), 3);
}

#[test]
fn csv_to_docx_is_one_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "parts.CSV", b"name,qty\nbolt,4\nnut,10\n");

    let out = Converter::default()
        .convert(&input, TargetFormat::Docx, None)
        .unwrap();
    let back = read_docx_file(&out).unwrap();
    assert_eq!(back.blocks.len(), 1);
    match &back.blocks[0] {
        Block::Table(t) => {
            assert_eq!(t.rows.len(), 3);
            assert_eq!(t.rows[2], vec!["nut".to_string(), "10".to_string()]);
        }
        other => panic!("expected a table, got {other:?}"),
    }
}

#[test]
fn docx_to_json_keeps_paragraphs_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_fixture(dir.path(), "t.tsv", b"a\tb\n");
    let docx = Converter::default()
        .convert(&csv, TargetFormat::Docx, None)
        .unwrap();

    let out = Converter::default()
        .convert(&docx, TargetFormat::Json, None)
        .unwrap();
    assert_eq!(
        read_entries(&out),
        vec![JsonEntry::Row {
            cells: vec!["a".to_string(), "b".to_string()]
        }]
    );
}

#[test]
fn spreadsheet_round_trips_through_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_fixture(dir.path(), "stock.csv", b"name,qty\nbolt,4\nnut,10\n");
    let xlsx = Converter::default()
        .convert(&csv, TargetFormat::Xlsx, None)
        .unwrap();
    assert_eq!(xlsx, dir.path().join("stock.xlsx"));

    let json = Converter::default()
        .convert(&xlsx, TargetFormat::Json, None)
        .unwrap();
    let rows: Vec<Vec<String>> = read_entries(&json)
        .into_iter()
        .map(|e| match e {
            JsonEntry::Row { cells } => cells,
            other => panic!("expected a row, got {other:?}"),
        })
        .collect();
    assert_eq!(rows, vec![vec!["name", "qty"], vec!["bolt", "4"], vec!["nut", "10"]]);

    let docx = Converter::default()
        .convert(&xlsx, TargetFormat::Docx, None)
        .unwrap();
    assert_eq!(
        read_docx_file(&docx).unwrap().plain_lines(","),
        vec!["name,qty", "bolt,4", "nut,10"]
    );

    let pdf = Converter::default()
        .convert(&xlsx, TargetFormat::Pdf, None)
        .unwrap();
    assert_eq!(SourceDocument::open_path(&pdf).unwrap().page_count(), 1);
}

#[test]
fn pdf_and_text_to_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_fixture(dir.path(), "report.pdf", &sample_pdf(TEXT_AND_IMAGE));
    let out = Converter::default()
        .convert(&pdf, TargetFormat::Xlsx, None)
        .unwrap();
    let rows = read_workbook_file(&out).unwrap();
    assert_eq!(rows, vec![vec!["Hello"], vec!["World"]]);

    let txt = write_fixture(dir.path(), "notes.txt", b"a, b\tc\n\nplain\n");
    let out = Converter::default()
        .convert(&txt, TargetFormat::Xlsx, None)
        .unwrap();
    let rows = read_workbook_file(&out).unwrap();
    assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["plain"]]);
}

#[test]
fn corrupt_spreadsheet_fails_at_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "broken.xlsx", b"not a workbook");
    let err = Converter::default()
        .convert(&input, TargetFormat::Json, None)
        .unwrap_err();
    assert_eq!(err.stage, Stage::Input);
    assert!(!dir.path().join("broken.json").exists());
}

#[test]
fn text_to_json_is_one_entry_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "notes.txt", b"first\n\nthird\n");
    let out = Converter::default()
        .convert(&input, TargetFormat::Json, None)
        .unwrap();
    let contents: Vec<String> = read_entries(&out)
        .into_iter()
        .map(|e| match e {
            JsonEntry::Line { content } => content,
            other => panic!("expected a line, got {other:?}"),
        })
        .collect();
    assert_eq!(contents, vec!["first", "", "third"]);
}

#[test]
fn missing_input_fails_before_output_exists() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.pdf");
    let err = Converter::default()
        .convert(&input, TargetFormat::Docx, None)
        .unwrap_err();
    assert_eq!(err.stage, Stage::Input);
    assert!(!dir.path().join("absent.docx").exists());
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "slides.pptx", b"PK");
    let err = Converter::default()
        .convert(&input, TargetFormat::Pdf, None)
        .unwrap_err();
    assert_eq!(err.stage, Stage::Input);
    assert!(err.to_string().contains("pptx"));
}

#[test]
fn corrupt_pdf_fails_at_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "broken.pdf", b"not a pdf at all");
    let err = Converter::default()
        .convert(&input, TargetFormat::Json, None)
        .unwrap_err();
    assert_eq!(err.stage, Stage::Input);
    assert!(!dir.path().join("broken.json").exists());
}

#[test]
fn impossible_margins_fail_before_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "a.txt", b"x");
    let err = Converter::new(ConvertOptions::default().with_margin(400.0))
        .convert(&input, TargetFormat::Pdf, None)
        .unwrap_err();
    assert_eq!(err.stage, Stage::Input);
    assert!(!dir.path().join("a.pdf").exists());
}
