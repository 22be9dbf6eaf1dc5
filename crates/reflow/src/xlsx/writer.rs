use std::fmt::Write as _;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use quick_xml::escape::escape;
use reflow_core::ReflowError;
use tracing::debug;
use zip::ZipWriter;

use crate::package::{entry_options, put, xml_safe, zip_error};

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Name of the only sheet written.
pub const SHEET_NAME: &str = "Sheet1";

/// Write `rows` as the single sheet of an `.xlsx` package into `out`.
///
/// Every non-empty cell is an inline string, so values come back exactly
/// as written.
pub fn write_xlsx<W: Write + Seek>(rows: &[Vec<String>], out: W) -> Result<W, ReflowError> {
    let options = entry_options();
    let mut zip = ZipWriter::new(out);
    put(&mut zip, "[Content_Types].xml", CONTENT_TYPES.as_bytes(), options)?;
    put(&mut zip, "_rels/.rels", PACKAGE_RELS.as_bytes(), options)?;
    put(&mut zip, "xl/workbook.xml", workbook_xml().as_bytes(), options)?;
    put(&mut zip, "xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes(), options)?;
    put(&mut zip, "xl/worksheets/sheet1.xml", sheet_xml(rows).as_bytes(), options)?;
    debug!(rows = rows.len(), "wrote XLSX package");
    zip.finish().map_err(zip_error)
}

/// Write `rows` to `path` as XLSX.
pub fn write_xlsx_file(rows: &[Vec<String>], path: &Path) -> Result<(), ReflowError> {
    let mut file = write_xlsx(rows, File::create(path)?)?;
    file.flush()?;
    Ok(())
}

fn workbook_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<workbook xmlns="{main}" xmlns:r="{r}"><sheets>"#,
            r#"<sheet name="{name}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
        ),
        main = NS_MAIN,
        r = NS_R,
        name = SHEET_NAME,
    )
}

fn sheet_xml(rows: &[Vec<String>]) -> String {
    let mut xml = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<worksheet xmlns="{}"><sheetData>"#
        ),
        NS_MAIN
    );
    for (r, row) in rows.iter().enumerate() {
        let row_number = r + 1;
        let _ = write!(xml, r#"<row r="{row_number}">"#);
        for (c, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let text = xml_safe(cell);
            let _ = write!(
                xml,
                r#"<c r="{}{row_number}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                column_name(c),
                escape(text.as_str())
            );
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Spreadsheet column letters for a 0-based index: A..Z, AA..
fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.iter().rev().map(|&b| char::from(b)).collect()
}
