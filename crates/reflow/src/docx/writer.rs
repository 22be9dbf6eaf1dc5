use std::fmt::Write as _;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use image::ImageFormat;
use quick_xml::escape::escape;
use reflow_core::{Block, FlowDocument, InlineImage, Paragraph, ReflowError, Run, RunContent, RunStyle, Table};
use tracing::debug;
use zip::ZipWriter;

use super::{NS_R, NS_W};
use crate::package::{entry_options, put, xml_safe, zip_error};

/// English Metric Units per point.
pub const EMU_PER_POINT: f64 = 12700.0;

/// Twips per single line at multiplier 1.0.
const LINE_TWIPS: f64 = 240.0;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// US Letter with 1in top/bottom and 1.25in side margins.
const SECTION: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#;

struct Media {
    rel_id: String,
    file_name: String,
    data: Vec<u8>,
}

/// Builds `word/document.xml` and collects the media it references.
#[derive(Default)]
pub struct DocxWriter {
    body: String,
    media: Vec<Media>,
}

impl DocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialise `doc` as a DOCX package into `out`.
    pub fn write<W: Write + Seek>(doc: &FlowDocument, out: W) -> Result<W, ReflowError> {
        let mut writer = Self::new();
        for block in &doc.blocks {
            match block {
                Block::Paragraph(p) => writer.paragraph(p)?,
                Block::Table(t) => writer.table(t),
            }
        }
        writer.finish(out)
    }

    fn paragraph(&mut self, p: &Paragraph) -> Result<(), ReflowError> {
        let line = (LINE_TWIPS * p.line_spacing).round() as i64;
        let _ = write!(
            self.body,
            r#"<w:p><w:pPr><w:spacing w:before="0" w:after="0" w:line="{line}" w:lineRule="auto"/><w:ind w:left="{}"/></w:pPr>"#,
            p.indent_left
        );
        for run in &p.runs {
            self.run(run)?;
        }
        self.body.push_str("</w:p>");
        Ok(())
    }

    fn run(&mut self, run: &Run) -> Result<(), ReflowError> {
        match &run.content {
            RunContent::Text(text) => {
                self.body.push_str("<w:r>");
                push_run_properties(&mut self.body, &run.style);
                push_text(&mut self.body, text);
                self.body.push_str("</w:r>");
            }
            RunContent::Image(image) => self.image(image)?,
        }
        Ok(())
    }

    fn image(&mut self, image: &InlineImage) -> Result<(), ReflowError> {
        let extension = match image::guess_format(&image.data) {
            Ok(ImageFormat::Png) => "png",
            Ok(ImageFormat::Jpeg) => "jpeg",
            _ => {
                return Err(ReflowError::UnsupportedFormat(
                    "inline image is neither PNG nor JPEG".to_string(),
                ));
            }
        };
        image::load_from_memory(&image.data).map_err(|e| {
            ReflowError::InvalidInput(format!("inline image cannot be decoded: {e}"))
        })?;

        let n = self.media.len() + 1;
        let rel_id = format!("rIdImg{n}");
        let file_name = format!("image{n}.{extension}");
        let cx = (image.width_pt * EMU_PER_POINT).round().max(1.0) as i64;
        let cy = (image.height_pt * EMU_PER_POINT).round().max(1.0) as i64;
        let _ = write!(
            self.body,
            concat!(
                r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Picture {n}"/>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{n}" name="{file}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
            ),
            cx = cx,
            cy = cy,
            n = n,
            file = file_name,
            rel = rel_id,
        );
        self.media.push(Media {
            rel_id,
            file_name,
            data: image.data.clone(),
        });
        Ok(())
    }

    fn table(&mut self, table: &Table) {
        self.body.push_str(concat!(
            r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:tblBorders>"#,
            r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
            r#"<w:left w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
            r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
            r#"<w:right w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
            r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
            r#"<w:insideV w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#,
            r#"</w:tblBorders></w:tblPr>"#
        ));
        for row in &table.rows {
            self.body.push_str("<w:tr>");
            for cell in row {
                self.body
                    .push_str(r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/></w:tcPr><w:p><w:r>"#);
                push_text(&mut self.body, cell);
                self.body.push_str("</w:r></w:p></w:tc>");
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
    }

    fn document_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<w:document xmlns:w="{w}" xmlns:r="{r}" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "<w:body>{body}{section}</w:body></w:document>"
            ),
            w = NS_W,
            r = NS_R,
            body = self.body,
            section = SECTION,
        )
    }

    fn document_rels(&self) -> String {
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
        ));
        for m in &self.media {
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{NS_R}/image" Target="media/{}"/>"#,
                m.rel_id, m.file_name
            );
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn finish<W: Write + Seek>(self, out: W) -> Result<W, ReflowError> {
        let options = entry_options();
        let mut zip = ZipWriter::new(out);
        put(&mut zip, "[Content_Types].xml", CONTENT_TYPES.as_bytes(), options)?;
        put(&mut zip, "_rels/.rels", PACKAGE_RELS.as_bytes(), options)?;
        put(&mut zip, "word/document.xml", self.document_xml().as_bytes(), options)?;
        put(
            &mut zip,
            "word/_rels/document.xml.rels",
            self.document_rels().as_bytes(),
            options,
        )?;
        for m in &self.media {
            put(&mut zip, &format!("word/media/{}", m.file_name), &m.data, options)?;
        }
        debug!(media = self.media.len(), "wrote DOCX package");
        zip.finish().map_err(zip_error)
    }
}

/// Write `doc` to `path` as DOCX.
pub fn write_docx_file(doc: &FlowDocument, path: &Path) -> Result<(), ReflowError> {
    let file = File::create(path)?;
    let mut file = DocxWriter::write(doc, file)?;
    file.flush()?;
    Ok(())
}

fn push_run_properties(xml: &mut String, style: &RunStyle) {
    xml.push_str("<w:rPr>");
    if !style.font_family.is_empty() {
        let font = escape(style.font_family.as_str());
        let _ = write!(
            xml,
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
        );
    }
    if style.bold {
        xml.push_str("<w:b/>");
    }
    if style.italic {
        xml.push_str("<w:i/>");
    }
    let _ = write!(xml, r#"<w:color w:val="{}"/>"#, style.color.to_hex());
    if style.font_size > 0.0 {
        let half_points = (style.font_size * 2.0).round() as i64;
        let _ = write!(xml, r#"<w:sz w:val="{half_points}"/><w:szCs w:val="{half_points}"/>"#);
    }
    xml.push_str("</w:rPr>");
}

fn push_text(xml: &mut String, text: &str) {
    let clean = xml_safe(text);
    let _ = write!(xml, r#"<w:t xml:space="preserve">{}</w:t>"#, escape(clean.as_str()));
}
