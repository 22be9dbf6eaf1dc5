//! Font loading for the text locator: widths, decoding and style.
//!
//! A [`LoadedFont`] is built once per font resource and answers two
//! questions for each shown string: which Unicode text each code maps to,
//! and how far each code advances the text matrix.

use std::collections::HashMap;

use lopdf::{Dictionary, Object};
use reflow_core::style;
use tracing::warn;

use crate::cmap::ToUnicode;
use crate::encoding::win_ansi_char;
use crate::source::{object_to_f64, resolve};
use crate::standard_fonts::StandardFont;

/// Width used when neither /Widths nor a standard table applies.
const DEFAULT_WIDTH: f64 = 600.0;

/// CID font default width when /DW is absent.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Glyph widths in 1/1000 text-space units.
#[derive(Debug, Clone, PartialEq)]
pub enum FontMetrics {
    /// /FirstChar + /Widths, with /MissingWidth outside the array.
    Explicit {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    Standard(StandardFont),
    /// Type0 descendant: /W entries over a /DW default.
    Cid {
        widths: HashMap<u32, f64>,
        default: f64,
    },
    Uniform(f64),
}

impl FontMetrics {
    pub fn width(&self, code: u32) -> f64 {
        match self {
            FontMetrics::Explicit {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            FontMetrics::Standard(font) => u8::try_from(code).map_or(0.0, |c| font.width(c)),
            FontMetrics::Cid { widths, default } => widths.get(&code).copied().unwrap_or(*default),
            FontMetrics::Uniform(w) => *w,
        }
    }
}

/// Glyph-space to text-space scale of the standard font matrix.
const STANDARD_FONT_SCALE: f64 = 0.001;

/// One code read from a shown string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    pub code: u32,
    pub text: String,
    /// Advance in 1/1000 text-space units.
    pub width: f64,
}

/// A font resource prepared for text extraction.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    pub base_font: String,
    pub bold: bool,
    pub italic: bool,
    metrics: FontMetrics,
    to_unicode: Option<ToUnicode>,
    two_byte: bool,
    /// Factor from metric units to 1/1000 text space. Only a Type3
    /// /FontMatrix makes it differ from 1.
    width_scale: f64,
}

impl LoadedFont {
    /// Read a font dictionary. Missing or malformed entries fall back to
    /// defaults rather than failing.
    pub fn load(doc: &lopdf::Document, dict: &Dictionary) -> Self {
        let base_font = name_entry(dict, b"BaseFont").unwrap_or_else(|| "Unknown".to_string());
        let subtype = name_entry(dict, b"Subtype").unwrap_or_default();
        let two_byte = subtype == "Type0";

        let descendant = if two_byte {
            dict.get(b"DescendantFonts")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|a| a.first())
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok())
        } else {
            None
        };

        let descriptor_source = descendant.unwrap_or(dict);
        let flags = descriptor_source
            .get(b"FontDescriptor")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"Flags").ok())
            .and_then(|o| o.as_i64().ok())
            .and_then(|f| u32::try_from(f).ok());
        let (bold, italic) = style::style_flags(&base_font, flags);

        let metrics = match descendant {
            Some(cid) => cid_metrics(doc, cid),
            None => simple_metrics(doc, dict, &base_font),
        };

        let width_scale = if subtype == "Type3" {
            type3_width_scale(doc, dict)
        } else {
            1.0
        };

        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
            .and_then(|stream| {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                match ToUnicode::parse(&data) {
                    Ok(cmap) => Some(cmap),
                    Err(e) => {
                        warn!(font = %base_font, "ignoring unreadable ToUnicode map: {e}");
                        None
                    }
                }
            });

        Self {
            base_font,
            bold,
            italic,
            metrics,
            to_unicode,
            two_byte,
            width_scale,
        }
    }

    /// A font with no dictionary behind it (unknown /Tf resource).
    pub fn fallback(name: &str) -> Self {
        let (bold, italic) = style::style_flags(name, None);
        Self {
            base_font: name.to_string(),
            bold,
            italic,
            metrics: StandardFont::from_name(name)
                .map_or(FontMetrics::Uniform(DEFAULT_WIDTH), FontMetrics::Standard),
            to_unicode: None,
            two_byte: false,
            width_scale: 1.0,
        }
    }

    /// Family name written to the target document.
    pub fn family(&self) -> String {
        style::font_family(&self.base_font)
    }

    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Split a shown string into codes and decode each one.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        let codes: Vec<u32> = if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        };
        codes
            .into_iter()
            .map(|code| DecodedGlyph {
                code,
                text: self.unicode(code),
                width: self.metrics.width(code) * self.width_scale,
            })
            .collect()
    }

    fn unicode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(code)) {
            return text.to_string();
        }
        match u8::try_from(code) {
            Ok(byte) if !self.two_byte => win_ansi_char(byte).to_string(),
            _ => '\u{FFFD}'.to_string(),
        }
    }

    /// Word spacing applies to the single-byte code 32 only.
    pub fn is_word_space(&self, code: u32) -> bool {
        !self.two_byte && code == 32
    }
}

fn name_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

fn number(doc: &lopdf::Document, obj: &Object) -> Option<f64> {
    object_to_f64(resolve(doc, obj)).ok()
}

fn simple_metrics(doc: &lopdf::Document, dict: &Dictionary, base_font: &str) -> FontMetrics {
    let widths: Option<Vec<f64>> = dict
        .get(b"Widths")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(|a| a.iter().map(|o| number(doc, o).unwrap_or(0.0)).collect());

    match widths {
        Some(widths) if !widths.is_empty() => {
            let first_char = dict
                .get(b"FirstChar")
                .ok()
                .and_then(|o| number(doc, o))
                .map_or(0, |v| v.max(0.0) as u32);
            let missing = dict
                .get(b"FontDescriptor")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get(b"MissingWidth").ok())
                .and_then(|o| number(doc, o))
                .unwrap_or(0.0);
            FontMetrics::Explicit {
                first_char,
                widths,
                missing,
            }
        }
        _ => StandardFont::from_name(base_font)
            .map_or(FontMetrics::Uniform(DEFAULT_WIDTH), FontMetrics::Standard),
    }
}

/// Type3 widths are in glyph space; the horizontal scale of /FontMatrix
/// maps them to text space.
fn type3_width_scale(doc: &lopdf::Document, dict: &Dictionary) -> f64 {
    let a = dict
        .get(b"FontMatrix")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|m| m.first())
        .and_then(|o| number(doc, o));
    match a {
        Some(a) if a.is_finite() && a != 0.0 => a / STANDARD_FONT_SCALE,
        _ => 1.0,
    }
}

fn cid_metrics(doc: &lopdf::Document, cid_font: &Dictionary) -> FontMetrics {
    let default = cid_font
        .get(b"DW")
        .ok()
        .and_then(|o| number(doc, o))
        .unwrap_or(DEFAULT_CID_WIDTH);
    let mut widths = HashMap::new();
    let entries = cid_font
        .get(b"W")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(Vec::as_slice)
        .unwrap_or_default();

    // Either `c [w1 w2 ...]` or `c_first c_last w`.
    let mut i = 0;
    while i < entries.len() {
        let Some(first) = number(doc, &entries[i]) else {
            break;
        };
        let first = first.max(0.0) as u32;
        match entries.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = number(doc, w) {
                        widths.insert(first + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    object_to_f64(last).ok(),
                    entries.get(i + 2).and_then(|o| number(doc, o)),
                ) else {
                    break;
                };
                for code in first..=(last.max(0.0) as u32) {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    FontMetrics::Cid { widths, default }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    #[test]
    fn explicit_widths_with_missing_fallback() {
        let m = FontMetrics::Explicit {
            first_char: 65,
            widths: vec![700.0, 710.0],
            missing: 250.0,
        };
        assert_eq!(m.width(65), 700.0);
        assert_eq!(m.width(66), 710.0);
        assert_eq!(m.width(67), 250.0);
        assert_eq!(m.width(10), 250.0);
    }

    #[test]
    fn standard_font_without_widths() {
        let doc = lopdf::Document::with_version("1.5");
        let dict = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        };
        let font = LoadedFont::load(&doc, &dict);
        assert_eq!(font.metrics(), &FontMetrics::Standard(StandardFont::HelveticaBold));
        assert!(font.bold);
        assert!(!font.italic);
        let glyphs = font.decode(b"A ");
        assert_eq!(glyphs[0].text, "A");
        assert_eq!(glyphs[0].width, 722.0);
        assert!(font.is_word_space(glyphs[1].code));
    }

    #[test]
    fn descriptor_flags_mark_italic() {
        let mut doc = lopdf::Document::with_version("1.5");
        let descriptor = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "Flags" => 64,
        });
        let dict = dictionary! {
            "Subtype" => "TrueType",
            "BaseFont" => "ABCDEF+Garamond",
            "FirstChar" => 32,
            "Widths" => vec![250.into()],
            "FontDescriptor" => descriptor,
        };
        let font = LoadedFont::load(&doc, &dict);
        assert!(font.italic);
        assert_eq!(font.family(), "Garamond");
        assert_eq!(font.metrics().width(32), 250.0);
    }

    #[test]
    fn type0_reads_two_byte_codes() {
        let mut doc = lopdf::Document::with_version("1.5");
        let cmap = doc.add_object(Stream::new(
            dictionary! {},
            b"beginbfchar <0024> <0041> endbfchar".to_vec(),
        ));
        let descendant = doc.add_object(dictionary! {
            "Subtype" => "CIDFontType2",
            "DW" => 500,
            "W" => vec![
                Object::Integer(36),
                Object::Array(vec![Object::Integer(700)]),
                Object::Integer(40),
                Object::Integer(42),
                Object::Integer(300),
            ],
        });
        let dict = dictionary! {
            "Subtype" => "Type0",
            "BaseFont" => "Noto",
            "DescendantFonts" => vec![descendant.into()],
            "ToUnicode" => cmap,
        };
        let font = LoadedFont::load(&doc, &dict);
        assert!(font.is_two_byte());
        let glyphs = font.decode(&[0x00, 0x24, 0x00, 0x30, 0x00, 0x29]);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0].text, "A");
        assert_eq!(glyphs[0].width, 700.0);
        assert_eq!(glyphs[1].text, "\u{FFFD}");
        assert_eq!(glyphs[1].width, 500.0);
        assert_eq!(glyphs[2].width, 300.0);
        assert!(!font.is_word_space(32));
    }

    #[test]
    fn type3_widths_follow_font_matrix() {
        let doc = lopdf::Document::with_version("1.5");
        let matrix = |a: f32| -> Vec<Object> {
            vec![Object::Real(a), 0.into(), 0.into(), Object::Real(a), 0.into(), 0.into()]
        };
        let dict = dictionary! {
            "Subtype" => "Type3",
            "FontMatrix" => matrix(0.01),
            "FirstChar" => 65,
            "Widths" => vec![50.into(), 80.into()],
        };
        let font = LoadedFont::load(&doc, &dict);
        let glyphs = font.decode(b"AB");
        assert!((glyphs[0].width - 500.0).abs() < 1e-3);
        assert!((glyphs[1].width - 800.0).abs() < 1e-3);

        // A simple font's widths are already in 1/1000 text space.
        let mut type1 = dict.clone();
        type1.set("Subtype", "Type1");
        assert_eq!(LoadedFont::load(&doc, &type1).decode(b"A")[0].width, 50.0);
    }

    #[test]
    fn win_ansi_without_to_unicode() {
        let font = LoadedFont::fallback("Times-Roman");
        let glyphs = font.decode(&[0x93, b'x', 0x94]);
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();
        assert_eq!(text, "\u{201C}x\u{201D}");
    }

    #[test]
    fn unknown_fallback_is_uniform() {
        let font = LoadedFont::fallback("F9");
        assert_eq!(font.metrics(), &FontMetrics::Uniform(600.0));
    }
}
