//! ToUnicode CMap decoding.
//!
//! Only the `bfchar` and `bfrange` sections are read; everything else in the
//! CMap program (codespace ranges, CID mappings, PostScript boilerplate) is
//! skipped. The width of the first source code seen decides whether codes
//! are one or two bytes long.

use std::collections::HashMap;

use tracing::debug;

use crate::error::SourceError;

/// Most codes past its start that one `bfrange` entry may map: a whole
/// two-byte code space.
const MAX_RANGE_SPAN: u32 = 0xFFFF;

/// Character code to Unicode mapping from a `/ToUnicode` stream.
#[derive(Debug, Clone, Default)]
pub struct ToUnicode {
    map: HashMap<u32, String>,
    code_bytes: Option<usize>,
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Hex(&'a str),
    Open,
    Close,
}

impl ToUnicode {
    pub fn parse(data: &[u8]) -> Result<Self, SourceError> {
        let text = String::from_utf8_lossy(data);
        let mut cmap = ToUnicode::default();
        for body in sections(&text, "beginbfchar", "endbfchar") {
            cmap.read_bfchar(&tokens(body))?;
        }
        for body in sections(&text, "beginbfrange", "endbfrange") {
            cmap.read_bfrange(&tokens(body))?;
        }
        Ok(cmap)
    }

    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    /// Source code width in bytes, when any mapping was read.
    pub fn code_bytes(&self) -> Option<usize> {
        self.code_bytes
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn source_code(&mut self, hex: &str) -> Result<u32, SourceError> {
        self.code_bytes.get_or_insert(hex.len().div_ceil(2));
        hex_code(hex)
    }

    fn read_bfchar(&mut self, toks: &[Token<'_>]) -> Result<(), SourceError> {
        for pair in toks.chunks_exact(2) {
            if let [Token::Hex(src), Token::Hex(dst)] = pair {
                let code = self.source_code(src)?;
                self.map.insert(code, utf16_hex(dst)?);
            }
        }
        Ok(())
    }

    fn read_bfrange(&mut self, toks: &[Token<'_>]) -> Result<(), SourceError> {
        let mut i = 0;
        while i + 2 < toks.len() {
            let (Token::Hex(lo_hex), Token::Hex(hi_hex)) = (&toks[i], &toks[i + 1]) else {
                i += 1;
                continue;
            };
            let lo = self.source_code(lo_hex)?;
            let hi = range_end(lo, hex_code(hi_hex)?, lo_hex.len().div_ceil(2));
            match &toks[i + 2] {
                Token::Hex(dst) => {
                    // The last UTF-16 unit is incremented across the range.
                    let mut units = utf16_units(dst)?;
                    for code in lo..=hi {
                        if let Ok(s) = String::from_utf16(&units) {
                            self.map.insert(code, s);
                        }
                        if let Some(last) = units.last_mut() {
                            *last = last.wrapping_add(1);
                        }
                    }
                    i += 3;
                }
                Token::Open => {
                    let mut j = i + 3;
                    let mut code = Some(lo);
                    while let Some(Token::Hex(dst)) = toks.get(j) {
                        if let Some(c) = code.filter(|c| *c <= hi) {
                            self.map.insert(c, utf16_hex(dst)?);
                        }
                        code = code.and_then(|c| c.checked_add(1));
                        j += 1;
                    }
                    // Skip the closing bracket.
                    i = j + 1;
                }
                Token::Close => i += 3,
            }
        }
        Ok(())
    }
}

/// Last code of a range starting at `lo`, limited to the largest code of
/// `code_bytes` bytes and to [`MAX_RANGE_SPAN`] codes past `lo`.
fn range_end(lo: u32, hi: u32, code_bytes: usize) -> u32 {
    let width_max = match code_bytes {
        0 => 0,
        1..=3 => (1u32 << (8 * code_bytes)) - 1,
        _ => u32::MAX,
    };
    let end = hi.min(width_max).min(lo.saturating_add(MAX_RANGE_SPAN));
    if end < hi {
        debug!(lo, hi, end, "bfrange truncated to the code space");
    }
    end
}

/// Bodies between each `begin` keyword and its matching `end` keyword.
fn sections<'a>(text: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(begin) {
        let after = &rest[start + begin.len()..];
        let Some(stop) = after.find(end) else {
            break;
        };
        out.push(&after[..stop]);
        rest = &after[stop + end.len()..];
    }
    out
}

fn tokens(body: &str) -> Vec<Token<'_>> {
    let mut toks = Vec::new();
    let mut rest = body;
    while let Some(pos) = rest.find(['<', '[', ']']) {
        match rest.as_bytes()[pos] {
            b'[' => {
                toks.push(Token::Open);
                rest = &rest[pos + 1..];
            }
            b']' => {
                toks.push(Token::Close);
                rest = &rest[pos + 1..];
            }
            _ => {
                let inner = &rest[pos + 1..];
                let Some(close) = inner.find('>') else {
                    break;
                };
                toks.push(Token::Hex(inner[..close].trim()));
                rest = &inner[close + 1..];
            }
        }
    }
    toks
}

fn hex_code(hex: &str) -> Result<u32, SourceError> {
    u32::from_str_radix(hex, 16)
        .map_err(|e| SourceError::Parse(format!("bad CMap code <{hex}>: {e}")))
}

fn utf16_units(hex: &str) -> Result<Vec<u16>, SourceError> {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    // Two-digit destinations are single bytes; widen to one code unit.
    let digits = if digits.len() == 2 {
        format!("00{digits}")
    } else {
        digits
    };
    if digits.len() % 4 != 0 {
        return Err(SourceError::Parse(format!(
            "bad UTF-16BE destination <{hex}>"
        )));
    }
    (0..digits.len())
        .step_by(4)
        .map(|at| {
            u16::from_str_radix(&digits[at..at + 4], 16)
                .map_err(|e| SourceError::Parse(format!("bad UTF-16BE destination <{hex}>: {e}")))
        })
        .collect()
}

fn utf16_hex(hex: &str) -> Result<String, SourceError> {
    let units = utf16_units(hex)?;
    String::from_utf16(&units)
        .map_err(|e| SourceError::Parse(format!("invalid UTF-16 in CMap <{hex}>: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <00660069>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0030> <0032> [<0061> <0062> <0063>]
endbfrange
endcmap";

    #[test]
    fn reads_chars_and_ranges() {
        let cmap = ToUnicode::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(cmap.get(0x03), Some(" "));
        assert_eq!(cmap.get(0x11), Some("fi"));
        assert_eq!(cmap.get(0x24), Some("A"));
        assert_eq!(cmap.get(0x26), Some("C"));
        assert_eq!(cmap.get(0x31), Some("b"));
        assert_eq!(cmap.get(0x27), None);
        assert_eq!(cmap.len(), 8);
        assert_eq!(cmap.code_bytes(), Some(2));
    }

    #[test]
    fn single_byte_codes() {
        let cmap = ToUnicode::parse(b"1 beginbfchar <41> <0058> endbfchar").unwrap();
        assert_eq!(cmap.get(0x41), Some("X"));
        assert_eq!(cmap.code_bytes(), Some(1));
    }

    #[test]
    fn surrogate_pairs_decode() {
        let cmap = ToUnicode::parse(b"beginbfchar <01> <D83DDE00> endbfchar").unwrap();
        assert_eq!(cmap.get(1), Some("\u{1F600}"));
    }

    #[test]
    fn empty_program_has_no_mappings() {
        let cmap = ToUnicode::parse(b"begincmap endcmap").unwrap();
        assert!(cmap.is_empty());
        assert_eq!(cmap.code_bytes(), None);
    }

    #[test]
    fn oversized_range_is_capped() {
        let cmap = ToUnicode::parse(b"beginbfrange <0000> <FFFFFFFF> <0041> endbfrange").unwrap();
        assert_eq!(cmap.get(0), Some("A"));
        assert_eq!(cmap.get(1), Some("B"));
        assert_eq!(cmap.get(0x1_0000), None);
        assert!(cmap.len() <= 0x1_0000);

        let cmap = ToUnicode::parse(b"beginbfrange <10> <1FF> <0061> endbfrange").unwrap();
        assert_eq!(cmap.get(0xFF), Some("\u{0150}"));
        assert_eq!(cmap.get(0x100), None);
    }

    #[test]
    fn array_range_stops_at_last_code() {
        let cmap = ToUnicode::parse(
            b"beginbfrange <FFFFFFFE> <FFFFFFFF> [<0041> <0042> <0043>] endbfrange",
        )
        .unwrap();
        assert_eq!(cmap.get(0xFFFF_FFFE), Some("A"));
        assert_eq!(cmap.get(u32::MAX), Some("B"));
        assert_eq!(cmap.len(), 2);
    }

    #[test]
    fn malformed_code_is_an_error() {
        assert!(ToUnicode::parse(b"beginbfchar <zz> <0041> endbfchar").is_err());
    }
}
