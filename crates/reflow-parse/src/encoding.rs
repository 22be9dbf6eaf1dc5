//! WinAnsiEncoding for simple fonts without a ToUnicode map.

/// 0x80..=0x9F in WinAnsi differs from Latin-1; undefined slots are `None`.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Decode one WinAnsi byte.
pub fn win_ansi_char(code: u8) -> char {
    match code {
        0x80..=0x9F => WIN_ANSI_HIGH[usize::from(code - 0x80)].unwrap_or('\u{FFFD}'),
        _ => char::from(code),
    }
}

/// Encode a character as a WinAnsi byte, if representable.
pub fn win_ansi_byte(ch: char) -> Option<u8> {
    match u32::from(ch) {
        c @ (0x00..=0x7F | 0xA0..=0xFF) => u8::try_from(c).ok(),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|slot| *slot == Some(ch))
            .and_then(|i| u8::try_from(0x80 + i).ok()),
    }
}
