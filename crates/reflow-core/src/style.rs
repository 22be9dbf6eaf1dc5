//! Text style values and font-name heuristics.
//!
//! Weight and slant are inferred from the font name ("bold"; "italic" or
//! "oblique", case-insensitive). This is an approximation: a font named
//! `Foo-Black` is heavy but not reported as bold. When the source exposes
//! descriptor flags, [`style_flags`] ORs them in; otherwise the name is all
//! there is.

/// FontDescriptor /Flags bit for italic faces (bit 7, 1-based).
pub const FLAG_ITALIC: u32 = 1 << 6;

/// FontDescriptor /Flags bit for forced bold (bit 19, 1-based).
pub const FLAG_FORCE_BOLD: u32 = 1 << 18;

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour from a DeviceGray component in `0.0..=1.0`.
    pub fn from_gray(gray: f64) -> Self {
        let v = unit_to_byte(gray);
        Self::new(v, v, v)
    }

    /// Colour from DeviceRGB components in `0.0..=1.0`.
    pub fn from_rgb_components(r: f64, g: f64, b: f64) -> Self {
        Self::new(unit_to_byte(r), unit_to_byte(g), unit_to_byte(b))
    }

    /// Colour from DeviceCMYK components using the naive complement formula.
    pub fn from_cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::from_rgb_components(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        )
    }

    /// Colour from a component list, inferring the space from its length.
    ///
    /// 1 = gray, 3 = RGB, 4 = CMYK. Any other length yields `None`.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match *components {
            [g] => Some(Self::from_gray(g)),
            [r, g, b] => Some(Self::from_rgb_components(r, g, b)),
            [c, m, y, k] => Some(Self::from_cmyk(c, m, y, k)),
            _ => None,
        }
    }

    /// Upper-case hex without a leading `#`, e.g. `"FF8000"`.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Parse a six-digit hex colour (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

fn unit_to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Strip a subset tag such as `ABCDEF+` from an embedded font name.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    }
}

/// Target font family for a source font name.
pub fn font_family(name: &str) -> String {
    strip_subset_prefix(name).to_string()
}

pub fn is_bold(name: &str) -> bool {
    name.to_ascii_lowercase().contains("bold")
}

pub fn is_italic(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("italic") || lower.contains("oblique")
}

/// Resolve `(bold, italic)` from the font name and optional descriptor flags.
pub fn style_flags(name: &str, flags: Option<u32>) -> (bool, bool) {
    let flags = flags.unwrap_or(0);
    (
        is_bold(name) || flags & FLAG_FORCE_BOLD != 0,
        is_italic(name) || flags & FLAG_ITALIC != 0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_uppercase_and_padded() {
        assert_eq!(Rgb::new(255, 128, 0).to_hex(), "FF8000");
        assert_eq!(Rgb::new(1, 2, 3).to_hex(), "010203");
        assert_eq!(Rgb::default().to_hex(), "000000");
    }

    #[test]
    fn hex_parse() {
        assert_eq!(Rgb::from_hex("#FF8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(Rgb::from_hex("0a0B0c"), Some(Rgb::new(10, 11, 12)));
        assert_eq!(Rgb::from_hex("auto"), None);
        assert_eq!(Rgb::from_hex("GG0000"), None);
    }

    #[test]
    fn components_by_length() {
        assert_eq!(Rgb::from_components(&[1.0]), Some(Rgb::new(255, 255, 255)));
        assert_eq!(
            Rgb::from_components(&[1.0, 0.0, 0.0]),
            Some(Rgb::new(255, 0, 0))
        );
        assert_eq!(
            Rgb::from_components(&[0.0, 0.0, 0.0, 1.0]),
            Some(Rgb::BLACK)
        );
        assert_eq!(Rgb::from_components(&[0.5, 0.5]), None);
    }

    #[test]
    fn gray_out_of_range_is_clamped() {
        assert_eq!(Rgb::from_gray(1.7), Rgb::new(255, 255, 255));
        assert_eq!(Rgb::from_gray(-0.2), Rgb::BLACK);
    }

    #[test]
    fn subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Arial-BoldMT"), "Arial-BoldMT");
        assert_eq!(strip_subset_prefix("Helvetica"), "Helvetica");
        assert_eq!(strip_subset_prefix("abcdef+Arial"), "abcdef+Arial");
        assert_eq!(strip_subset_prefix("ABC+Arial"), "ABC+Arial");
        assert_eq!(font_family("QWERTY+Times-Roman"), "Times-Roman");
    }

    #[test]
    fn weight_and_slant_from_name() {
        assert!(is_bold("Helvetica-Bold"));
        assert!(is_bold("ARIALBOLD"));
        assert!(!is_bold("Helvetica"));
        assert!(is_italic("Times-Italic"));
        assert!(is_italic("Helvetica-BoldOblique"));
        assert!(!is_italic("Courier"));
    }

    #[test]
    fn descriptor_flags_are_or_ed() {
        assert_eq!(style_flags("Foo", None), (false, false));
        assert_eq!(style_flags("Foo", Some(FLAG_ITALIC)), (false, true));
        assert_eq!(style_flags("Foo", Some(FLAG_FORCE_BOLD)), (true, false));
        assert_eq!(style_flags("Foo-Bold", Some(0)), (true, false));
    }
}
