//! Text state for the text locator.
//!
//! Tracks the text parameters (Tc, Tw, Tz, TL, Tf, Ts) that belong to the
//! graphics state, and the text and line matrices of the current BT/ET
//! object. Positioning operators (Td, TD, T*) move the line matrix; showing
//! glyphs advances the text matrix.

use reflow_core::Transform;

/// Text parameters saved and restored with `q`/`Q`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Horizontal scaling in percent (Tz).
    pub h_scaling: f64,
    pub leading: f64,
    /// Font resource name from Tf, e.g. `F1`.
    pub font: Vec<u8>,
    pub font_size: f64,
    pub rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font: Vec::new(),
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

impl TextParams {
    /// Th as a fraction.
    pub fn horizontal_scale(&self) -> f64 {
        self.h_scaling / 100.0
    }

    /// Maps glyph space (already divided by 1000) into text space.
    pub fn font_matrix(&self) -> Transform {
        Transform::new(
            self.font_size * self.horizontal_scale(),
            0.0,
            0.0,
            self.font_size,
            0.0,
            self.rise,
        )
    }

    /// Horizontal advance in text space for a glyph of `width` (1/1000 units).
    pub fn displacement(&self, width: f64, word_space: bool) -> f64 {
        let spacing = if word_space {
            self.char_spacing + self.word_spacing
        } else {
            self.char_spacing
        };
        (width / 1000.0 * self.font_size + spacing) * self.horizontal_scale()
    }

    /// Text-space shift for a TJ number.
    pub fn adjustment(&self, amount: f64) -> f64 {
        -amount / 1000.0 * self.font_size * self.horizontal_scale()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextState {
    pub params: TextParams,
    text_matrix: Transform,
    line_matrix: Transform,
    in_text: bool,
}

impl TextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_text_object(&self) -> bool {
        self.in_text
    }

    pub fn text_matrix(&self) -> Transform {
        self.text_matrix
    }

    pub fn line_matrix(&self) -> Transform {
        self.line_matrix
    }

    /// `BT`
    pub fn begin_text(&mut self) {
        self.text_matrix = Transform::identity();
        self.line_matrix = Transform::identity();
        self.in_text = true;
    }

    /// `ET`
    pub fn end_text(&mut self) {
        self.in_text = false;
    }

    /// `Tm`: replaces both matrices.
    pub fn set_text_matrix(&mut self, m: Transform) {
        self.text_matrix = m;
        self.line_matrix = m;
    }

    /// `Td`: offset from the start of the current line.
    pub fn move_text_position(&mut self, tx: f64, ty: f64) {
        self.line_matrix = self.line_matrix.multiply(&Transform::translate(tx, ty));
        self.text_matrix = self.line_matrix;
    }

    /// `TD`
    pub fn move_and_set_leading(&mut self, tx: f64, ty: f64) {
        self.params.leading = -ty;
        self.move_text_position(tx, ty);
    }

    /// `T*`
    pub fn next_line(&mut self) {
        let leading = self.params.leading;
        self.move_text_position(0.0, -leading);
    }

    /// Shift the text matrix along the baseline by `tx` text-space units.
    pub fn advance(&mut self, tx: f64) {
        self.text_matrix = self.text_matrix.multiply(&Transform::translate(tx, 0.0));
    }

    /// Trm: glyph space to device space under `ctm`.
    pub fn rendering_matrix(&self, ctm: &Transform) -> Transform {
        ctm.multiply(&self.text_matrix)
            .multiply(&self.params.font_matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn td_accumulates_on_line_matrix() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position(72.0, 700.0);
        ts.advance(30.0);
        ts.move_text_position(0.0, -14.0);
        let tm = ts.text_matrix();
        approx(tm.translate_x(), 72.0);
        approx(tm.translate_y(), 686.0);
    }

    #[test]
    fn td_sets_leading_for_next_line() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_and_set_leading(10.0, -12.0);
        ts.next_line();
        approx(ts.params.leading, 12.0);
        approx(ts.text_matrix().translate_y(), -24.0);
        approx(ts.text_matrix().translate_x(), 10.0);
    }

    #[test]
    fn advance_follows_scaled_text_matrix() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.set_text_matrix(Transform::new(2.0, 0.0, 0.0, 2.0, 100.0, 100.0));
        ts.advance(5.0);
        approx(ts.text_matrix().translate_x(), 110.0);
        // The line matrix is untouched by glyph advances.
        approx(ts.line_matrix().translate_x(), 100.0);
    }

    #[test]
    fn displacement_includes_spacing() {
        let params = TextParams {
            char_spacing: 1.0,
            word_spacing: 2.0,
            h_scaling: 50.0,
            font_size: 10.0,
            ..TextParams::default()
        };
        approx(params.displacement(500.0, false), 3.0);
        approx(params.displacement(500.0, true), 4.0);
        approx(params.adjustment(-200.0), 1.0);
    }

    #[test]
    fn rendering_matrix_applies_rise_and_ctm() {
        let mut ts = TextState::new();
        ts.params.font_size = 12.0;
        ts.params.rise = 3.0;
        ts.begin_text();
        ts.move_text_position(10.0, 20.0);
        let ctm = Transform::translate(100.0, 200.0);
        let trm = ts.rendering_matrix(&ctm);
        approx(trm.translate_x(), 110.0);
        approx(trm.translate_y(), 223.0);
        approx(trm.scaling_factor_y(), 12.0);
    }

    #[test]
    fn begin_text_resets_matrices() {
        let mut ts = TextState::new();
        ts.begin_text();
        ts.move_text_position(5.0, 5.0);
        ts.end_text();
        assert!(!ts.in_text_object());
        ts.begin_text();
        assert!(ts.text_matrix().is_identity());
    }
}
