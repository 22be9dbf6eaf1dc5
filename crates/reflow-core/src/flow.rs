//! Greedy paginated text flow.
//!
//! Lays plain lines onto fixed-size pages one character at a time. Each
//! character is measured with a [`GlyphMetrics`] implementation; when it would
//! cross the right margin the cursor drops one line first. Whenever the
//! cursor falls below the bottom margin a new page is opened. Wrapping is by
//! character, not by word, so a word may be split across lines.
//!
//! All coordinates are PDF points with the origin at the bottom-left of the
//! page; `y` is the baseline of the line being filled.

use crate::error::ReflowError;

/// Source of horizontal glyph advances.
pub trait GlyphMetrics {
    /// Advance width of `ch` at `font_size`, in points.
    fn advance(&self, ch: char, font_size: f64) -> f64;
}

impl<M: GlyphMetrics + ?Sized> GlyphMetrics for &M {
    fn advance(&self, ch: char, font_size: f64) -> f64 {
        (**self).advance(ch, font_size)
    }
}

/// Page geometry and typography for a flow run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowConfig {
    pub page_width: f64,
    pub page_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub font_size: f64,
    /// Extra gap between lines, added to the font size.
    pub line_spacing: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
            font_size: 12.0,
            line_spacing: 3.0,
        }
    }
}

impl FlowConfig {
    /// Baseline of the first line on a page.
    pub fn initial_y(&self) -> f64 {
        self.page_height - self.margin_top
    }

    /// Rightmost x a glyph may reach.
    pub fn right_limit(&self) -> f64 {
        self.page_width - self.margin_right
    }

    pub fn line_height(&self) -> f64 {
        self.font_size + self.line_spacing
    }

    /// Reject geometry that leaves no room to place text.
    pub fn validate(&self) -> Result<(), ReflowError> {
        if self.right_limit() <= self.margin_left {
            return Err(ReflowError::Geometry(format!(
                "no horizontal room: left margin {} >= right limit {}",
                self.margin_left,
                self.right_limit()
            )));
        }
        if self.initial_y() < self.margin_bottom {
            return Err(ReflowError::Geometry(format!(
                "no vertical room: first baseline {} is below bottom margin {}",
                self.initial_y(),
                self.margin_bottom
            )));
        }
        if self.line_height().is_nan() || self.line_height() <= 0.0 {
            return Err(ReflowError::Geometry(format!(
                "line height must be positive, got {}",
                self.line_height()
            )));
        }
        Ok(())
    }
}

/// Position of the next glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowCursor {
    /// 0-based page index.
    pub page: usize,
    pub x: f64,
    pub y: f64,
}

impl FlowCursor {
    /// Cursor at the top-left margin of the first page.
    pub fn new(config: &FlowConfig) -> Self {
        Self {
            page: 0,
            x: config.margin_left,
            y: config.initial_y(),
        }
    }
}

/// A character placed on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub ch: char,
}

/// Result of a flow run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowLayout {
    pub page_count: usize,
    /// Glyphs in placement order.
    pub glyphs: Vec<PlacedGlyph>,
}

impl FlowLayout {
    /// Glyphs on `page`, in placement order.
    pub fn page_glyphs(&self, page: usize) -> impl Iterator<Item = &PlacedGlyph> {
        self.glyphs.iter().filter(move |g| g.page == page)
    }

    /// Visual lines (one per distinct page/baseline), in placement order.
    pub fn visual_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let mut last: Option<(usize, f64)> = None;
        for g in &self.glyphs {
            if last != Some((g.page, g.y)) {
                lines.push(String::new());
                last = Some((g.page, g.y));
            }
            if let Some(line) = lines.last_mut() {
                line.push(g.ch);
            }
        }
        lines
    }

    /// Text of each page with visual lines joined by `\n`.
    pub fn text_by_page(&self) -> Vec<String> {
        let mut pages = vec![String::new(); self.page_count];
        let mut last: Option<(usize, f64)> = None;
        for g in &self.glyphs {
            let Some(text) = pages.get_mut(g.page) else {
                continue;
            };
            if let Some((page, y)) = last {
                if page == g.page && y != g.y {
                    text.push('\n');
                }
            }
            text.push(g.ch);
            last = Some((g.page, g.y));
        }
        pages
    }
}

/// Paginates plain text with a fixed font and size.
#[derive(Debug, Clone)]
pub struct FlowRenderer<M> {
    config: FlowConfig,
    metrics: M,
}

impl<M: GlyphMetrics> FlowRenderer<M> {
    pub fn new(config: FlowConfig, metrics: M) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Lay out `lines`, each followed by a forced line break.
    pub fn render_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<FlowLayout, ReflowError> {
        self.config.validate()?;

        let mut cursor = FlowCursor::new(&self.config);
        let mut glyphs = Vec::new();
        for line in lines {
            self.render_line(&mut cursor, line.as_ref(), &mut glyphs);
            self.line_break(&mut cursor);
        }

        // The last forced break may open a page that never receives a glyph.
        let fresh_trailing_page = cursor.page > 0 && cursor.y == self.config.initial_y();
        let page_count = if fresh_trailing_page {
            cursor.page
        } else {
            cursor.page + 1
        };
        Ok(FlowLayout { page_count, glyphs })
    }

    /// Join each row's cells with `separator` and lay the rows out as lines.
    pub fn render_rows<S: AsRef<str>>(
        &self,
        rows: &[Vec<S>],
        separator: &str,
    ) -> Result<FlowLayout, ReflowError> {
        let lines: Vec<String> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref())
                    .collect::<Vec<&str>>()
                    .join(separator)
            })
            .collect();
        self.render_lines(&lines)
    }

    /// Place the characters of one source line, wrapping at the right margin.
    ///
    /// Leaves the cursor after the last placed character; the caller decides
    /// whether to break the line.
    pub fn render_line(&self, cursor: &mut FlowCursor, line: &str, out: &mut Vec<PlacedGlyph>) {
        let right_limit = self.config.right_limit();
        for ch in line.chars() {
            let width = self.metrics.advance(ch, self.config.font_size);
            if cursor.x + width > right_limit {
                self.line_break(cursor);
            }
            out.push(PlacedGlyph {
                page: cursor.page,
                x: cursor.x,
                y: cursor.y,
                ch,
            });
            cursor.x += width;
        }
    }

    /// Move to the start of the next line, opening a page when the baseline
    /// drops below the bottom margin. Returns whether a page was opened.
    pub fn line_break(&self, cursor: &mut FlowCursor) -> bool {
        cursor.x = self.config.margin_left;
        cursor.y -= self.config.line_height();
        if cursor.y < self.config.margin_bottom {
            cursor.page += 1;
            cursor.y = self.config.initial_y();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character advances the same width (in 1/1000 em).
    struct Fixed(f64);

    impl GlyphMetrics for Fixed {
        fn advance(&self, _ch: char, font_size: f64) -> f64 {
            self.0 / 1000.0 * font_size
        }
    }

    fn config(font_size: f64, line_spacing: f64) -> FlowConfig {
        FlowConfig {
            page_width: 612.0,
            page_height: 792.0,
            margin_top: 50.0,
            margin_bottom: 50.0,
            margin_left: 72.0,
            margin_right: 72.0,
            font_size,
            line_spacing,
        }
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    // --- config ---

    #[test]
    fn derived_geometry() {
        let c = FlowConfig::default();
        assert_eq!(c.initial_y(), 720.0);
        assert_eq!(c.right_limit(), 540.0);
        assert_eq!(c.line_height(), 15.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let narrow = FlowConfig {
            margin_left: 400.0,
            margin_right: 300.0,
            ..FlowConfig::default()
        };
        assert!(matches!(narrow.validate(), Err(ReflowError::Geometry(_))));

        let flat = FlowConfig {
            font_size: 0.0,
            line_spacing: 0.0,
            ..FlowConfig::default()
        };
        assert!(flat.validate().is_err());

        let renderer = FlowRenderer::new(narrow, Fixed(600.0));
        assert!(renderer.render_lines(&["x"]).is_err());
    }

    // --- page breaks ---

    #[test]
    fn lines_per_page_is_ceil_of_available_over_line_height() {
        // 692 / 15 = 46.13.. -> 47 baselines fit on a page.
        let renderer = FlowRenderer::new(config(12.0, 3.0), Fixed(600.0));
        let layout = renderer.render_lines(&lines(47)).unwrap();
        assert_eq!(layout.page_count, 1);
        let layout = renderer.render_lines(&lines(48)).unwrap();
        assert_eq!(layout.page_count, 2);
    }

    #[test]
    fn three_k_plus_one_lines_make_four_pages() {
        let renderer = FlowRenderer::new(config(12.0, 3.0), Fixed(600.0));
        let k = 47;
        let layout = renderer.render_lines(&lines(3 * k + 1)).unwrap();
        assert_eq!(layout.page_count, 4);
        assert_eq!(layout.page_glyphs(3).count(), "line 141".len());
    }

    #[test]
    fn exactly_full_pages_leave_no_blank_trailing_page() {
        let renderer = FlowRenderer::new(config(12.0, 3.0), Fixed(600.0));
        let layout = renderer.render_lines(&lines(3 * 47)).unwrap();
        assert_eq!(layout.page_count, 3);
    }

    #[test]
    fn new_page_restarts_at_top_margin() {
        let renderer = FlowRenderer::new(config(12.0, 3.0), Fixed(600.0));
        let layout = renderer.render_lines(&lines(48)).unwrap();
        let first_on_page_two = layout.page_glyphs(1).next().unwrap();
        assert_eq!(first_on_page_two.y, 742.0);
        assert_eq!(first_on_page_two.x, 72.0);
        assert!(layout.glyphs.iter().all(|g| g.y >= 50.0));
    }

    #[test]
    fn empty_input_is_one_empty_page() {
        let renderer = FlowRenderer::new(config(12.0, 3.0), Fixed(600.0));
        let layout = renderer.render_lines::<&str>(&[]).unwrap();
        assert_eq!(layout.page_count, 1);
        assert!(layout.glyphs.is_empty());
    }

    // --- wrapping ---

    #[test]
    fn wraps_into_ceil_of_total_width_over_usable_width() {
        // 6pt per char, 468pt usable -> 78 chars per visual line.
        let renderer = FlowRenderer::new(config(10.0, 2.0), Fixed(600.0));
        for n in [1usize, 77, 78, 79, 200, 468] {
            let layout = renderer.render_lines(&["x".repeat(n)]).unwrap();
            let expected = (n * 6).div_ceil(468);
            assert_eq!(layout.visual_lines().len(), expected, "n = {n}");
        }
    }

    #[test]
    fn wrap_splits_words_mid_character() {
        let renderer = FlowRenderer::new(config(10.0, 2.0), Fixed(600.0));
        let text = format!("{}abcdef", "y".repeat(75));
        let layout = renderer.render_lines(&[text]).unwrap();
        let visual = layout.visual_lines();
        assert_eq!(visual.len(), 2);
        assert!(visual[0].ends_with("abc"));
        assert_eq!(visual[1], "def");
    }

    #[test]
    fn oversized_glyph_still_renders() {
        // Each glyph is wider than the whole usable width.
        let renderer = FlowRenderer::new(config(10.0, 2.0), Fixed(100_000.0));
        let layout = renderer.render_lines(&["ab"]).unwrap();
        assert_eq!(layout.glyphs.len(), 2);
        assert!(layout.glyphs.iter().all(|g| g.x == 72.0));
    }

    #[test]
    fn whitespace_is_placed() {
        let renderer = FlowRenderer::new(config(10.0, 2.0), Fixed(600.0));
        let layout = renderer.render_lines(&["a b"]).unwrap();
        assert_eq!(layout.glyphs.len(), 3);
        assert_eq!(layout.glyphs[2].x, 84.0);
    }

    // --- rows and text helpers ---

    #[test]
    fn rows_join_cells_with_separator() {
        let renderer = FlowRenderer::new(config(10.0, 2.0), Fixed(600.0));
        let rows = vec![vec!["a", "b"], vec!["c", "d", "e"]];
        let layout = renderer.render_rows(&rows, " | ").unwrap();
        assert_eq!(layout.visual_lines(), vec!["a | b", "c | d | e"]);
    }

    #[test]
    fn text_by_page_keeps_every_character() {
        let renderer = FlowRenderer::new(config(12.0, 3.0), Fixed(600.0));
        let source = lines(100);
        let layout = renderer.render_lines(&source).unwrap();
        let pages = layout.text_by_page();
        assert_eq!(pages.len(), layout.page_count);
        let rendered: String = pages.concat().replace('\n', "");
        assert_eq!(rendered, source.concat());
    }

    #[test]
    fn explicit_cursor_carries_state_between_calls() {
        let renderer = FlowRenderer::new(config(10.0, 2.0), Fixed(600.0));
        let mut cursor = FlowCursor::new(renderer.config());
        let mut glyphs = Vec::new();
        renderer.render_line(&mut cursor, "ab", &mut glyphs);
        assert_eq!(cursor.x, 84.0);
        renderer.render_line(&mut cursor, "c", &mut glyphs);
        assert_eq!(glyphs[2].x, 84.0);
        assert!(!renderer.line_break(&mut cursor));
        assert_eq!(cursor.x, 72.0);
        assert_eq!(cursor.y, 742.0 - 12.0);
    }
}
