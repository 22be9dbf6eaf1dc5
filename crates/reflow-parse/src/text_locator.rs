//! Text Locator: one [`TextElement`] per glyph shown on a page.
//!
//! The page's content stream is run through a small interpreter that keeps
//! the CTM, fill colour and text state. Every shown code becomes a glyph at
//! the origin of its rendering matrix. Glyphs are then put in position
//! order (top to bottom, left to right) and each one records the baseline
//! delta to the glyph before it.
//!
//! `Do` on a Form XObject runs the form's content stream in place, under
//! the form's /Matrix and with its own /Resources (the caller's when it has
//! none).

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId};
use reflow_core::{Rgb, TextElement, Transform};
use tracing::{debug, trace, warn};

use crate::error::SourceError;
use crate::font_metrics::LoadedFont;
use crate::source::{
    PageBox, SourcePage, decode_stream, form_resources, form_xobject, operand_f64, resolve,
    resource_entry,
};
use crate::text_state::{TextParams, TextState};
use crate::transform_resolver::matrix_operands;

/// Extract every glyph on `page`, in position order.
pub fn locate_text(page: &SourcePage<'_>) -> Result<Vec<TextElement>, SourceError> {
    let ops = page.operations()?;
    let crop = page.crop_box()?;
    let mut locator = TextLocator::new(page, page.resources()?);
    for op in &ops {
        locator.apply(op)?;
    }
    let elements = locator.finish(crop);
    debug!(page = page.index(), glyphs = elements.len(), "located text");
    Ok(elements)
}

struct Glyph {
    x: f64,
    y: f64,
    text: String,
    font_size: f64,
    color: Rgb,
    /// Index into `TextLocator::fonts`.
    font: usize,
}

#[derive(Clone)]
struct Saved {
    ctm: Transform,
    fill: Rgb,
    params: TextParams,
    font: Option<usize>,
}

/// Nesting limit for Form XObjects.
const MAX_FORM_DEPTH: usize = 10;

struct TextLocator<'p, 'a> {
    page: &'p SourcePage<'a>,
    /// Resources of the stream being run: the page's, or the current form's.
    resources: &'a Dictionary,
    /// Forms currently being run, outermost first.
    forms: Vec<ObjectId>,
    ctm: Transform,
    fill: Rgb,
    text: TextState,
    stack: Vec<Saved>,
    /// Font selected by the last `Tf`.
    font: Option<usize>,
    fonts: Vec<LoadedFont>,
    /// Indirect font dictionaries already loaded, so each is read once.
    loaded: HashMap<ObjectId, usize>,
    /// Fallbacks for names with no usable font dictionary.
    fallbacks: HashMap<Vec<u8>, usize>,
    glyphs: Vec<Glyph>,
}

impl<'p, 'a> TextLocator<'p, 'a> {
    fn new(page: &'p SourcePage<'a>, resources: &'a Dictionary) -> Self {
        Self {
            page,
            resources,
            forms: Vec::new(),
            ctm: Transform::identity(),
            fill: Rgb::BLACK,
            text: TextState::new(),
            stack: Vec::new(),
            font: None,
            fonts: Vec::new(),
            loaded: HashMap::new(),
            fallbacks: HashMap::new(),
            glyphs: Vec::new(),
        }
    }

    fn save(&self) -> Saved {
        Saved {
            ctm: self.ctm,
            fill: self.fill,
            params: self.text.params.clone(),
            font: self.font,
        }
    }

    fn restore(&mut self, saved: Saved) {
        self.ctm = saved.ctm;
        self.fill = saved.fill;
        self.text.params = saved.params;
        self.font = saved.font;
    }

    fn num(operands: &[Object], i: usize) -> f64 {
        operand_f64(operands, i).unwrap_or(0.0)
    }

    fn apply(&mut self, op: &Operation) -> Result<(), SourceError> {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => {
                let saved = self.save();
                self.stack.push(saved);
            }
            "Q" => match self.stack.pop() {
                Some(saved) => self.restore(saved),
                None => debug!("Q with empty graphics stack ignored"),
            },
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.ctm = self.ctm.multiply(&m);
                }
            }

            "g" | "rg" | "k" | "sc" | "scn" => {
                let components: Vec<f64> = operands
                    .iter()
                    .map_while(|o| crate::source::object_to_f64(o).ok())
                    .collect();
                if let Some(color) = Rgb::from_components(&components) {
                    self.fill = color;
                }
            }

            "BT" => self.text.begin_text(),
            "ET" => self.text.end_text(),
            "Tf" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    self.text.params.font = name.to_vec();
                }
                self.text.params.font_size = Self::num(operands, 1);
                self.load_font();
            }
            "Tc" => self.text.params.char_spacing = Self::num(operands, 0),
            "Tw" => self.text.params.word_spacing = Self::num(operands, 0),
            "Tz" => self.text.params.h_scaling = Self::num(operands, 0),
            "TL" => self.text.params.leading = Self::num(operands, 0),
            "Ts" => self.text.params.rise = Self::num(operands, 0),
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.text.set_text_matrix(m);
                }
            }
            "Td" => self
                .text
                .move_text_position(Self::num(operands, 0), Self::num(operands, 1)),
            "TD" => self
                .text
                .move_and_set_leading(Self::num(operands, 0), Self::num(operands, 1)),
            "T*" => self.text.next_line(),

            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.text.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                self.text.params.word_spacing = Self::num(operands, 0);
                self.text.params.char_spacing = Self::num(operands, 1);
                self.text.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            Object::Integer(_) | Object::Real(_) => {
                                let amount = crate::source::object_to_f64(item).unwrap_or(0.0);
                                let tx = self.text.params.adjustment(amount);
                                self.text.advance(tx);
                            }
                            _ => {}
                        }
                    }
                }
            }
            "Do" => {
                if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                    self.run_form(name)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Run the Form XObject `name` in a saved graphics state. Anything
    /// else (images, unknown names) paints no text and is skipped.
    fn run_form(&mut self, name: &[u8]) -> Result<(), SourceError> {
        let doc = self.page.document();
        let Some((id, stream)) = form_xobject(doc, self.resources, name) else {
            return Ok(());
        };
        let label = String::from_utf8_lossy(name);
        if self.forms.contains(&id) {
            debug!(form = %label, "form invokes itself, skipped");
            return Ok(());
        }
        if self.forms.len() >= MAX_FORM_DEPTH {
            warn!(form = %label, depth = self.forms.len(), "form nesting too deep, skipped");
            return Ok(());
        }
        let ops = match decode_stream(stream).and_then(|bytes| {
            Content::decode(&bytes)
                .map_err(|e| SourceError::Parse(format!("failed to decode form content: {e}")))
        }) {
            Ok(content) => content.operations,
            Err(e) => {
                warn!(page = self.page.index(), form = %label, "skipping form: {e}");
                return Ok(());
            }
        };

        let saved = self.save();
        let parent = self.resources;
        if let Some(m) = stream
            .dict
            .get(b"Matrix")
            .and_then(|o| o.as_array())
            .ok()
            .and_then(|a| matrix_operands(a))
        {
            self.ctm = self.ctm.multiply(&m);
        }
        self.resources = form_resources(doc, stream).unwrap_or(parent);
        self.forms.push(id);
        trace!(form = %label, depth = self.forms.len(), "entering form");

        let result = ops.iter().try_for_each(|op| self.apply(op));

        self.forms.pop();
        self.resources = parent;
        self.restore(saved);
        result
    }

    /// Select the font named by the last `Tf` in the current resources.
    fn load_font(&mut self) {
        let doc = self.page.document();
        let name = self.text.params.font.clone();
        let index = match resource_entry(doc, self.resources, b"Font", &name) {
            Some(Object::Reference(id)) if self.loaded.contains_key(id) => self.loaded[id],
            Some(entry) => match resolve(doc, entry).as_dict() {
                Ok(dict) => {
                    self.fonts.push(LoadedFont::load(doc, dict));
                    let index = self.fonts.len() - 1;
                    if let Object::Reference(id) = entry {
                        self.loaded.insert(*id, index);
                    }
                    index
                }
                Err(_) => self.fallback_font(&name),
            },
            None => self.fallback_font(&name),
        };
        self.font = Some(index);
    }

    fn fallback_font(&mut self, name: &[u8]) -> usize {
        if let Some(&index) = self.fallbacks.get(name) {
            return index;
        }
        let label = String::from_utf8_lossy(name);
        debug!(font = %label, "font resource not found, using fallback metrics");
        self.fonts.push(LoadedFont::fallback(&label));
        let index = self.fonts.len() - 1;
        self.fallbacks.insert(name.to_vec(), index);
        index
    }

    fn show(&mut self, bytes: &[u8]) {
        let index = match self.font {
            Some(index) => index,
            None => {
                let name = self.text.params.font.clone();
                let index = self.fallback_font(&name);
                self.font = Some(index);
                index
            }
        };
        let font = &self.fonts[index];

        for decoded in font.decode(bytes) {
            let trm = self.text.rendering_matrix(&self.ctm);
            let size = (trm.scaling_factor_y() * 100.0).round() / 100.0;
            trace!(code = decoded.code, x = trm.translate_x(), y = trm.translate_y(), "glyph");
            self.glyphs.push(Glyph {
                x: trm.translate_x(),
                y: trm.translate_y(),
                text: decoded.text,
                font_size: size,
                color: self.fill,
                font: index,
            });
            let tx = self
                .text
                .params
                .displacement(decoded.width, font.is_word_space(decoded.code));
            self.text.advance(tx);
        }
    }

    fn finish(self, crop: PageBox) -> Vec<TextElement> {
        let Self {
            page,
            fonts,
            mut glyphs,
            ..
        } = self;
        glyphs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut previous_y: Option<f64> = None;
        glyphs
            .into_iter()
            .map(|g| {
                let line_spacing = previous_y.map(|prev| g.y - prev);
                previous_y = Some(g.y);
                let font = &fonts[g.font];
                TextElement {
                    page_index: page.index(),
                    x: g.x,
                    y: g.y,
                    page_width: crop.width(),
                    page_height: crop.height(),
                    text: g.text,
                    font_family: font.family(),
                    font_size: g.font_size,
                    color: g.color,
                    bold: font.bold,
                    italic: font.italic,
                    left_margin: crop.x0,
                    line_spacing,
                }
            })
            .collect()
    }
}
