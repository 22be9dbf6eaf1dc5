//! lopdf-backed source document access.
//!
//! [`SourceDocument`] owns a parsed [`lopdf::Document`] and hands out
//! [`SourcePage`] views that expose what the locators need: the decoded
//! content-stream operations, the page boxes and image XObjects. Resource
//! lookups that work on any scope (page or form) are free functions.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId};

use crate::error::SourceError;

/// A parsed PDF document.
pub struct SourceDocument {
    inner: lopdf::Document,
    /// Page object ids in page order (0-based).
    page_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl SourceDocument {
    /// Parse a document from memory. Encrypted documents are rejected.
    pub fn open(bytes: &[u8]) -> Result<Self, SourceError> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| SourceError::Parse(format!("failed to parse PDF: {e}")))?;
        Self::from_document(inner)
    }

    /// Read and parse a document from disk.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(&bytes)
    }

    pub fn from_document(inner: lopdf::Document) -> Result<Self, SourceError> {
        if inner.is_encrypted() {
            return Err(SourceError::Encrypted);
        }
        // get_pages is keyed by 1-based page number, so values come out in order.
        let page_ids = inner.get_pages().values().copied().collect();
        Ok(Self { inner, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page(&self, index: usize) -> Result<SourcePage<'_>, SourceError> {
        let id = *self.page_ids.get(index).ok_or_else(|| {
            SourceError::Parse(format!(
                "page index {index} out of range (0..{})",
                self.page_ids.len()
            ))
        })?;
        Ok(SourcePage {
            doc: &self.inner,
            id,
            index,
        })
    }

    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }
}

/// A page rectangle `[x0 y0 x1 y1]` in default user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageBox {
    /// US Letter, used when a page carries no usable MediaBox.
    pub const LETTER: PageBox = PageBox {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }

    fn from_array(array: &[Object]) -> Result<Self, SourceError> {
        if array.len() != 4 {
            return Err(SourceError::Parse(format!(
                "expected 4-element array for box, got {}",
                array.len()
            )));
        }
        let x0 = object_to_f64(&array[0])?;
        let y0 = object_to_f64(&array[1])?;
        let x1 = object_to_f64(&array[2])?;
        let y1 = object_to_f64(&array[3])?;
        // Normalise so x0/y0 is the lower-left corner.
        Ok(PageBox {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        })
    }
}

/// Colour space of an image XObject, reduced to what can be re-encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// ICCBased without a usable /N entry.
    IccUnknown,
    Other(String),
}

/// How the bytes of a [`RawImage`] are encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageEncoding {
    /// Unfiltered samples (any stream filters already removed).
    Samples(Vec<u8>),
    /// A baseline JPEG (DCTDecode) file.
    Jpeg(Vec<u8>),
    /// A filter the locator cannot decode.
    Unsupported(String),
}

/// An image XObject as found in the page resources.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    /// Resource name, e.g. `Im0`.
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color_space: ImageColorSpace,
    pub bits_per_component: u8,
    pub encoding: ImageEncoding,
}

/// A single page of a [`SourceDocument`].
#[derive(Debug, Clone, Copy)]
pub struct SourcePage<'a> {
    doc: &'a lopdf::Document,
    id: ObjectId,
    index: usize,
}

impl<'a> SourcePage<'a> {
    /// 0-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn document(&self) -> &'a lopdf::Document {
        self.doc
    }

    fn dict(&self) -> Result<&'a Dictionary, SourceError> {
        self.doc
            .get_object(self.id)
            .and_then(|o| o.as_dict())
            .map_err(|e| SourceError::Parse(format!("failed to get page dictionary: {e}")))
    }

    /// The page's MediaBox, inherited through /Parent. Letter when absent.
    pub fn media_box(&self) -> Result<PageBox, SourceError> {
        match resolve_inherited(self.doc, self.id, b"MediaBox")? {
            Some(obj) => {
                let array = resolve(self.doc, obj)
                    .as_array()
                    .map_err(|e| SourceError::Parse(format!("MediaBox is not an array: {e}")))?;
                PageBox::from_array(array)
            }
            None => {
                tracing::warn!(page = self.index, "MediaBox missing, assuming US Letter");
                Ok(PageBox::LETTER)
            }
        }
    }

    /// The visible region of the page: CropBox when present, else MediaBox.
    pub fn crop_box(&self) -> Result<PageBox, SourceError> {
        match resolve_inherited(self.doc, self.id, b"CropBox")? {
            Some(obj) => {
                let array = resolve(self.doc, obj)
                    .as_array()
                    .map_err(|e| SourceError::Parse(format!("CropBox is not an array: {e}")))?;
                PageBox::from_array(array)
            }
            None => self.media_box(),
        }
    }

    /// Raw (decompressed) content stream bytes, concatenated across streams.
    pub fn content_bytes(&self) -> Result<Vec<u8>, SourceError> {
        let contents = match self.dict()?.get(b"Contents") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };
        match resolve(self.doc, contents) {
            Object::Stream(stream) => decode_stream(stream),
            Object::Array(items) => {
                let mut content = Vec::new();
                for item in items {
                    let stream = resolve(self.doc, item).as_stream().map_err(|e| {
                        SourceError::Parse(format!("/Contents array item is not a stream: {e}"))
                    })?;
                    let bytes = decode_stream(stream)?;
                    if !content.is_empty() {
                        content.push(b' ');
                    }
                    content.extend_from_slice(&bytes);
                }
                Ok(content)
            }
            _ => Err(SourceError::Parse(
                "/Contents is not a stream or array".to_string(),
            )),
        }
    }

    /// Content stream decoded into operations.
    pub fn operations(&self) -> Result<Vec<Operation>, SourceError> {
        let bytes = self.content_bytes()?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let content = Content::decode(&bytes)
            .map_err(|e| SourceError::Parse(format!("failed to decode content stream: {e}")))?;
        Ok(content.operations)
    }

    /// The page's resource dictionary, inherited through /Parent.
    pub fn resources(&self) -> Result<&'a Dictionary, SourceError> {
        static EMPTY: std::sync::LazyLock<Dictionary> = std::sync::LazyLock::new(Dictionary::new);
        match resolve_inherited(self.doc, self.id, b"Resources")? {
            Some(obj) => resolve(self.doc, obj)
                .as_dict()
                .map_err(|_| SourceError::Parse("/Resources is not a dictionary".to_string())),
            None => Ok(&EMPTY),
        }
    }

    /// A named sub-dictionary of the resources (`Font`, `XObject`, ...).
    fn resource_category(&self, key: &[u8]) -> Result<Option<&'a Dictionary>, SourceError> {
        let resources = self.resources()?;
        match resources.get(key) {
            Ok(obj) => Ok(resolve(self.doc, obj).as_dict().ok()),
            Err(_) => Ok(None),
        }
    }

    /// Image XObjects in resource order. Form XObjects are not entered.
    pub fn image_xobjects(&self) -> Result<Vec<RawImage>, SourceError> {
        let Some(xobjects) = self.resource_category(b"XObject")? else {
            return Ok(Vec::new());
        };
        let mut images = Vec::new();
        for (name, obj) in xobjects.iter() {
            let Ok(stream) = resolve(self.doc, obj).as_stream() else {
                continue;
            };
            let is_image = stream
                .dict
                .get(b"Subtype")
                .and_then(|s| s.as_name())
                .is_ok_and(|s| s == b"Image");
            if !is_image {
                continue;
            }
            images.push(self.raw_image(String::from_utf8_lossy(name).into_owned(), stream));
        }
        Ok(images)
    }

    fn raw_image(&self, name: String, stream: &lopdf::Stream) -> RawImage {
        let dict = &stream.dict;
        let int = |key: &[u8]| {
            dict.get(key)
                .ok()
                .map(|o| resolve(self.doc, o))
                .and_then(|o| o.as_i64().ok())
        };
        let width = int(b"Width").unwrap_or(0).max(0) as u32;
        let height = int(b"Height").unwrap_or(0).max(0) as u32;
        let bits_per_component = int(b"BitsPerComponent").unwrap_or(8).clamp(1, 16) as u8;

        let color_space = if dict
            .get(b"ImageMask")
            .and_then(|o| o.as_bool())
            .unwrap_or(false)
        {
            ImageColorSpace::Other("ImageMask".to_string())
        } else {
            dict.get(b"ColorSpace")
                .map(|cs| image_color_space(self.doc, cs))
                .unwrap_or(ImageColorSpace::Other("none".to_string()))
        };

        let filters = stream_filters(self.doc, dict);
        let encoding = match filters.last().map(String::as_str) {
            None => ImageEncoding::Samples(stream.content.clone()),
            Some("DCTDecode") if filters.len() == 1 => ImageEncoding::Jpeg(stream.content.clone()),
            Some("DCTDecode" | "JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode") => {
                ImageEncoding::Unsupported(filters.join(","))
            }
            Some(_) => match stream.decompressed_content() {
                Ok(bytes) => ImageEncoding::Samples(bytes),
                Err(e) => ImageEncoding::Unsupported(format!("{}: {e}", filters.join(","))),
            },
        };

        RawImage {
            name,
            width,
            height,
            color_space,
            bits_per_component,
            encoding,
        }
    }
}

fn image_color_space(doc: &lopdf::Document, obj: &Object) -> ImageColorSpace {
    match resolve(doc, obj) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => ImageColorSpace::Gray,
            b"DeviceRGB" | b"CalRGB" | b"RGB" => ImageColorSpace::Rgb,
            b"DeviceCMYK" | b"CMYK" => ImageColorSpace::Cmyk,
            other => ImageColorSpace::Other(String::from_utf8_lossy(other).into_owned()),
        },
        Object::Array(items) => {
            let family = items.first().and_then(|o| o.as_name().ok()).unwrap_or(b"");
            match family {
                b"ICCBased" => {
                    let n = items
                        .get(1)
                        .map(|o| resolve(doc, o))
                        .and_then(|o| o.as_stream().ok())
                        .and_then(|s| s.dict.get(b"N").ok())
                        .and_then(|o| o.as_i64().ok());
                    match n {
                        Some(1) => ImageColorSpace::Gray,
                        Some(3) => ImageColorSpace::Rgb,
                        Some(4) => ImageColorSpace::Cmyk,
                        _ => ImageColorSpace::IccUnknown,
                    }
                }
                b"CalGray" => ImageColorSpace::Gray,
                b"CalRGB" => ImageColorSpace::Rgb,
                other => ImageColorSpace::Other(String::from_utf8_lossy(other).into_owned()),
            }
        }
        _ => ImageColorSpace::Other("unknown".to_string()),
    }
}

/// Filter names of a stream, in application order.
fn stream_filters(doc: &lopdf::Document, dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter").map(|f| resolve(doc, f)) {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

/// Entry `name` under `category` (`Font`, `XObject`, ...) of a resource
/// dictionary, unresolved so callers can key on its object id.
pub(crate) fn resource_entry<'a>(
    doc: &'a lopdf::Document,
    resources: &'a Dictionary,
    category: &[u8],
    name: &[u8],
) -> Option<&'a Object> {
    let entries = resolve(doc, resources.get(category).ok()?).as_dict().ok()?;
    entries.get(name).ok()
}

/// A Form XObject named in `resources`, with its object id.
pub(crate) fn form_xobject<'a>(
    doc: &'a lopdf::Document,
    resources: &'a Dictionary,
    name: &[u8],
) -> Option<(ObjectId, &'a lopdf::Stream)> {
    let id = resource_entry(doc, resources, b"XObject", name)?
        .as_reference()
        .ok()?;
    let stream = doc.get_object(id).and_then(|o| o.as_stream()).ok()?;
    let is_form = stream
        .dict
        .get(b"Subtype")
        .and_then(|s| s.as_name())
        .is_ok_and(|s| s == b"Form");
    is_form.then_some((id, stream))
}

/// The /Resources of a form stream, inline or referenced.
pub(crate) fn form_resources<'a>(
    doc: &'a lopdf::Document,
    form: &'a lopdf::Stream,
) -> Option<&'a Dictionary> {
    resolve(doc, form.dict.get(b"Resources").ok()?).as_dict().ok()
}

/// Decode a content stream, decompressing if needed.
pub(crate) fn decode_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, SourceError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| SourceError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Look up a key in the page dictionary, walking up the page tree
/// (via /Parent) if the key is not found on the page itself.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, SourceError> {
    let mut current_id = page_id;
    // Bounded walk so a cyclic /Parent chain cannot spin forever.
    for _ in 0..64 {
        let dict = doc
            .get_object(current_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| SourceError::Parse(format!("failed to get page tree node: {e}")))?;

        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent") {
            Ok(parent) => {
                current_id = parent
                    .as_reference()
                    .map_err(|e| SourceError::Parse(format!("invalid /Parent reference: {e}")))?;
            }
            Err(_) => return Ok(None),
        }
    }
    Err(SourceError::Parse("page tree /Parent chain too deep".to_string()))
}

/// Follow an indirect reference; non-references and dangling ones are returned as-is.
pub(crate) fn resolve<'a>(doc: &'a lopdf::Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub(crate) fn object_to_f64(obj: &Object) -> Result<f64, SourceError> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(f) => Ok(f64::from(*f)),
        _ => Err(SourceError::Parse(format!("expected number, got {obj:?}"))),
    }
}

/// Numeric operand at `index`, if present and numeric.
pub(crate) fn operand_f64(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(|o| object_to_f64(o).ok())
}
