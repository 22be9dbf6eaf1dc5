//! Image Locator: places each image XObject of a page and re-encodes it.
//!
//! Placement comes from the transform in force at the image's `Do`; the
//! image occupies the unit square under that transform, so the translation
//! is its lower-left corner and the column magnitudes are its size.
//! Pixels are re-encoded as PNG. Images that cannot be decoded are skipped.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use reflow_core::{ImageElement, Transform};
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::source::{ImageColorSpace, ImageEncoding, RawImage, SourcePage};
use crate::transform_resolver::find_transform;

/// Locate and encode every image XObject on `page`, in resource order.
///
/// `page_origin_offset` is added to each image's y coordinate.
pub fn locate_images(
    page: &SourcePage<'_>,
    page_origin_offset: f64,
) -> Result<Vec<ImageElement>, SourceError> {
    let images = page.image_xobjects()?;
    if images.is_empty() {
        return Ok(Vec::new());
    }
    let ops = page.operations()?;
    let crop = page.crop_box()?;

    let mut located = Vec::with_capacity(images.len());
    for raw in images {
        let data = match encode_png(&raw) {
            Ok(data) => data,
            Err(e) => {
                warn!(page = page.index(), image = %raw.name, "skipping image: {e}");
                continue;
            }
        };
        let placement = match find_transform(&ops, raw.name.as_bytes()) {
            Some(t) => Placement::from_transform(&t),
            None => {
                debug!(page = page.index(), image = %raw.name, "image never painted, using default placement");
                Placement::unresolved(&raw)
            }
        };
        located.push(ImageElement {
            page_index: page.index(),
            x: placement.x,
            y: placement.y + page_origin_offset,
            page_width: crop.width(),
            page_height: crop.height(),
            data,
            width: placement.width,
            height: placement.height,
        });
    }
    debug!(page = page.index(), images = located.len(), "located images");
    Ok(located)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Placement {
    fn from_transform(t: &Transform) -> Self {
        Self {
            x: t.translate_x(),
            y: t.translate_y(),
            width: t.scaling_factor_x(),
            height: t.scaling_factor_y(),
        }
    }

    /// Identity position with one point per pixel.
    fn unresolved(raw: &RawImage) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: f64::from(raw.width),
            height: f64::from(raw.height),
        }
    }
}

/// Decode `raw` and write it back out as PNG.
pub fn encode_png(raw: &RawImage) -> Result<Vec<u8>, SourceError> {
    let image = decode(raw)?;
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| SourceError::Image(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

fn decode(raw: &RawImage) -> Result<DynamicImage, SourceError> {
    if raw.width == 0 || raw.height == 0 {
        return Err(SourceError::Image("image has zero size".to_string()));
    }
    match &raw.encoding {
        ImageEncoding::Jpeg(bytes) => image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| SourceError::Image(format!("JPEG decoding failed: {e}"))),
        ImageEncoding::Unsupported(filter) => {
            Err(SourceError::Image(format!("unsupported filter {filter}")))
        }
        ImageEncoding::Samples(bytes) => {
            if raw.bits_per_component != 8 {
                return Err(SourceError::Image(format!(
                    "unsupported bit depth {}",
                    raw.bits_per_component
                )));
            }
            let pixels = pixel_count(raw.width, raw.height)?;
            let space = match &raw.color_space {
                ImageColorSpace::IccUnknown => guess_color_space(bytes.len(), pixels)?,
                other => other.clone(),
            };
            from_samples(raw.width, raw.height, &space, bytes, pixels)
        }
    }
}

/// Largest number of samples per pixel read by [`from_samples`].
const MAX_CHANNELS: usize = 4;

/// `width * height`, refused when a full CMYK buffer of that many pixels
/// would not fit in `usize`.
fn pixel_count(width: u32, height: u32) -> Result<usize, SourceError> {
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .filter(|pixels| pixels.checked_mul(MAX_CHANNELS).is_some())
        .ok_or_else(|| SourceError::Image(format!("image size {width}x{height} overflows")))
}

/// Pick a device space from the sample count.
fn guess_color_space(len: usize, pixels: usize) -> Result<ImageColorSpace, SourceError> {
    if len >= pixels * MAX_CHANNELS {
        Ok(ImageColorSpace::Cmyk)
    } else if len >= pixels * 3 {
        Ok(ImageColorSpace::Rgb)
    } else if len >= pixels {
        Ok(ImageColorSpace::Gray)
    } else {
        Err(SourceError::Image(format!(
            "{len} bytes is too short for {pixels} pixels"
        )))
    }
}

fn from_samples(
    width: u32,
    height: u32,
    space: &ImageColorSpace,
    bytes: &[u8],
    pixels: usize,
) -> Result<DynamicImage, SourceError> {
    let short = |channels: usize| {
        SourceError::Image(format!(
            "expected {} sample bytes, got {}",
            pixels * channels,
            bytes.len()
        ))
    };
    match space {
        ImageColorSpace::Gray => {
            let data = bytes.get(..pixels).ok_or_else(|| short(1))?.to_vec();
            GrayImage::from_raw(width, height, data)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| short(1))
        }
        ImageColorSpace::Rgb => {
            let data = bytes.get(..pixels * 3).ok_or_else(|| short(3))?.to_vec();
            RgbImage::from_raw(width, height, data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| short(3))
        }
        ImageColorSpace::Cmyk => {
            let cmyk = bytes.get(..pixels * 4).ok_or_else(|| short(4))?;
            let data = cmyk
                .chunks_exact(4)
                .flat_map(|px| {
                    let k = 255 - u16::from(px[3]);
                    let channel = |v: u8| ((255 - u16::from(v)) * k / 255) as u8;
                    [channel(px[0]), channel(px[1]), channel(px[2])]
                })
                .collect();
            RgbImage::from_raw(width, height, data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| short(4))
        }
        ImageColorSpace::IccUnknown | ImageColorSpace::Other(_) => Err(SourceError::Image(
            format!("unsupported colour space {space:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(space: ImageColorSpace, bytes: Vec<u8>) -> RawImage {
        RawImage {
            name: "Im0".to_string(),
            width: 2,
            height: 1,
            color_space: space,
            bits_per_component: 8,
            encoding: ImageEncoding::Samples(bytes),
        }
    }

    fn decode_png(png: &[u8]) -> DynamicImage {
        image::load_from_memory_with_format(png, ImageFormat::Png).unwrap()
    }

    #[test]
    fn rgb_samples_become_png() {
        let png = encode_png(&raw(ImageColorSpace::Rgb, vec![255, 0, 0, 0, 0, 255])).unwrap();
        let img = decode_png(&png).to_rgb8();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn cmyk_is_converted_to_rgb() {
        let png = encode_png(&raw(ImageColorSpace::Cmyk, vec![0, 0, 0, 0, 0, 0, 0, 255])).unwrap();
        let img = decode_png(&png).to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn icc_without_components_is_guessed() {
        let png = encode_png(&raw(ImageColorSpace::IccUnknown, vec![10, 200])).unwrap();
        let img = decode_png(&png);
        assert_eq!(img.to_luma8().get_pixel(1, 0).0, [200]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = encode_png(&raw(ImageColorSpace::Rgb, vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, SourceError::Image(_)));
    }

    #[test]
    fn unsupported_inputs_are_rejected() {
        let mut r = raw(ImageColorSpace::Rgb, vec![0; 6]);
        r.bits_per_component = 1;
        assert!(encode_png(&r).is_err());

        let r = raw(ImageColorSpace::Other("Indexed".into()), vec![0; 2]);
        assert!(encode_png(&r).is_err());

        let mut r = raw(ImageColorSpace::Rgb, vec![]);
        r.encoding = ImageEncoding::Unsupported("JPXDecode".into());
        assert!(encode_png(&r).is_err());
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let mut r = raw(ImageColorSpace::Rgb, vec![0; 6]);
        r.width = u32::MAX;
        r.height = u32::MAX;
        match encode_png(&r) {
            Err(SourceError::Image(msg)) => assert!(msg.contains("overflows"), "{msg}"),
            other => panic!("expected image error, got {other:?}"),
        }

        r.color_space = ImageColorSpace::IccUnknown;
        assert!(matches!(encode_png(&r), Err(SourceError::Image(_))));
    }

    #[test]
    fn placement_uses_translation_and_scale() {
        let t = Transform::new(200.0, 0.0, 0.0, 150.0, 100.0, 300.0);
        let p = Placement::from_transform(&t);
        assert_eq!(p, Placement { x: 100.0, y: 300.0, width: 200.0, height: 150.0 });

        let p = Placement::unresolved(&raw(ImageColorSpace::Gray, vec![]));
        assert_eq!((p.x, p.y, p.width, p.height), (0.0, 0.0, 2.0, 1.0));
    }
}
