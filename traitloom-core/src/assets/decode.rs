use std::{io::Cursor, sync::Arc};

use anyhow::Context;
use image::{ImageFormat, imageops::FilterType};

use crate::{
    TraitloomResult,
    foundation::core::{Canvas, Raster},
    foundation::error::TraitloomError,
    foundation::math::mul_div255,
};

#[derive(Clone, Debug)]
/// Raster image stretched to a canvas, in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// `true` when `bytes` carry a PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    matches!(image::guess_format(bytes), Ok(ImageFormat::Png))
}

/// Decode encoded image bytes, stretch them to fill `canvas` and convert to premultiplied RGBA8.
pub fn decode_to_canvas(bytes: &[u8], canvas: Canvas) -> TraitloomResult<PreparedImage> {
    canvas.validate()?;
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let mut rgba = dyn_img.to_rgba8();
    if rgba.dimensions() != (canvas.width, canvas.height) {
        rgba = image::imageops::resize(&rgba, canvas.width, canvas.height, FilterType::Triangle);
    }
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Encode a raster as PNG bytes (straight alpha).
pub fn encode_png(raster: &Raster) -> TraitloomResult<Vec<u8>> {
    let mut straight = raster.data.clone();
    if raster.premultiplied {
        unpremultiply_rgba8_in_place(&mut straight);
    }
    let img = image::RgbaImage::from_raw(raster.width, raster.height, straight).ok_or_else(
        || {
            TraitloomError::validation(format!(
                "raster buffer does not match {}x{}",
                raster.width, raster.height
            ))
        },
    )?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = mul_div255(*c, a);
        }
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = if a == 0 {
                0
            } else {
                ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8
            };
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
