use crate::{
    foundation::error::{TraitloomError, TraitloomResult},
    foundation::math::mul_div255,
};

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for premultiplied pixels: `src + dst * (1 - src.a)`.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let keep = 255 - sa;
            std::array::from_fn(|i| src[i].saturating_add(mul_div255(dst[i], keep)))
        }
    }
}

/// Draw `src` over `dst`, both tightly packed premultiplied RGBA8 of the same size.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> TraitloomResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TraitloomError::validation(format!(
            "layer buffer of {} bytes cannot be drawn onto a {}-byte canvas",
            src.len(),
            dst.len()
        )));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
