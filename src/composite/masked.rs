use rayon::prelude::*;
use tracing::debug;

use crate::{
    foundation::error::{MaskeditError, MaskeditResult},
    raster::image::RasterImage,
};

/// Blend a model-edited frame into an original image, restricted to a
/// painted mask, over encoded inputs.
///
/// All three inputs are decoded first; any decode failure aborts the call
/// with no partial output. The result is at `original`'s resolution.
pub fn composite(original: &[u8], edited: &[u8], mask: &[u8]) -> MaskeditResult<RasterImage> {
    let original = decode_input(original, "original image")?;
    let edited = decode_input(edited, "edited image")?;
    let mask = decode_input(mask, "mask image")?;
    composite_images(&original, &edited, &mask)
}

/// Blend decoded images: `out = original*(1 - a) + edited*a` per pixel,
/// where `a` is the mask's alpha coverage.
///
/// `edited` and `mask` are bilinearly resampled to `original`'s dimensions
/// when they differ; mask color is ignored, only alpha is read. Pixels with
/// zero coverage are byte-identical to `original`, pixels with full coverage
/// byte-identical to the (resampled) `edited`; antialiased stroke edges
/// blend proportionally.
pub fn composite_images(
    original: &RasterImage,
    edited: &RasterImage,
    mask: &RasterImage,
) -> MaskeditResult<RasterImage> {
    let (width, height) = original.dimensions();
    let edited = edited.resample(width, height)?;
    let mask = mask.resample(width, height)?;

    debug!(width, height, "compositing masked edit");

    let row_bytes = width as usize * 4;
    let mut out = original.as_rgba8().to_vec();
    out.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(y, row)| {
            let e_row = &edited.as_rgba8()[y * row_bytes..][..row_bytes];
            let m_row = &mask.as_rgba8()[y * row_bytes..][..row_bytes];
            for ((d, e), m) in row
                .chunks_exact_mut(4)
                .zip(e_row.chunks_exact(4))
                .zip(m_row.chunks_exact(4))
            {
                blend_px(d, e, m[3]);
            }
        });

    RasterImage::from_rgba8(width, height, out)
}

fn blend_px(dst: &mut [u8], edited: &[u8], coverage: u8) {
    if coverage == 0 {
        return;
    }
    if coverage == 255 {
        dst.copy_from_slice(edited);
        return;
    }
    let a = u16::from(coverage);
    let inv = 255u16 - a;
    for i in 0..4 {
        let kept = mul_div255(u16::from(dst[i]), inv);
        let incoming = mul_div255(u16::from(edited[i]), a);
        dst[i] = kept.saturating_add(incoming);
    }
}

/// Source-over for equal-length premultiplied RGBA8 buffers:
/// `dst = src + dst * (1 - src_alpha)` per pixel.
pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = s[3];
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - u16::from(sa);
        for i in 0..4 {
            d[i] = mul_div255(u16::from(d[i]), inv).saturating_add(s[i]);
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn decode_input(bytes: &[u8], what: &str) -> MaskeditResult<RasterImage> {
    RasterImage::decode(bytes).map_err(|e| match e {
        MaskeditError::Decode(msg) => MaskeditError::decode(format!("{what}: {msg}")),
        other => other,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/composite/masked.rs"]
mod tests;
