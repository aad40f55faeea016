//! Saturation adjustment in LCh
//!
//! Scales CIE LCh chroma uniformly, leaving lightness and hue untouched.
//! Results outside the sRGB gamut are clamped per channel.

use crate::constants::pipeline;
use crate::error::Result;
use crate::image_buffer;
use opencv::core::Mat;
use palette::{FromColor, IntoColor, Lch, Srgb};
use std::collections::HashMap;

/// Scale the chroma of one BGR pixel
pub fn scale_chroma(bgr: [u8; 3], level: f32) -> [u8; 3] {
    let srgb = Srgb::new(
        bgr[2] as f32 / 255.0,
        bgr[1] as f32 / 255.0,
        bgr[0] as f32 / 255.0,
    );
    let mut lch = Lch::from_color(srgb);
    lch.chroma *= level;
    let out: Srgb = lch.into_color();
    [
        image_buffer::to_u8(out.blue.clamp(0.0, 1.0) * 255.0),
        image_buffer::to_u8(out.green.clamp(0.0, 1.0) * 255.0),
        image_buffer::to_u8(out.red.clamp(0.0, 1.0) * 255.0),
    ]
}

/// Multiply chroma by `level`; 1.0 is an exact passthrough
pub fn apply_saturation(image: &Mat, level: f32) -> Result<Mat> {
    let mut out = image_buffer::owned_copy(image)?;
    if (level - 1.0).abs() <= pipeline::IDENTITY_EPSILON {
        return Ok(out);
    }

    // Underwater frames have few distinct colors relative to pixel count
    let mut cache: HashMap<[u8; 3], [u8; 3]> = HashMap::new();
    for p in image_buffer::pixels_mut(&mut out)?.iter_mut() {
        let key = [p[0], p[1], p[2]];
        let scaled = *cache.entry(key).or_insert_with(|| scale_chroma(key, level));
        p[0] = scaled[0];
        p[1] = scaled[1];
        p[2] = scaled[2];
    }

    log::debug!(
        "Saturation x{:.1} applied ({} distinct colors)",
        level,
        cache.len()
    );
    Ok(out)
}
