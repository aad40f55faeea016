//! Dark channel prior dehazing
//!
//! Haze-free outdoor (and most underwater) patches have at least one channel
//! close to zero. Where the local minimum over all channels is high, the
//! pixel is veiled by scattered light. The stage:
//!
//! 1. computes the dark channel (per-pixel channel minimum, eroded by a
//!    square patch),
//! 2. averages the image pixels at the brightest 0.1% of the dark channel to
//!    get the atmospheric (veiling) light `A`,
//! 3. estimates transmission `t = 1 - omega * dark(I / A)`, floored and box
//!    blurred,
//! 4. recovers `J = (I - A) / t + A`,
//! 5. blends `I * (1 - strength) + J * strength`.

use crate::config::DehazeConfig;
use crate::constants::pipeline;
use crate::error::{CorrectionError, Result};
use crate::image_buffer;
use opencv::{
    core::{Mat, Size},
    imgproc::{self, MORPH_RECT},
    prelude::*,
};

/// Per-pixel channel minimum eroded over a `patch` x `patch` window
///
/// Returns a single-channel 8-bit `Mat`.
pub fn dark_channel(image: &Mat, patch: i32) -> Result<Mat> {
    let px = image_buffer::pixels(image)?;
    let minima: Vec<u8> = px.iter().map(|p| p[0].min(p[1]).min(p[2])).collect();
    let min_img = image_buffer::gray_u8(image.rows(), image.cols(), &minima)?;
    erode_square(&min_img, patch)
}

fn erode_square(src: &Mat, patch: i32) -> Result<Mat> {
    let kernel = imgproc::get_structuring_element_def(MORPH_RECT, Size::new(patch, patch))
        .map_err(|e| CorrectionError::opencv("structuring element", e))?;
    let mut eroded = Mat::default();
    imgproc::erode_def(src, &mut eroded, &kernel)
        .map_err(|e| CorrectionError::opencv("dark channel erosion", e))?;
    Ok(eroded)
}

/// Mean BGR color of the pixels with the brightest dark channel
///
/// Ties are broken by pixel index so the result is deterministic.
pub fn atmospheric_light(image: &Mat, dark: &Mat, top_fraction: f32) -> Result<[f32; 3]> {
    let px = image_buffer::pixels(image)?;
    let dark_values = dark
        .data_typed::<u8>()
        .map_err(|e| CorrectionError::opencv("dark channel access", e))?;
    if px.is_empty() || px.len() != dark_values.len() {
        return Err(CorrectionError::ProcessingError(format!(
            "dark channel size {} does not match image size {}",
            dark_values.len(),
            px.len()
        )));
    }

    let count = ((px.len() as f32 * top_fraction) as usize).max(1);
    let mut order: Vec<usize> = (0..px.len()).collect();
    order.sort_by(|&a, &b| dark_values[b].cmp(&dark_values[a]).then(a.cmp(&b)));

    let mut sums = [0f64; 3];
    for &i in order.iter().take(count) {
        for (c, sum) in sums.iter_mut().enumerate() {
            *sum += px[i][c] as f64;
        }
    }
    Ok(sums.map(|s| (s / count as f64) as f32))
}

/// Floored and smoothed transmission map as row-major floats
fn transmission(image: &Mat, atmosphere: [f32; 3], config: &DehazeConfig) -> Result<Vec<f32>> {
    let px = image_buffer::pixels(image)?;
    let a = atmosphere.map(|v| v.max(1.0));
    let normalized_min: Vec<f32> = px
        .iter()
        .map(|p| {
            (p[0] as f32 / a[0])
                .min(p[1] as f32 / a[1])
                .min(p[2] as f32 / a[2])
        })
        .collect();

    let min_img = image_buffer::gray_f32(image.rows(), image.cols(), &normalized_min)?;
    let dark = erode_square(&min_img, config.patch_size)?;
    let dark_values = dark
        .data_typed::<f32>()
        .map_err(|e| CorrectionError::opencv("transmission access", e))?;
    let raw: Vec<f32> = dark_values
        .iter()
        .map(|d| (1.0 - config.omega * d).clamp(config.transmission_floor, 1.0))
        .collect();

    let raw_img = image_buffer::gray_f32(image.rows(), image.cols(), &raw)?;
    let mut smoothed = Mat::default();
    let k = config.transmission_blur;
    imgproc::blur_def(&raw_img, &mut smoothed, Size::new(k, k))
        .map_err(|e| CorrectionError::opencv("transmission blur", e))?;

    let values = smoothed
        .data_typed::<f32>()
        .map_err(|e| CorrectionError::opencv("transmission access", e))?;
    Ok(values.to_vec())
}

/// Remove haze, blending the dehazed estimate in by `strength` in [0, 1]
///
/// # Errors
///
/// Returns `CorrectionError::InvalidImage` for non-BGR8 input and
/// `OpenCvError` when a kernel fails.
pub fn apply_dehaze(image: &Mat, strength: f32, config: &DehazeConfig) -> Result<Mat> {
    let mut out = image_buffer::owned_copy(image)?;
    if strength <= pipeline::IDENTITY_EPSILON {
        return Ok(out);
    }

    let dark = dark_channel(image, config.patch_size)?;
    let atmosphere = atmospheric_light(image, &dark, config.atmospheric_top_fraction)?;
    let t = transmission(image, atmosphere, config)?;

    let mean_t = t.iter().sum::<f32>() / t.len().max(1) as f32;
    log::info!(
        "Dehaze: atmospheric light B={:.1} G={:.1} R={:.1}, mean transmission {:.3}, strength {:.2}",
        atmosphere[0],
        atmosphere[1],
        atmosphere[2],
        mean_t,
        strength
    );

    let keep = 1.0 - strength;
    for (p, &ti) in image_buffer::pixels_mut(&mut out)?.iter_mut().zip(&t) {
        let ti = ti.max(config.transmission_floor);
        for c in 0..3 {
            let v = p[c] as f32;
            let recovered = ((v - atmosphere[c]) / ti + atmosphere[c]).clamp(0.0, 255.0);
            p[c] = image_buffer::to_u8(v * keep + recovered * strength);
        }
    }

    Ok(out)
}
