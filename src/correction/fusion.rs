//! Two-variant fusion
//!
//! When fusion is enabled the pipeline produces a dehazed variant and a
//! detail variant (unsharp-masked, not dehazed) and blends them here. With
//! `fusion_equalize` the detail variant is histogram-equalized on HSV value
//! before sharpening.
//!
//! - `Average`: equal weights
//! - `Weighted`: dehazed weight `clamp((1 - balance) * turbidity_compensation)`
//! - `Pca`: per channel, weights from the principal eigenvector of the 2x2
//!   covariance between the two variants

use crate::constants::pipeline;
use crate::error::{CorrectionError, Result};
use crate::image_buffer;
use crate::tuning::{FusionMethod, ProcessingParameters};
use opencv::{
    core::{self, Mat, Size, Vector},
    imgproc::{self, COLOR_BGR2HSV, COLOR_HSV2BGR},
    prelude::*,
};

/// Equalize the histogram of the HSV value channel, keeping hue and saturation
pub fn equalize_value(image: &Mat) -> Result<Mat> {
    image_buffer::validate(image)?;

    let mut hsv = Mat::default();
    imgproc::cvt_color_def(image, &mut hsv, COLOR_BGR2HSV)
        .map_err(|e| CorrectionError::opencv("HSV conversion", e))?;

    let mut channels = Vector::<Mat>::new();
    core::split(&hsv, &mut channels).map_err(|e| CorrectionError::opencv("HSV split", e))?;
    let value = channels
        .get(2)
        .map_err(|e| CorrectionError::opencv("HSV value channel", e))?;

    let mut equalized = Mat::default();
    imgproc::equalize_hist(&value, &mut equalized)
        .map_err(|e| CorrectionError::opencv("histogram equalization", e))?;
    channels
        .set(2, equalized)
        .map_err(|e| CorrectionError::opencv("HSV value channel", e))?;

    let mut merged = Mat::default();
    core::merge(&channels, &mut merged).map_err(|e| CorrectionError::opencv("HSV merge", e))?;
    let mut out = Mat::default();
    imgproc::cvt_color_def(&merged, &mut out, COLOR_HSV2BGR)
        .map_err(|e| CorrectionError::opencv("BGR conversion", e))?;
    Ok(out)
}

/// Sharpen with an unsharp mask: `img * (1 + amount) - blur(img) * amount`
pub fn unsharp_mask(image: &Mat, amount: f32, radius: f32) -> Result<Mat> {
    let mut out = image_buffer::owned_copy(image)?;
    if amount <= pipeline::IDENTITY_EPSILON {
        return Ok(out);
    }

    let mut blurred = Mat::default();
    imgproc::gaussian_blur_def(image, &mut blurred, Size::new(0, 0), radius as f64)
        .map_err(|e| CorrectionError::opencv("unsharp blur", e))?;
    let soft = image_buffer::pixels(&blurred)?;

    for (p, s) in image_buffer::pixels_mut(&mut out)?.iter_mut().zip(soft) {
        for c in 0..3 {
            let v = p[c] as f32 * (1.0 + amount) - s[c] as f32 * amount;
            p[c] = image_buffer::to_u8(v);
        }
    }
    Ok(out)
}

/// Principal-component weights for two sample streams
///
/// Weights are non-negative and sum to 1; degenerate covariance gives
/// `(0.5, 0.5)`.
pub fn pca_weights(a: &[u8], b: &[u8]) -> (f32, f32) {
    let n = a.len().min(b.len());
    if n < 2 {
        return (0.5, 0.5);
    }
    let mean_a = a.iter().take(n).map(|&v| v as f64).sum::<f64>() / n as f64;
    let mean_b = b.iter().take(n).map(|&v| v as f64).sum::<f64>() / n as f64;

    let (mut saa, mut sbb, mut sab) = (0f64, 0f64, 0f64);
    for (&x, &y) in a.iter().zip(b).take(n) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        saa += dx * dx;
        sbb += dy * dy;
        sab += dx * dy;
    }

    let half_trace = (saa + sbb) / 2.0;
    let lambda = half_trace + (((saa - sbb) / 2.0).powi(2) + sab * sab).sqrt();
    let v1 = (sab, lambda - saa);
    let v2 = (lambda - sbb, sab);
    let (mut x, mut y) = if v1.0.hypot(v1.1) >= v2.0.hypot(v2.1) { v1 } else { v2 };

    if x + y < 0.0 {
        x = -x;
        y = -y;
    }
    let (x, y) = (x.max(0.0), y.max(0.0));
    let sum = x + y;
    if sum <= f64::EPSILON || !sum.is_finite() {
        return (0.5, 0.5);
    }
    ((x / sum) as f32, (y / sum) as f32)
}

fn blend(a: &Mat, b: &Mat, weights: [(f32, f32); 3]) -> Result<Mat> {
    let mut out = image_buffer::owned_copy(a)?;
    let other = image_buffer::pixels(b)?;
    let out_px = image_buffer::pixels_mut(&mut out)?;
    if out_px.len() != other.len() {
        return Err(CorrectionError::ProcessingError(format!(
            "fusion variants differ in size: {} vs {}",
            out_px.len(),
            other.len()
        )));
    }
    for (p, q) in out_px.iter_mut().zip(other) {
        for c in 0..3 {
            let (wa, wb) = weights[c];
            p[c] = image_buffer::to_u8(p[c] as f32 * wa + q[c] as f32 * wb);
        }
    }
    Ok(out)
}

/// Fuse the dehazed and detail variants per `params.fusion_method`
pub fn fuse(dehazed: &Mat, detail: &Mat, params: &ProcessingParameters) -> Result<Mat> {
    let weights = match params.fusion_method {
        FusionMethod::Average => [(0.5, 0.5); 3],
        FusionMethod::Weighted => {
            let w = ((1.0 - params.fusion_balance) * params.turbidity_compensation).clamp(0.0, 1.0);
            [(w, 1.0 - w); 3]
        }
        FusionMethod::Pca => {
            let a = image_buffer::pixels(dehazed)?;
            let b = image_buffer::pixels(detail)?;
            let mut weights = [(0.5, 0.5); 3];
            for (c, w) in weights.iter_mut().enumerate() {
                let ca: Vec<u8> = a.iter().map(|p| p[c]).collect();
                let cb: Vec<u8> = b.iter().map(|p| p[c]).collect();
                *w = pca_weights(&ca, &cb);
            }
            weights
        }
    };

    log::info!(
        "Fusion ({:?}): dehazed weights B={:.3} G={:.3} R={:.3}",
        params.fusion_method,
        weights[0].0,
        weights[1].0,
        weights[2].0
    );
    blend(dehazed, detail, weights)
}
