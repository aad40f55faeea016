//! White balance stage
//!
//! Computes one gain per channel with the selected method and applies it
//! through per-channel lookup tables, blended with the input by strength:
//! `out = in * (1 - s) + clamp(in * gain) * s`. Strength 0 is an exact
//! passthrough; strengths above 1 overshoot the correction.

use crate::constants::{numeric, pipeline};
use crate::error::{CorrectionError, Result};
use crate::image_buffer::{self, ChannelLuts};
use crate::tuning::{ProcessingParameters, WhiteBalanceMethod};
use opencv::{core::Mat, imgproc, prelude::*};

/// 256-bin histogram of one 8-bit sample stream
type Histogram = [u64; 256];

fn channel_histograms(image: &Mat) -> Result<[Histogram; 3]> {
    let mut hists = [[0u64; 256]; 3];
    for p in image_buffer::pixels(image)? {
        for (c, hist) in hists.iter_mut().enumerate() {
            hist[p[c] as usize] += 1;
        }
    }
    Ok(hists)
}

fn gray_histogram(image: &Mat) -> Result<Histogram> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(image, &mut gray, imgproc::COLOR_BGR2GRAY)
        .map_err(|e| CorrectionError::opencv("grayscale conversion", e))?;
    let mut hist = [0u64; 256];
    for &v in gray
        .data_typed::<u8>()
        .map_err(|e| CorrectionError::opencv("gray pixel access", e))?
    {
        hist[v as usize] += 1;
    }
    Ok(hist)
}

/// Sample value at `percentile` (0-100), nearest-rank on the histogram
pub fn percentile(hist: &Histogram, percentile: f32) -> u8 {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 0;
    }
    let rank = ((percentile.clamp(0.0, 100.0) / 100.0) * (total - 1) as f32).round() as u64;
    let mut seen = 0u64;
    for (value, &count) in hist.iter().enumerate() {
        seen += count;
        if seen > rank {
            return value as u8;
        }
    }
    255
}

/// Mean of the samples between two percentiles (inclusive)
pub fn trimmed_mean(hist: &Histogram, lower: f32, upper: f32) -> f32 {
    let low = percentile(hist, lower) as usize;
    let high = percentile(hist, upper) as usize;
    let (mut sum, mut count) = (0f64, 0u64);
    for (value, &n) in hist.iter().enumerate().take(high + 1).skip(low) {
        sum += value as f64 * n as f64;
        count += n;
    }
    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

fn gain_to(reference: f32, mean: f32) -> f32 {
    if mean > numeric::RATIO_EPSILON {
        reference / mean
    } else {
        numeric::NEUTRAL_RATIO
    }
}

/// Per-channel (BGR) gains for the configured method
pub fn channel_gains(image: &Mat, params: &ProcessingParameters) -> Result<[f32; 3]> {
    let hists = channel_histograms(image)?;
    let (lower, upper) = (params.robust_lower_percentile, params.robust_upper_percentile);

    let gains = match params.white_balance_method {
        WhiteBalanceMethod::Robust => {
            let means = [0, 1, 2].map(|c| trimmed_mean(&hists[c], lower, upper));
            let gray = means.iter().sum::<f32>() / 3.0;
            means.map(|m| gain_to(gray, m))
        }
        WhiteBalanceMethod::GrayWorld => {
            let reference = trimmed_mean(&gray_histogram(image)?, lower, upper);
            [0, 1, 2].map(|c| gain_to(reference, trimmed_mean(&hists[c], lower, upper)))
        }
        WhiteBalanceMethod::WhitePatch => [0, 1, 2].map(|c| {
            let bright = percentile(&hists[c], params.white_patch_percentile) as f32;
            gain_to(255.0, bright)
        }),
    };

    Ok(gains)
}

/// Apply white balance per the parameters' method and strength
pub fn apply_white_balance(image: &Mat, params: &ProcessingParameters) -> Result<Mat> {
    let strength = params.white_balance_strength;
    if !params.white_balance_enabled || strength <= pipeline::IDENTITY_EPSILON {
        return image_buffer::owned_copy(image);
    }

    let gains = channel_gains(image, params)?;
    log::info!(
        "White balance ({:?}, strength {:.2}): gains B={:.3} G={:.3} R={:.3}",
        params.white_balance_method,
        strength,
        gains[0],
        gains[1],
        gains[2]
    );

    let luts: ChannelLuts = gains.map(|gain| {
        image_buffer::build_lut(|v| v * (1.0 - strength) + (v * gain).clamp(0.0, 255.0) * strength)
    });
    image_buffer::apply_luts(image, &luts)
}
