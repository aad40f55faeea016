//! Channel-ratio and haze statistics of an underwater image
//!
//! Measures how strongly the green channel dominates red and blue, how much
//! of the frame is green by hue, and how hazy/turbid the scene looks. The
//! classifier and the auto-tuner consume these numbers; nothing here
//! decides anything.
//!
//! Color statistics are computed on a downsample whose longest side is
//! [`AnalysisConfig::max_dimension`]; means and ratios do not depend on the
//! downsample factor. The edge and haze terms work in pixel units, so they
//! are measured on a separate copy shrunk to
//! [`AnalysisConfig::structure_dimension`], independent of `max_dimension`.

use crate::config::AnalysisConfig;
use crate::constants::{analysis, numeric};
use crate::correction::dehaze::dark_channel;
use crate::error::{CorrectionError, Result};
use crate::image_buffer;
use opencv::{
    core::{Mat, Size, CV_64F},
    imgproc::{self, COLOR_BGR2GRAY, COLOR_BGR2HSV, INTER_AREA},
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// Mean value of each color channel (0-255 scale)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeans {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// Everything the analyzer measures about one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStatistics {
    /// Relative excess of green over red/blue, blended with green pixel share [0, 1]
    pub green_dominance: f32,
    /// Green share of summed channel means [0, 1]
    pub green_ratio: f32,
    /// Green-to-red channel mean ratio
    pub g_to_r_ratio: f32,
    /// Green-to-blue channel mean ratio
    pub g_to_b_ratio: f32,
    /// Blue-to-red channel mean ratio
    pub b_to_r_ratio: f32,
    /// Fraction of pixels whose hue falls in the green band [0, 1]
    pub green_pixel_ratio: f32,
    /// Scattering proxy from edge deficit and dark channel haze [0, 1]
    pub turbidity_indicator: f32,
    /// Mean dark channel value / 255
    pub haze_level: f32,
    /// Mean HSV saturation (0-255)
    pub saturation_mean: f32,
    /// Variance of the Laplacian of the gray image
    pub contrast: f32,
    /// Mean gray intensity (0-255)
    pub mean_intensity: f32,
    /// Standard deviation of gray intensity
    pub std_intensity: f32,
    /// Standard deviation of the three channel means
    pub color_cast: f32,
    /// Per-channel means
    pub channel_means: ChannelMeans,
}

/// Scene measurements used by the auto-tuner beyond the water classification
///
/// Unlike the classification statistics these are always measured from the
/// image, including when the user forces a water type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneMetrics {
    pub haze_level: f32,
    pub saturation_mean: f32,
    pub contrast: f32,
    pub mean_intensity: f32,
    pub color_cast: f32,
}

impl Default for SceneMetrics {
    /// A mid-gray, moderately hazy scene
    fn default() -> Self {
        Self {
            haze_level: 0.3,
            saturation_mean: 100.0,
            contrast: 300.0,
            mean_intensity: 128.0,
            color_cast: 10.0,
        }
    }
}

impl From<&ImageStatistics> for SceneMetrics {
    fn from(stats: &ImageStatistics) -> Self {
        Self {
            haze_level: stats.haze_level,
            saturation_mean: stats.saturation_mean,
            contrast: stats.contrast,
            mean_intensity: stats.mean_intensity,
            color_cast: stats.color_cast,
        }
    }
}

/// Divide, falling back to the neutral ratio when the denominator vanishes
#[inline]
pub fn safe_ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator.abs() < numeric::RATIO_EPSILON {
        numeric::NEUTRAL_RATIO
    } else {
        numerator / denominator
    }
}

/// Image statistics analyzer
pub struct ImageAnalyzer {
    config: AnalysisConfig,
}

impl Default for ImageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageAnalyzer {
    /// Create an analyzer with default parameters
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    /// Create an analyzer with custom parameters
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Measure channel ratios, green content and haze of a BGR image
    ///
    /// # Errors
    ///
    /// Returns `CorrectionError::InvalidImage` for empty or non-BGR8 input.
    /// Degenerate statistics (black images, missing channels) never fail.
    pub fn analyze(&self, image: &Mat) -> Result<ImageStatistics> {
        image_buffer::validate(image)?;
        let small = shrink_to(image, self.config.max_dimension)?;
        let resized;
        let structure = if self.config.structure_dimension == self.config.max_dimension {
            &small
        } else {
            resized = shrink_to(image, self.config.structure_dimension)?;
            &resized
        };

        let [b, g, r] = image_buffer::channel_means(&small)?.map(|v| v as f32);
        let total = r + g + b;
        let green_ratio = if total < numeric::RATIO_EPSILON {
            numeric::NEUTRAL_GREEN_RATIO
        } else {
            g / total
        };
        let g_to_r_ratio = safe_ratio(g, r);
        let g_to_b_ratio = safe_ratio(g, b);
        let b_to_r_ratio = safe_ratio(b, r);

        let (green_pixel_ratio, saturation_mean) = self.hue_statistics(&small)?;
        let (mean_intensity, std_intensity) = gray_mean_std(&to_gray(&small)?)?;
        let contrast = laplacian_variance(&to_gray(structure)?)?;
        let haze_level = self.haze_level(structure)?;

        let green_excess = if g < numeric::RATIO_EPSILON {
            0.0
        } else {
            ((g - (r + b) / 2.0) / g).clamp(0.0, 1.0)
        };
        let green_dominance = (analysis::DOMINANCE_EXCESS_WEIGHT * green_excess
            + analysis::DOMINANCE_PIXEL_WEIGHT * green_pixel_ratio)
            .clamp(0.0, 1.0);

        let edge_deficit = (1.0 - contrast.sqrt() / self.config.laplacian_clear_std).clamp(0.0, 1.0);
        let turbidity_indicator = (analysis::TURBIDITY_EDGE_WEIGHT * edge_deficit
            + analysis::TURBIDITY_HAZE_WEIGHT * haze_level)
            .clamp(0.0, 1.0);

        let mean_of_means = total / 3.0;
        let color_cast = (([r, g, b]
            .iter()
            .map(|m| (m - mean_of_means).powi(2))
            .sum::<f32>())
            / 3.0)
            .sqrt();

        let stats = ImageStatistics {
            green_dominance,
            green_ratio: green_ratio.clamp(0.0, 1.0),
            g_to_r_ratio,
            g_to_b_ratio,
            b_to_r_ratio,
            green_pixel_ratio,
            turbidity_indicator,
            haze_level,
            saturation_mean,
            contrast,
            mean_intensity,
            std_intensity,
            color_cast,
            channel_means: ChannelMeans {
                red: r,
                green: g,
                blue: b,
            },
        };

        log::debug!(
            "Image statistics: means R={:.1} G={:.1} B={:.1}, dominance={:.3}, G/R={:.2}, turbidity={:.3}, haze={:.3}",
            r,
            g,
            b,
            stats.green_dominance,
            stats.g_to_r_ratio,
            stats.turbidity_indicator,
            stats.haze_level
        );

        Ok(stats)
    }

    /// Green hue share and mean saturation from HSV
    fn hue_statistics(&self, image: &Mat) -> Result<(f32, f32)> {
        let mut hsv = Mat::default();
        imgproc::cvt_color_def(image, &mut hsv, COLOR_BGR2HSV)
            .map_err(|e| CorrectionError::opencv("HSV conversion", e))?;

        let px = image_buffer::pixels(&hsv)?;
        if px.is_empty() {
            return Ok((0.0, 0.0));
        }

        let mut green = 0usize;
        let mut saturation_sum = 0u64;
        for p in px {
            let (hue, sat) = (p[0], p[1]);
            saturation_sum += sat as u64;
            if hue >= self.config.green_hue_min
                && hue <= self.config.green_hue_max
                && sat > self.config.green_min_saturation
            {
                green += 1;
            }
        }

        let n = px.len() as f32;
        Ok((green as f32 / n, saturation_sum as f32 / n))
    }

    /// Mean dark channel, normalized to [0, 1]
    fn haze_level(&self, image: &Mat) -> Result<f32> {
        let dark = dark_channel(image, self.config.haze_patch_size)?;
        let values = dark
            .data_typed::<u8>()
            .map_err(|e| CorrectionError::opencv("dark channel access", e))?;
        if values.is_empty() {
            return Ok(0.0);
        }
        let sum: u64 = values.iter().map(|&v| v as u64).sum();
        Ok(sum as f32 / values.len() as f32 / 255.0)
    }
}

/// Shrink large images so the longest side is at most `max_dim` (0 keeps size)
fn shrink_to(image: &Mat, max_dim: i32) -> Result<Mat> {
    let longest = image.rows().max(image.cols());
    if max_dim <= 0 || longest <= max_dim {
        return image_buffer::owned_copy(image);
    }

    let scale = max_dim as f64 / longest as f64;
    let width = ((image.cols() as f64 * scale).round() as i32).max(1);
    let height = ((image.rows() as f64 * scale).round() as i32).max(1);

    let mut small = Mat::default();
    imgproc::resize(image, &mut small, Size::new(width, height), 0.0, 0.0, INTER_AREA)
        .map_err(|e| CorrectionError::opencv("analysis downsample", e))?;
    Ok(small)
}

fn to_gray(image: &Mat) -> Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color_def(image, &mut gray, COLOR_BGR2GRAY)
        .map_err(|e| CorrectionError::opencv("grayscale conversion", e))?;
    Ok(gray)
}

fn gray_mean_std(gray: &Mat) -> Result<(f32, f32)> {
    let values = gray
        .data_typed::<u8>()
        .map_err(|e| CorrectionError::opencv("gray pixel access", e))?;
    if values.is_empty() {
        return Ok((0.0, 0.0));
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    Ok((mean as f32, var.sqrt() as f32))
}

/// Variance of the Laplacian, a standard sharpness/contrast measure
fn laplacian_variance(gray: &Mat) -> Result<f32> {
    let mut lap = Mat::default();
    imgproc::laplacian_def(gray, &mut lap, CV_64F)
        .map_err(|e| CorrectionError::opencv("Laplacian", e))?;
    let values = lap
        .data_typed::<f64>()
        .map_err(|e| CorrectionError::opencv("Laplacian access", e))?;
    if values.is_empty() {
        return Ok(0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Ok(var as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn checker(rows: i32, cols: i32, a: [u8; 3], b: [u8; 3]) -> Mat {
        checker_squares(rows, cols, 4, a, b)
    }

    fn checker_squares(rows: i32, cols: i32, square: i32, a: [u8; 3], b: [u8; 3]) -> Mat {
        let data: Vec<[u8; 3]> = (0..rows * cols)
            .map(|i| {
                if ((i / cols) / square + (i % cols) / square) % 2 == 0 {
                    a
                } else {
                    b
                }
            })
            .collect();
        image_buffer::from_bgr_pixels(rows, cols, &data).unwrap()
    }

    #[test]
    fn test_safe_ratio_guards_zero() {
        assert_eq!(safe_ratio(10.0, 0.0), 1.0);
        assert_eq!(safe_ratio(0.0, 0.0), 1.0);
        assert_eq!(safe_ratio(3.0, 2.0), 1.5);
    }

    #[test]
    fn test_black_image_is_finite() {
        let black = image_buffer::uniform(32, 32, [0, 0, 0]).unwrap();
        let stats = ImageAnalyzer::new().analyze(&black).unwrap();
        assert_eq!(stats.g_to_r_ratio, 1.0);
        assert_eq!(stats.g_to_b_ratio, 1.0);
        assert_abs_diff_eq!(stats.green_ratio, 1.0 / 3.0, epsilon = 1e-6);
        assert_eq!(stats.green_dominance, 0.0);
        assert!(stats.turbidity_indicator.is_finite());
    }

    #[test]
    fn test_missing_red_channel_uses_neutral_ratio() {
        let img = image_buffer::uniform(16, 16, [90, 140, 0]).unwrap();
        let stats = ImageAnalyzer::new().analyze(&img).unwrap();
        assert_eq!(stats.g_to_r_ratio, 1.0);
        assert_abs_diff_eq!(stats.g_to_b_ratio, 140.0 / 90.0, epsilon = 1e-4);
    }

    #[test]
    fn test_green_image_dominance() {
        // BGR: strongly green lake water
        let img = image_buffer::uniform(32, 32, [80, 150, 40]).unwrap();
        let stats = ImageAnalyzer::new().analyze(&img).unwrap();
        assert!(stats.green_dominance > 0.5, "dominance {}", stats.green_dominance);
        assert!(stats.green_pixel_ratio > 0.9);
        assert!(stats.g_to_r_ratio > 3.0);
    }

    #[test]
    fn test_gray_image_has_no_dominance() {
        let img = image_buffer::uniform(32, 32, [120, 120, 120]).unwrap();
        let stats = ImageAnalyzer::new().analyze(&img).unwrap();
        assert_eq!(stats.green_dominance, 0.0);
        assert_abs_diff_eq!(stats.green_ratio, 1.0 / 3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(stats.color_cast, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_flat_image_is_turbid() {
        let flat = image_buffer::uniform(32, 32, [150, 150, 150]).unwrap();
        let crisp = checker(32, 32, [10, 10, 10], [240, 240, 240]);
        let analyzer = ImageAnalyzer::new();
        let flat_stats = analyzer.analyze(&flat).unwrap();
        let crisp_stats = analyzer.analyze(&crisp).unwrap();
        assert!(flat_stats.turbidity_indicator > crisp_stats.turbidity_indicator);
        assert!(crisp_stats.contrast > flat_stats.contrast);
    }

    #[test]
    fn test_downsample_stability() {
        let big = checker(256, 256, [60, 140, 50], [90, 170, 70]);
        let full = ImageAnalyzer::with_config(AnalysisConfig {
            max_dimension: 0,
            ..AnalysisConfig::default()
        })
        .analyze(&big)
        .unwrap();
        let half = ImageAnalyzer::with_config(AnalysisConfig {
            max_dimension: 128,
            ..AnalysisConfig::default()
        })
        .analyze(&big)
        .unwrap();

        assert_abs_diff_eq!(full.green_ratio, half.green_ratio, epsilon = 0.02);
        assert_abs_diff_eq!(full.g_to_r_ratio, half.g_to_r_ratio, epsilon = 0.02);
        assert_abs_diff_eq!(full.green_dominance, half.green_dominance, epsilon = 0.02);
        assert_abs_diff_eq!(full.turbidity_indicator, half.turbidity_indicator, epsilon = 0.02);
        assert_abs_diff_eq!(full.haze_level, half.haze_level, epsilon = 0.02);
    }

    #[test]
    fn test_turbidity_independent_of_source_resolution() {
        // Same scene rendered at two resolutions
        let (a, b) = ([60, 140, 50], [90, 170, 70]);
        let low = checker_squares(256, 256, 8, a, b);
        let high = checker_squares(512, 512, 16, a, b);
        let analyzer = ImageAnalyzer::with_config(AnalysisConfig {
            structure_dimension: 128,
            ..AnalysisConfig::default()
        });
        let low = analyzer.analyze(&low).unwrap();
        let high = analyzer.analyze(&high).unwrap();

        assert_abs_diff_eq!(low.turbidity_indicator, high.turbidity_indicator, epsilon = 0.02);
        assert_abs_diff_eq!(low.haze_level, high.haze_level, epsilon = 0.02);
        assert_abs_diff_eq!(low.green_ratio, high.green_ratio, epsilon = 0.02);
    }

    #[test]
    fn test_invalid_image_rejected() {
        let err = ImageAnalyzer::new().analyze(&Mat::default()).unwrap_err();
        assert!(matches!(err, CorrectionError::InvalidImage { .. }));
    }

    #[test]
    fn test_deterministic() {
        let img = checker(40, 30, [100, 160, 60], [20, 60, 30]);
        let analyzer = ImageAnalyzer::new();
        assert_eq!(analyzer.analyze(&img).unwrap(), analyzer.analyze(&img).unwrap());
    }
}
