//! Local contrast enhancement
//!
//! CLAHE on the L channel of CIE Lab, so contrast is lifted without shifting
//! hue. The clip limit bounds how much a tile's histogram may be stretched,
//! which keeps noise in flat water from being amplified.

use crate::config::ContrastConfig;
use crate::error::{CorrectionError, Result};
use crate::image_buffer;
use opencv::{
    core::{self, Mat, Size, Vector},
    imgproc::{self, COLOR_BGR2Lab, COLOR_Lab2BGR},
    prelude::*,
};

/// Apply CLAHE to luminance with the given clip limit
///
/// # Errors
///
/// Returns `OpenCvError` if color conversion or CLAHE fails.
pub fn apply_clahe(image: &Mat, clip_limit: f32, config: &ContrastConfig) -> Result<Mat> {
    image_buffer::validate(image)?;

    let mut lab = Mat::default();
    imgproc::cvt_color_def(image, &mut lab, COLOR_BGR2Lab)
        .map_err(|e| CorrectionError::opencv("Lab conversion", e))?;

    let mut channels = Vector::<Mat>::new();
    core::split(&lab, &mut channels).map_err(|e| CorrectionError::opencv("Lab split", e))?;
    let lightness = channels
        .get(0)
        .map_err(|e| CorrectionError::opencv("Lab L channel", e))?;

    let grid = config.tile_grid;
    let mut clahe = imgproc::create_clahe(clip_limit as f64, Size::new(grid, grid))
        .map_err(|e| CorrectionError::opencv("CLAHE creation", e))?;
    let mut equalized = Mat::default();
    clahe
        .apply(&lightness, &mut equalized)
        .map_err(|e| CorrectionError::opencv("CLAHE", e))?;

    channels
        .set(0, equalized)
        .map_err(|e| CorrectionError::opencv("Lab L channel", e))?;
    let mut merged = Mat::default();
    core::merge(&channels, &mut merged).map_err(|e| CorrectionError::opencv("Lab merge", e))?;

    let mut out = Mat::default();
    imgproc::cvt_color_def(&merged, &mut out, COLOR_Lab2BGR)
        .map_err(|e| CorrectionError::opencv("BGR conversion", e))?;

    log::debug!("CLAHE applied (clip {:.2}, grid {}x{})", clip_limit, grid, grid);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn low_contrast() -> Mat {
        let data: Vec<[u8; 3]> = (0..64 * 64)
            .map(|i| {
                let v = 110 + ((i % 64) / 8) as u8 * 2;
                [v, v + 10, v - 20]
            })
            .collect();
        image_buffer::from_bgr_pixels(64, 64, &data).unwrap()
    }

    fn gray_spread(img: &Mat) -> u8 {
        let px = image_buffer::pixels(img).unwrap();
        let g: Vec<u8> = px.iter().map(|p| p[1]).collect();
        g.iter().max().unwrap() - g.iter().min().unwrap()
    }

    #[test]
    fn test_clahe_stretches_flat_image() {
        let img = low_contrast();
        let out = apply_clahe(&img, 3.0, &ContrastConfig::default()).unwrap();
        assert!(gray_spread(&out) > gray_spread(&img));
        assert!(image_buffer::validate(&out).is_ok());
    }

    #[test]
    fn test_clahe_deterministic() {
        let img = low_contrast();
        let a = apply_clahe(&img, 2.5, &ContrastConfig::default()).unwrap();
        let b = apply_clahe(&img, 2.5, &ContrastConfig::default()).unwrap();
        assert!(image_buffer::same_pixels(&a, &b).unwrap());
    }
}
