//! BGR image buffer helpers
//!
//! The crate works on OpenCV `Mat` buffers of type `CV_8UC3` in BGR order.
//! This module validates incoming buffers, builds new ones from raw pixel
//! data, and exposes typed pixel slices so stages can do per-pixel math
//! without going through `at_2d` for every access.

use crate::error::{CorrectionError, Result};
use opencv::core::{Mat, Scalar, Vec3b, CV_32FC1, CV_8UC1, CV_8UC3};
use opencv::prelude::*;

/// Per-channel 8-bit lookup tables in BGR order
pub type ChannelLuts = [[u8; 256]; 3];

/// Reject buffers the pipeline cannot process
///
/// # Errors
///
/// Returns `CorrectionError::InvalidImage` for empty buffers and anything
/// that is not 3-channel 8-bit.
pub fn validate(image: &Mat) -> Result<()> {
    if image.empty() || image.rows() == 0 || image.cols() == 0 {
        return Err(CorrectionError::invalid_image("image has zero size"));
    }
    if image.channels() != 3 {
        return Err(CorrectionError::invalid_image(format!(
            "expected 3 channels, got {}",
            image.channels()
        )));
    }
    if image.typ() != CV_8UC3 {
        return Err(CorrectionError::invalid_image(format!(
            "expected 8-bit channels, got OpenCV type {}",
            image.typ()
        )));
    }
    Ok(())
}

/// Validate and copy into a freshly allocated continuous buffer
///
/// The copy keeps the caller's buffer untouched by everything downstream.
pub fn owned_copy(image: &Mat) -> Result<Mat> {
    validate(image)?;
    image
        .try_clone()
        .map_err(|e| CorrectionError::opencv("Mat clone", e))
}

/// Copy a view that may not be continuous (a ROI, say) into its own buffer
pub fn continuous_copy(image: &Mat) -> Result<Mat> {
    validate(image)?;
    let mut copy = Mat::default();
    image
        .copy_to(&mut copy)
        .map_err(|e| CorrectionError::opencv("Mat copy", e))?;
    Ok(copy)
}

/// Borrow the pixels of a continuous BGR buffer
pub fn pixels(image: &Mat) -> Result<&[Vec3b]> {
    image
        .data_typed::<Vec3b>()
        .map_err(|e| CorrectionError::opencv("BGR pixel access", e))
}

/// Mutably borrow the pixels of a continuous BGR buffer
pub fn pixels_mut(image: &mut Mat) -> Result<&mut [Vec3b]> {
    image
        .data_typed_mut::<Vec3b>()
        .map_err(|e| CorrectionError::opencv("BGR pixel access", e))
}

/// Create a BGR buffer filled with one color
pub fn uniform(rows: i32, cols: i32, bgr: [u8; 3]) -> Result<Mat> {
    Mat::new_rows_cols_with_default(
        rows,
        cols,
        CV_8UC3,
        Scalar::new(bgr[0] as f64, bgr[1] as f64, bgr[2] as f64, 0.0),
    )
    .map_err(|e| CorrectionError::opencv("Mat allocation", e))
}

/// Create a BGR buffer from row-major `[b, g, r]` pixels
pub fn from_bgr_pixels(rows: i32, cols: i32, data: &[[u8; 3]]) -> Result<Mat> {
    let expected = (rows.max(0) as usize) * (cols.max(0) as usize);
    if data.len() != expected {
        return Err(CorrectionError::InvalidParameter {
            parameter: "pixel data length".to_string(),
            value: format!("{} (expected {})", data.len(), expected),
        });
    }

    let mut mat = uniform(rows, cols, [0, 0, 0])?;
    for (dst, src) in pixels_mut(&mut mat)?.iter_mut().zip(data) {
        dst[0] = src[0];
        dst[1] = src[1];
        dst[2] = src[2];
    }
    Ok(mat)
}

/// Create a single-channel 8-bit buffer from row-major data
pub fn gray_u8(rows: i32, cols: i32, data: &[u8]) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(0.0))
        .map_err(|e| CorrectionError::opencv("Mat allocation", e))?;
    let dst = mat
        .data_typed_mut::<u8>()
        .map_err(|e| CorrectionError::opencv("gray pixel access", e))?;
    dst.copy_from_slice(data);
    Ok(mat)
}

/// Create a single-channel float buffer from row-major data
pub fn gray_f32(rows: i32, cols: i32, data: &[f32]) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(rows, cols, CV_32FC1, Scalar::all(0.0))
        .map_err(|e| CorrectionError::opencv("Mat allocation", e))?;
    let dst = mat
        .data_typed_mut::<f32>()
        .map_err(|e| CorrectionError::opencv("float pixel access", e))?;
    dst.copy_from_slice(data);
    Ok(mat)
}

/// Apply one lookup table per channel, returning a new buffer
pub fn apply_luts(image: &Mat, luts: &ChannelLuts) -> Result<Mat> {
    let mut out = owned_copy(image)?;
    for px in pixels_mut(&mut out)?.iter_mut() {
        for c in 0..3 {
            px[c] = luts[c][px[c] as usize];
        }
    }
    Ok(out)
}

/// Build a lookup table from a float transfer function, clamped to 8-bit
pub fn build_lut(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = to_u8(f(i as f32));
    }
    lut
}

/// The identity lookup table
pub fn identity_lut() -> [u8; 256] {
    build_lut(|v| v)
}

/// Round and clamp a float sample to 8-bit
#[inline]
pub fn to_u8(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.round().clamp(0.0, 255.0) as u8
    }
}

/// Per-channel means in BGR order
pub fn channel_means(image: &Mat) -> Result<[f64; 3]> {
    let px = pixels(image)?;
    if px.is_empty() {
        return Ok([0.0; 3]);
    }
    let mut sums = [0u64; 3];
    for p in px {
        sums[0] += p[0] as u64;
        sums[1] += p[1] as u64;
        sums[2] += p[2] as u64;
    }
    let n = px.len() as f64;
    Ok([sums[0] as f64 / n, sums[1] as f64 / n, sums[2] as f64 / n])
}

/// Exact pixel equality of two BGR buffers
pub fn same_pixels(a: &Mat, b: &Mat) -> Result<bool> {
    if a.rows() != b.rows() || a.cols() != b.cols() || a.typ() != b.typ() {
        return Ok(false);
    }
    Ok(max_abs_diff(a, b)? == 0)
}

/// Largest per-sample absolute difference between two BGR buffers
pub fn max_abs_diff(a: &Mat, b: &Mat) -> Result<u8> {
    let pa = pixels(a)?;
    let pb = pixels(b)?;
    if pa.len() != pb.len() {
        return Err(CorrectionError::InvalidParameter {
            parameter: "buffer size".to_string(),
            value: format!("{} vs {}", pa.len(), pb.len()),
        });
    }
    let mut max = 0u8;
    for (x, y) in pa.iter().zip(pb) {
        for c in 0..3 {
            max = max.max(x[c].abs_diff(y[c]));
        }
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty() {
        let err = validate(&Mat::default()).unwrap_err();
        assert!(matches!(err, CorrectionError::InvalidImage { .. }));
    }

    #[test]
    fn test_validate_rejects_single_channel() {
        let gray = gray_u8(2, 2, &[1, 2, 3, 4]).unwrap();
        let err = validate(&gray).unwrap_err();
        assert!(err.to_string().contains("3 channels"));
    }

    #[test]
    fn test_from_bgr_pixels_layout() {
        let mat = from_bgr_pixels(1, 2, &[[1, 2, 3], [4, 5, 6]]).unwrap();
        let px = pixels(&mat).unwrap();
        assert_eq!(px[1][0], 4);
        assert_eq!(px[1][2], 6);
        assert!(validate(&mat).is_ok());
    }

    #[test]
    fn test_from_bgr_pixels_length_mismatch() {
        assert!(from_bgr_pixels(2, 2, &[[0, 0, 0]]).is_err());
    }

    #[test]
    fn test_identity_lut_is_identity() {
        let mat = from_bgr_pixels(1, 3, &[[0, 128, 255], [7, 8, 9], [200, 100, 50]]).unwrap();
        let luts = [identity_lut(); 3];
        let out = apply_luts(&mat, &luts).unwrap();
        assert!(same_pixels(&mat, &out).unwrap());
    }

    #[test]
    fn test_channel_means() {
        let mat = from_bgr_pixels(1, 2, &[[10, 20, 30], [30, 40, 50]]).unwrap();
        let means = channel_means(&mat).unwrap();
        assert_eq!(means, [20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_to_u8_clamps_and_rounds() {
        assert_eq!(to_u8(-3.0), 0);
        assert_eq!(to_u8(300.0), 255);
        assert_eq!(to_u8(12.5), 13);
        assert_eq!(to_u8(f32::NAN), 0);
    }
}
