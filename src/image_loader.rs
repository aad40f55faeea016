//! Image file decoding and encoding for driver programs
//!
//! The correction core never touches the filesystem; this module is the
//! collaborator that turns files into BGR `Mat` buffers and back. Decoding
//! and encoding go through the `image` crate.
//!
//! ## Supported Formats
//!
//! - JPEG, PNG, GIF (first frame), WebP, TIFF, BMP, TGA, PNM, QOI
//!
//! Alpha channels are dropped on load and 16-bit images are reduced to 8-bit.

use crate::error::{CorrectionError, Result};
use crate::image_buffer;
use opencv::core::Mat;
use opencv::prelude::*;
use std::path::Path;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    /// GIF image (first frame only)
    Gif,
    WebP,
    Tiff,
    Bmp,
    Tga,
    /// PNM image (PBM, PGM, PPM)
    Pnm,
    Qoi,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::WebP),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            "bmp" => Some(ImageFormat::Bmp),
            "tga" => Some(ImageFormat::Tga),
            "pbm" | "pgm" | "ppm" | "pnm" => Some(ImageFormat::Pnm),
            "qoi" => Some(ImageFormat::Qoi),
            _ => None,
        }
    }

    /// Whether corrected output can be written in this format
    ///
    /// GIF is palette-based and would quantize the corrected colors.
    pub fn supports_output(&self) -> bool {
        !matches!(self, ImageFormat::Gif)
    }
}

/// Load an image from disk as a BGR `Mat`
///
/// # Errors
///
/// Returns `CorrectionError::ImageLoadError` if the file cannot be opened,
/// has an unknown extension, or fails to decode.
///
/// # Example
///
/// ```rust,no_run
/// use underwater_color::image_loader::load_image;
/// use std::path::Path;
///
/// let mat = load_image(Path::new("reef.jpg"))?;
/// # Ok::<(), underwater_color::CorrectionError>(())
/// ```
pub fn load_image(path: &Path) -> Result<Mat> {
    use image::ImageReader;

    if ImageFormat::from_extension(path).is_none() {
        return Err(CorrectionError::ImageLoadError {
            message: format!("Unknown image format for file: {}", path.display()),
            source: None,
        });
    }

    let reader = ImageReader::open(path).map_err(|e| {
        CorrectionError::image_load(format!("Failed to open image file: {}", path.display()), e)
    })?;
    let img = reader.decode().map_err(|e| {
        CorrectionError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    log::debug!("Loaded {} ({}x{})", path.display(), width, height);
    rgb_to_bgr_mat(&rgb.into_raw(), width as i32, height as i32)
}

/// Write a BGR `Mat` to disk; the format follows the file extension
///
/// # Errors
///
/// Returns `InvalidImage` for a non-BGR8 buffer and `ImageLoadError` when
/// the extension is unsupported or encoding fails.
pub fn save_image(image: &Mat, path: &Path) -> Result<()> {
    match ImageFormat::from_extension(path) {
        Some(format) if format.supports_output() => {}
        _ => {
            return Err(CorrectionError::ImageLoadError {
                message: format!("Unsupported output format for file: {}", path.display()),
                source: None,
            })
        }
    }

    let rgb_data = bgr_mat_to_rgb(image)?;
    let buffer = image::RgbImage::from_raw(image.cols() as u32, image.rows() as u32, rgb_data)
        .ok_or_else(|| {
            CorrectionError::ProcessingError("pixel buffer does not match image size".into())
        })?;
    buffer.save(path).map_err(|e| {
        CorrectionError::image_load(format!("Failed to write image: {}", path.display()), e)
    })?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Convert an interleaved RGB byte buffer to a BGR `Mat`
fn rgb_to_bgr_mat(rgb_data: &[u8], width: i32, height: i32) -> Result<Mat> {
    let pixels: Vec<[u8; 3]> = rgb_data
        .chunks_exact(3)
        .map(|rgb| [rgb[2], rgb[1], rgb[0]])
        .collect();
    image_buffer::from_bgr_pixels(height, width, &pixels)
}

/// Convert a BGR `Mat` to an interleaved RGB byte buffer
fn bgr_mat_to_rgb(image: &Mat) -> Result<Vec<u8>> {
    let continuous = image_buffer::continuous_copy(image)?;
    let pixels = image_buffer::pixels(&continuous)?;
    let mut rgb = Vec::with_capacity(pixels.len() * 3);
    for p in pixels {
        rgb.extend_from_slice(&[p[2], p[1], p[0]]);
    }
    Ok(rgb)
}

/// Get list of all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &[
        "jpg", "jpeg", "png", "gif", "webp", "tiff", "tif", "bmp", "tga", "pbm", "pgm", "ppm",
        "pnm", "qoi",
    ]
}

/// Check if a file extension is supported
pub fn is_supported_extension(ext: &str) -> bool {
    let ext_lower = ext.to_lowercase();
    supported_extensions().contains(&ext_lower.as_str())
}
