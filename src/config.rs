//! Configuration structures for the analysis and correction pipeline.
//!
//! These are the stage-internal knobs that are not part of
//! [`ProcessingParameters`](crate::tuning::ProcessingParameters): patch sizes,
//! hue bands, grid sizes. They rarely change between images, so they live in
//! a separate structure that can be loaded once from JSON.
//!
//! ```no_run
//! use underwater_color::PipelineConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = PipelineConfig::from_json_file(Path::new("config.json"))?;
//!
//! // Or use defaults
//! let config = PipelineConfig::default();
//! # Ok::<(), underwater_color::CorrectionError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`AnalysisConfig`]: downsampling and green/turbidity detection
//! - [`DehazeConfig`]: dark channel prior settings
//! - [`ContrastConfig`]: CLAHE tiling

use crate::constants::{analysis, pipeline};
use crate::error::{CorrectionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete configuration for analysis and correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Image statistics configuration
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Dehaze stage configuration
    #[serde(default)]
    pub dehaze: DehazeConfig,

    /// Contrast stage configuration
    #[serde(default)]
    pub contrast: ContrastConfig,
}

/// Image statistics parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Longest side of the analysis downsample (0 disables downsampling)
    pub max_dimension: i32,

    /// Longest side of the image the edge and haze terms are measured on
    ///
    /// Pixel-scale measurements (Laplacian, dark channel patch) only compare
    /// across images at a common working size. Smaller inputs are measured
    /// as they are. 0 measures at full resolution.
    pub structure_dimension: i32,

    /// Lower bound of the green hue band (OpenCV 0-180 hue scale)
    pub green_hue_min: u8,

    /// Upper bound of the green hue band (OpenCV 0-180 hue scale)
    pub green_hue_max: u8,

    /// Minimum HSV saturation for a green pixel
    pub green_min_saturation: u8,

    /// Laplacian standard deviation considered fully clear water
    pub laplacian_clear_std: f32,

    /// Dark channel patch size for the haze statistic
    pub haze_patch_size: i32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_dimension: analysis::MAX_ANALYSIS_DIMENSION,
            structure_dimension: analysis::STRUCTURE_DIMENSION,
            green_hue_min: analysis::GREEN_HUE_MIN,
            green_hue_max: analysis::GREEN_HUE_MAX,
            green_min_saturation: analysis::GREEN_MIN_SATURATION,
            laplacian_clear_std: analysis::LAPLACIAN_CLEAR_STD,
            haze_patch_size: analysis::HAZE_PATCH_SIZE,
        }
    }
}

/// Dark channel prior parameters.
///
/// Controls the haze estimate that the dehaze stage inverts. The
/// `dehaze_strength` parameter then blends between the input and the fully
/// dehazed estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DehazeConfig {
    /// Dark channel patch size in pixels (odd)
    pub patch_size: i32,

    /// Fraction of brightest dark-channel pixels used for atmospheric light
    pub atmospheric_top_fraction: f32,

    /// Haze removal fraction (keeps 1 - omega of the haze)
    pub omega: f32,

    /// Lower bound on transmission
    pub transmission_floor: f32,

    /// Box blur size used to smooth the transmission map
    pub transmission_blur: i32,
}

impl Default for DehazeConfig {
    fn default() -> Self {
        Self {
            patch_size: pipeline::DARK_CHANNEL_PATCH,
            atmospheric_top_fraction: pipeline::ATMOSPHERIC_TOP_FRACTION,
            omega: pipeline::DEHAZE_OMEGA,
            transmission_floor: pipeline::TRANSMISSION_FLOOR,
            transmission_blur: pipeline::TRANSMISSION_BLUR,
        }
    }
}

/// CLAHE parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastConfig {
    /// Tiles per side of the CLAHE grid
    pub tile_grid: i32,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            tile_grid: pipeline::CLAHE_TILE_GRID,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CorrectionError::config(format!("Failed to read {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            CorrectionError::config(format!("Failed to parse {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CorrectionError::config("Failed to serialize configuration", e))?;
        std::fs::write(path, json).map_err(|e| {
            CorrectionError::config(format!("Failed to write {}", path.display()), e)
        })?;
        Ok(())
    }

    /// Check values that would make OpenCV kernels fail
    pub fn validate(&self) -> Result<()> {
        let invalid = |parameter: &str, value: String| {
            Err(CorrectionError::InvalidParameter {
                parameter: parameter.to_string(),
                value,
            })
        };

        if self.analysis.max_dimension < 0 {
            return invalid("analysis.max_dimension", self.analysis.max_dimension.to_string());
        }
        if self.analysis.structure_dimension < 0 {
            return invalid(
                "analysis.structure_dimension",
                self.analysis.structure_dimension.to_string(),
            );
        }
        if self.analysis.green_hue_min > self.analysis.green_hue_max {
            return invalid(
                "analysis.green_hue_min",
                format!("{} > {}", self.analysis.green_hue_min, self.analysis.green_hue_max),
            );
        }
        if self.analysis.laplacian_clear_std <= 0.0 {
            return invalid(
                "analysis.laplacian_clear_std",
                self.analysis.laplacian_clear_std.to_string(),
            );
        }
        if self.analysis.haze_patch_size < 1 {
            return invalid(
                "analysis.haze_patch_size",
                self.analysis.haze_patch_size.to_string(),
            );
        }
        if self.dehaze.patch_size < 1 {
            return invalid("dehaze.patch_size", self.dehaze.patch_size.to_string());
        }
        if !(self.dehaze.atmospheric_top_fraction > 0.0 && self.dehaze.atmospheric_top_fraction <= 1.0) {
            return invalid(
                "dehaze.atmospheric_top_fraction",
                self.dehaze.atmospheric_top_fraction.to_string(),
            );
        }
        if !(self.dehaze.omega > 0.0 && self.dehaze.omega <= 1.0) {
            return invalid("dehaze.omega", self.dehaze.omega.to_string());
        }
        if !(self.dehaze.transmission_floor > 0.0 && self.dehaze.transmission_floor <= 1.0) {
            return invalid(
                "dehaze.transmission_floor",
                self.dehaze.transmission_floor.to_string(),
            );
        }
        if self.dehaze.transmission_blur < 1 {
            return invalid(
                "dehaze.transmission_blur",
                self.dehaze.transmission_blur.to_string(),
            );
        }
        if self.contrast.tile_grid < 1 {
            return invalid("contrast.tile_grid", self.contrast.tile_grid.to_string());
        }
        Ok(())
    }
}
