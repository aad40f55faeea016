//! # Underwater Color
//!
//! A Rust crate for adaptive color correction of underwater photographs.
//!
//! This library restores color in ocean and lake images by:
//! - Measuring channel ratios, green content, haze and contrast
//! - Classifying the water as ocean (blue) or lake (green)
//! - Auto-tuning correction strengths, with a coupling pass that keeps
//!   magenta compensation, red boost and dehaze from over-correcting together
//! - Running a fixed-order correction pipeline: white balance, red channel,
//!   magenta compensation, dehaze, CLAHE, saturation and optional fusion
//!
//! ## Example
//!
//! ```rust,no_run
//! use underwater_color::{auto_tune, image_loader, process};
//! use std::path::Path;
//!
//! let image = image_loader::load_image(Path::new("dive.jpg"))?;
//! let params = auto_tune(&image, None)?;
//! let corrected = process(&image, &params)?;
//! image_loader::save_image(&corrected, Path::new("dive_corrected.jpg"))?;
//! # Ok::<(), underwater_color::CorrectionError>(())
//! ```

use opencv::core::Mat;

pub mod config;
pub mod constants;
pub mod correction;
pub mod error;
pub mod image_buffer;
pub mod image_loader;
pub mod tuning;
pub mod water;

pub use config::PipelineConfig;
pub use correction::{CorrectionPipeline, ProcessOutcome};
pub use error::{CorrectionError, Result};
pub use tuning::{
    FusionMethod, MagentaCompensation, ParameterClamp, ProcessingParameters, TuneReport,
    WhiteBalanceMethod,
};
pub use water::{ImageAnalyzer, ImageStatistics, SceneMetrics, WaterAnalysis, WaterType, WaterTypeSource};

/// Measure and classify an image with the default analyzer
///
/// # Errors
///
/// Returns `CorrectionError::InvalidImage` if the image is empty or not
/// 3-channel 8-bit.
pub fn analyze_and_classify(image: &Mat) -> Result<WaterAnalysis> {
    let stats = ImageAnalyzer::new().analyze(image)?;
    Ok(water::classify(&stats))
}

/// Decide where the water type comes from for this image
///
/// With `auto_detect` off in `current`, the classifier is skipped and the
/// user's water type is used; scene metrics are measured either way.
pub fn resolve_water_analysis(
    image: &Mat,
    current: Option<&ProcessingParameters>,
) -> Result<WaterTypeSource> {
    let stats = ImageAnalyzer::new().analyze(image)?;
    let source = match current {
        Some(p) if !p.auto_detect => {
            log::info!("Auto-detection disabled, using {} water", p.water_type);
            WaterTypeSource::Forced {
                water_type: p.water_type,
                scene: SceneMetrics::from(&stats),
            }
        }
        _ => WaterTypeSource::Detected(water::classify(&stats)),
    };
    Ok(source)
}

/// Tune parameters for an image, merging into `current` when given
///
/// # Errors
///
/// Returns `CorrectionError::InvalidImage` for unusable input.
pub fn auto_tune(image: &Mat, current: Option<&ProcessingParameters>) -> Result<ProcessingParameters> {
    Ok(auto_tune_with_report(image, current)?.parameters)
}

/// Like [`auto_tune`], also returning tuning confidence and notes
pub fn auto_tune_with_report(
    image: &Mat,
    current: Option<&ProcessingParameters>,
) -> Result<TuneReport> {
    let analysis = resolve_water_analysis(image, current)?.into_analysis();
    Ok(tuning::tune_with_report(&analysis, current))
}

/// Correct an image with the default pipeline configuration
pub fn process(image: &Mat, params: &ProcessingParameters) -> Result<Mat> {
    CorrectionPipeline::new().process(image, params)
}

/// Like [`process`], also returning the parameter clamps that were applied
pub fn process_with_report(image: &Mat, params: &ProcessingParameters) -> Result<ProcessOutcome> {
    CorrectionPipeline::new().process_with_report(image, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_serialization() {
        let params = ProcessingParameters {
            water_type: WaterType::Lake,
            magenta_compensation: MagentaCompensation::Medium,
            fusion_method: FusionMethod::Pca,
            ..ProcessingParameters::default()
        };

        let json = serde_json::to_string(&params).unwrap();
        let deserialized: ProcessingParameters = serde_json::from_str(&json).unwrap();

        assert_eq!(params, deserialized);
    }

    #[test]
    fn test_forced_water_type_skips_classifier() {
        let image = image_buffer::uniform(16, 16, [200, 90, 40]).unwrap();
        let current = ProcessingParameters {
            water_type: WaterType::Lake,
            auto_detect: false,
            ..ProcessingParameters::default()
        };

        let source = resolve_water_analysis(&image, Some(&current)).unwrap();
        assert!(source.is_forced());
        let analysis = source.into_analysis();
        assert_eq!(analysis.water_type, WaterType::Lake);
        assert_eq!(analysis.confidence, 1.0);
    }
}
