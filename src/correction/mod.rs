//! Color correction pipeline
//!
//! Stages run in a fixed order on a private copy of the input:
//!
//! 1. White balance
//! 2. Red channel enhancement
//! 3. Magenta compensation (lake only)
//! 4. Dehaze
//! 5. CLAHE on luminance
//! 6. Saturation
//!
//! Each stage honors its enable flag and is a no-op at its identity value.
//! With fusion enabled, steps 5 and 6 run on two variants (the dehazed image
//! and an unsharp-masked copy of the non-dehazed image, optionally
//! histogram-equalized first) which are then fused.

pub mod contrast;
pub mod dehaze;
pub mod fusion;
pub mod magenta;
pub mod red_channel;
pub mod saturation;
pub mod white_balance;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::image_buffer;
use crate::tuning::{ParameterClamp, ProcessingParameters};
use opencv::{core::Mat, prelude::*};

/// Corrected image plus the parameter clamps applied before processing
#[derive(Debug)]
pub struct ProcessOutcome {
    pub image: Mat,
    pub clamps: Vec<ParameterClamp>,
}

/// Runs the correction stages with a fixed [`PipelineConfig`]
#[derive(Debug, Clone, Default)]
pub struct CorrectionPipeline {
    config: PipelineConfig,
}

impl CorrectionPipeline {
    /// Create a pipeline with default stage configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with custom stage configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Correct an image; the input buffer is never modified
    ///
    /// # Errors
    ///
    /// Returns `CorrectionError::InvalidImage` for empty or non-BGR8 input.
    pub fn process(&self, image: &Mat, params: &ProcessingParameters) -> Result<Mat> {
        Ok(self.process_with_report(image, params)?.image)
    }

    /// Like [`process`](Self::process), also returning the parameter clamps
    pub fn process_with_report(
        &self,
        image: &Mat,
        params: &ProcessingParameters,
    ) -> Result<ProcessOutcome> {
        image_buffer::validate(image)?;
        let owned;
        let image = if image.is_continuous() {
            image
        } else {
            owned = image_buffer::continuous_copy(image)?;
            &owned
        };

        let (p, clamps) = params.sanitized();
        for clamp in &clamps {
            log::warn!("Parameter out of range, {}", clamp);
        }

        log::info!(
            "Correcting {}x{} {} image{}",
            image.cols(),
            image.rows(),
            p.water_type,
            if p.fusion_enabled { " with fusion" } else { "" }
        );

        let balanced = white_balance::apply_white_balance(image, &p)?;
        let reddened = red_channel::apply_red_channel(&balanced, &p)?;
        let compensated = magenta::apply_magenta(&reddened, &p)?;

        let dehazed = if p.dehaze_enabled {
            dehaze::apply_dehaze(&compensated, p.dehaze_strength, &self.config.dehaze)?
        } else {
            image_buffer::owned_copy(&compensated)?
        };
        let finished = self.finish(&dehazed, &p)?;

        let image = if p.fusion_enabled {
            let detail = if p.fusion_equalize {
                let equalized = fusion::equalize_value(&compensated)?;
                fusion::unsharp_mask(&equalized, p.unsharp_amount, p.unsharp_radius)?
            } else {
                fusion::unsharp_mask(&compensated, p.unsharp_amount, p.unsharp_radius)?
            };
            let detail = self.finish(&detail, &p)?;
            fusion::fuse(&finished, &detail, &p)?
        } else {
            finished
        };

        Ok(ProcessOutcome { image, clamps })
    }

    /// Contrast and saturation, the stages shared by both fusion variants
    fn finish(&self, image: &Mat, p: &ProcessingParameters) -> Result<Mat> {
        let contrasted = if p.clahe_enabled {
            contrast::apply_clahe(image, p.clahe_clip_limit, &self.config.contrast)?
        } else {
            image_buffer::owned_copy(image)?
        };
        if p.saturation_enabled {
            saturation::apply_saturation(&contrasted, p.saturation_level)
        } else {
            Ok(contrasted)
        }
    }
}
