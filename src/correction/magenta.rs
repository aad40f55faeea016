//! Magenta compensation for green water
//!
//! Divides green by the compensation factor `f` and lifts red and blue by
//! 30% and 20% of `f - 1`. Ocean scenes skip the stage entirely.

use crate::constants::pipeline;
use crate::error::Result;
use crate::image_buffer::{self, ChannelLuts};
use crate::tuning::ProcessingParameters;
use crate::water::WaterType;
use opencv::core::Mat;

/// BGR channel multipliers for a compensation factor
pub fn channel_multipliers(factor: f32) -> [f32; 3] {
    let extra = factor - 1.0;
    [
        1.0 + extra * pipeline::MAGENTA_BLUE_SHARE,
        1.0 / factor,
        1.0 + extra * pipeline::MAGENTA_RED_SHARE,
    ]
}

/// Dampen green and lift red/blue according to `magenta_compensation`
pub fn apply_magenta(image: &Mat, params: &ProcessingParameters) -> Result<Mat> {
    let factor = params.magenta_compensation.factor();
    if params.water_type == WaterType::Ocean || factor <= 1.0 + pipeline::IDENTITY_EPSILON {
        return image_buffer::owned_copy(image);
    }

    let multipliers = channel_multipliers(factor);
    log::info!(
        "Magenta compensation {:?}: B x{:.2}, G x{:.3}, R x{:.2}",
        params.magenta_compensation,
        multipliers[0],
        multipliers[1],
        multipliers[2]
    );

    let luts: ChannelLuts = multipliers.map(|m| image_buffer::build_lut(|v| v * m));
    image_buffer::apply_luts(image, &luts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::MagentaCompensation;

    fn lake(level: MagentaCompensation) -> ProcessingParameters {
        ProcessingParameters {
            water_type: WaterType::Lake,
            magenta_compensation: level,
            ..ProcessingParameters::default()
        }
    }

    #[test]
    fn test_strong_multipliers() {
        let [b, g, r] = channel_multipliers(1.4);
        assert!((b - 1.08).abs() < 1e-6);
        assert!((g - 1.0 / 1.4).abs() < 1e-6);
        assert!((r - 1.12).abs() < 1e-6);
    }

    #[test]
    fn test_strong_dampens_green() {
        let img = image_buffer::uniform(4, 4, [100, 140, 50]).unwrap();
        let out = apply_magenta(&img, &lake(MagentaCompensation::Strong)).unwrap();
        let px = image_buffer::pixels(&out).unwrap();
        assert_eq!(px[0][0], 108);
        assert_eq!(px[0][1], 100);
        assert_eq!(px[0][2], 56);
    }

    #[test]
    fn test_ocean_is_noop_regardless_of_level() {
        let img = image_buffer::uniform(4, 4, [100, 140, 50]).unwrap();
        let p = ProcessingParameters {
            water_type: WaterType::Ocean,
            ..lake(MagentaCompensation::Strong)
        };
        let out = apply_magenta(&img, &p).unwrap();
        assert!(image_buffer::same_pixels(&img, &out).unwrap());
    }

    #[test]
    fn test_light_is_noop() {
        let img = image_buffer::uniform(4, 4, [100, 140, 50]).unwrap();
        let out = apply_magenta(&img, &lake(MagentaCompensation::Light)).unwrap();
        assert!(image_buffer::same_pixels(&img, &out).unwrap());
    }
}
