//! Red channel enhancement
//!
//! Red light is absorbed first underwater. The stage multiplies the red
//! channel by `red_channel_scale` times a Beer-Lambert depth term,
//! `exp((k_red - k_green) * (depth - 1))`, i.e. how much more red than green
//! the extra water column has absorbed.
//!
//! Highlights are rolled off instead of clipped: above the knee the curve
//! bends so that the brightest input still maps to 255 and neighbouring
//! values stay distinct.

use crate::constants::pipeline;
use crate::error::Result;
use crate::image_buffer::{self, ChannelLuts};
use crate::tuning::ProcessingParameters;
use opencv::core::Mat;

/// Combined red gain for the parameters
pub fn red_gain(params: &ProcessingParameters) -> f32 {
    let differential = params.attenuation.red - params.attenuation.green;
    let depth_term = (differential * (params.depth_attenuation_factor - 1.0)).exp();
    params.red_channel_scale * depth_term
}

/// Gain curve with a soft shoulder, on normalized [0, 1] input
///
/// Linear below `knee`; above it `1 - (1 - t)^k` maps `[knee, gain]` onto
/// `[knee, 1]` with slope 1 at the knee. At `gain == 1` this is the identity.
pub fn rolloff(x: f32, gain: f32, knee: f32) -> f32 {
    let y = x * gain;
    if gain <= 1.0 || y <= knee {
        return y;
    }
    let k = (gain - knee) / (1.0 - knee);
    let t = ((y - knee) / (gain - knee)).clamp(0.0, 1.0);
    knee + (1.0 - knee) * (1.0 - (1.0 - t).powf(k))
}

/// Apply the red gain to the red channel
pub fn apply_red_channel(image: &Mat, params: &ProcessingParameters) -> Result<Mat> {
    let gain = red_gain(params);
    if !params.red_channel_enabled || (gain - 1.0).abs() <= pipeline::IDENTITY_EPSILON {
        return image_buffer::owned_copy(image);
    }

    log::info!(
        "Red channel: scale {:.2}, depth factor {:.2}, effective gain {:.3}",
        params.red_channel_scale,
        params.depth_attenuation_factor,
        gain
    );

    let knee = pipeline::RED_ROLLOFF_KNEE;
    let luts: ChannelLuts = [
        image_buffer::identity_lut(),
        image_buffer::identity_lut(),
        image_buffer::build_lut(|v| rolloff(v / 255.0, gain, knee) * 255.0),
    ];
    image_buffer::apply_luts(image, &luts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rolloff_identity_at_unit_gain() {
        for i in 0..=20 {
            let x = i as f32 / 20.0;
            assert_abs_diff_eq!(rolloff(x, 1.0, 0.8), x, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rolloff_keeps_white_and_monotonic() {
        let gain = 1.5;
        assert_abs_diff_eq!(rolloff(1.0, gain, 0.8), 1.0, epsilon = 1e-6);
        let mut last = -1.0;
        for i in 0..=255 {
            let y = rolloff(i as f32 / 255.0, gain, 0.8);
            assert!(y >= last);
            assert!(y <= 1.0 + 1e-6);
            last = y;
        }
    }

    #[test]
    fn test_rolloff_linear_below_knee() {
        assert_abs_diff_eq!(rolloff(0.2, 1.5, 0.8), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_depth_term_raises_gain() {
        let shallow = ProcessingParameters::default();
        let deep = ProcessingParameters {
            depth_attenuation_factor: 1.5,
            ..ProcessingParameters::default()
        };
        assert_abs_diff_eq!(red_gain(&shallow), shallow.red_channel_scale, epsilon = 1e-6);
        assert!(red_gain(&deep) > red_gain(&shallow));
    }

    #[test]
    fn test_only_red_changes() {
        let img = image_buffer::uniform(4, 4, [80, 120, 60]).unwrap();
        let out = apply_red_channel(&img, &ProcessingParameters::default()).unwrap();
        let px = image_buffer::pixels(&out).unwrap();
        assert_eq!(px[0][0], 80);
        assert_eq!(px[0][1], 120);
        assert_eq!(px[0][2], 78);
    }

    #[test]
    fn test_unit_scale_is_identity() {
        let img = image_buffer::uniform(4, 4, [80, 120, 250]).unwrap();
        let p = ProcessingParameters {
            red_channel_scale: 1.0,
            ..ProcessingParameters::default()
        };
        let out = apply_red_channel(&img, &p).unwrap();
        assert!(image_buffer::same_pixels(&img, &out).unwrap());
    }
}
