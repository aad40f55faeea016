//! Processing parameters consumed by the correction pipeline
//!
//! `ProcessingParameters` is a plain value: the auto-tuner produces it, a
//! user may edit it, and the pipeline reads it. Hand-edited values can fall
//! outside the documented ranges, so the pipeline runs [`sanitized`] first
//! and reports every clamp it had to make.
//!
//! [`sanitized`]: ProcessingParameters::sanitized

use crate::constants::{coupling, defaults, lake, pipeline, ranges};
use crate::water::WaterType;
use serde::{Deserialize, Serialize};

/// Green-dampening strength for lake scenes
///
/// Variants are ordered by strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagentaCompensation {
    None,
    Light,
    Medium,
    Strong,
}

impl MagentaCompensation {
    /// All levels, weakest first
    pub const ALL: [MagentaCompensation; 4] = [
        MagentaCompensation::None,
        MagentaCompensation::Light,
        MagentaCompensation::Medium,
        MagentaCompensation::Strong,
    ];

    /// Green channel divisor applied by the magenta stage
    pub fn factor(self) -> f32 {
        match self {
            MagentaCompensation::None => 1.0,
            MagentaCompensation::Light => 1.0,
            MagentaCompensation::Medium => 1.2,
            MagentaCompensation::Strong => 1.4,
        }
    }

    /// Strongest level whose boost over 1.0 fits within `multiplier` times
    /// this level's boost
    ///
    /// Never returns a level above `self`, and never drops a selected
    /// compensation below `Light`.
    pub fn scaled_down(self, multiplier: f32) -> Self {
        if self == MagentaCompensation::None {
            return self;
        }
        let boost = (self.factor() - 1.0) * multiplier;
        Self::ALL
            .iter()
            .copied()
            .filter(|level| *level != MagentaCompensation::None && *level <= self)
            .filter(|level| level.factor() - 1.0 <= boost + pipeline::IDENTITY_EPSILON)
            .max()
            .unwrap_or(MagentaCompensation::Light)
    }
}

/// White balance algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhiteBalanceMethod {
    /// Percentile-trimmed channel means scaled to their common gray
    Robust,
    /// Trimmed channel means scaled to the trimmed gray image mean
    GrayWorld,
    /// Per-channel high percentile mapped to white
    WhitePatch,
}

/// How the dehazed and detail variants are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethod {
    Average,
    Weighted,
    Pca,
}

impl std::str::FromStr for FusionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "average" => Ok(FusionMethod::Average),
            "weighted" => Ok(FusionMethod::Weighted),
            "pca" => Ok(FusionMethod::Pca),
            other => Err(format!("unknown fusion method '{}'", other)),
        }
    }
}

/// Beer-Lambert attenuation coefficients for lake water
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttenuationCoefficients {
    pub red: f32,
    pub green: f32,
}

impl Default for AttenuationCoefficients {
    fn default() -> Self {
        Self {
            red: lake::ATTENUATION_RED,
            green: lake::ATTENUATION_GREEN,
        }
    }
}

/// Values the coupling pass replaced
///
/// `None` means the pass did not touch that field. Holding the pre-coupling
/// values is what lets the pass run again without compounding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CouplingRecord {
    pub red_scale_before: Option<f32>,
    pub dehaze_strength_before: Option<f32>,
}

impl CouplingRecord {
    pub fn is_empty(&self) -> bool {
        self.red_scale_before.is_none() && self.dehaze_strength_before.is_none()
    }

    /// Whether the recorded coupling pass switched the red stage off
    pub fn disabled_red(&self) -> bool {
        self.red_scale_before
            .is_some_and(|before| before.min(coupling::RED_CAP) <= coupling::RED_DISABLE_AT)
    }

    /// Whether the recorded coupling pass switched the dehaze stage off
    pub fn disabled_dehaze(&self) -> bool {
        self.dehaze_strength_before
            .is_some_and(|before| before * coupling::DEHAZE_FACTOR <= coupling::DEHAZE_DISABLE_AT)
    }
}

/// Complete parameter set for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParameters {
    pub water_type: WaterType,
    /// When false, the water type above is the user's choice and is kept
    pub auto_detect: bool,

    pub white_balance_enabled: bool,
    pub white_balance_method: WhiteBalanceMethod,
    /// 0 = identity, 1 = full correction, up to 1.3 overshoot
    pub white_balance_strength: f32,
    pub robust_lower_percentile: f32,
    pub robust_upper_percentile: f32,
    pub white_patch_percentile: f32,

    pub red_channel_enabled: bool,
    pub red_channel_scale: f32,

    pub magenta_compensation: MagentaCompensation,

    pub dehaze_enabled: bool,
    pub dehaze_strength: f32,
    /// Weight boost of the dehazed variant in weighted fusion
    pub turbidity_compensation: f32,

    pub clahe_enabled: bool,
    pub clahe_clip_limit: f32,

    pub saturation_enabled: bool,
    pub saturation_level: f32,

    /// Scene depth stand-in for the red channel attenuation term (lake only)
    pub depth_attenuation_factor: f32,
    pub attenuation: AttenuationCoefficients,

    pub fusion_enabled: bool,
    pub fusion_method: FusionMethod,
    /// Histogram-equalize the detail variant before sharpening
    pub fusion_equalize: bool,
    pub fusion_balance: f32,
    pub unsharp_amount: f32,
    pub unsharp_radius: f32,

    pub coupling: CouplingRecord,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            water_type: WaterType::Ocean,
            auto_detect: true,
            white_balance_enabled: true,
            white_balance_method: WhiteBalanceMethod::Robust,
            white_balance_strength: defaults::WHITE_BALANCE_STRENGTH,
            robust_lower_percentile: defaults::ROBUST_LOWER_PERCENTILE,
            robust_upper_percentile: defaults::ROBUST_UPPER_PERCENTILE,
            white_patch_percentile: defaults::WHITE_PATCH_PERCENTILE,
            red_channel_enabled: true,
            red_channel_scale: defaults::RED_CHANNEL_SCALE,
            magenta_compensation: MagentaCompensation::None,
            dehaze_enabled: true,
            dehaze_strength: defaults::DEHAZE_STRENGTH,
            turbidity_compensation: defaults::TURBIDITY_COMPENSATION,
            clahe_enabled: true,
            clahe_clip_limit: defaults::CLAHE_CLIP_LIMIT,
            saturation_enabled: true,
            saturation_level: defaults::SATURATION_LEVEL,
            depth_attenuation_factor: defaults::DEPTH_ATTENUATION_FACTOR,
            attenuation: AttenuationCoefficients::default(),
            fusion_enabled: false,
            fusion_method: FusionMethod::Average,
            fusion_equalize: false,
            fusion_balance: defaults::FUSION_BALANCE,
            unsharp_amount: defaults::UNSHARP_AMOUNT,
            unsharp_radius: defaults::UNSHARP_RADIUS,
            coupling: CouplingRecord::default(),
        }
    }
}

/// A parameter the pipeline had to pull back into range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterClamp {
    pub parameter: &'static str,
    pub requested: f32,
    pub applied: f32,
}

impl std::fmt::Display for ParameterClamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {} clamped to {}",
            self.parameter, self.requested, self.applied
        )
    }
}

fn clamp_field(
    parameter: &'static str,
    value: &mut f32,
    min: f32,
    max: f32,
    clamps: &mut Vec<ParameterClamp>,
) {
    let requested = *value;
    let applied = if requested.is_nan() {
        min
    } else {
        requested.clamp(min, max)
    };
    if applied != requested {
        *value = applied;
        clamps.push(ParameterClamp {
            parameter,
            requested,
            applied,
        });
    }
}

/// Nearest allowed saturation step
pub fn snap_saturation(level: f32) -> f32 {
    if level.is_nan() {
        return ranges::SATURATION_STEPS[0];
    }
    ranges::SATURATION_STEPS
        .iter()
        .copied()
        .fold(ranges::SATURATION_STEPS[0], |best, step| {
            if (step - level).abs() < (best - level).abs() {
                step
            } else {
                best
            }
        })
}

impl ProcessingParameters {
    /// A parameter set under which every stage is a no-op
    pub fn identity() -> Self {
        Self {
            white_balance_enabled: false,
            white_balance_strength: 0.0,
            red_channel_enabled: false,
            red_channel_scale: ranges::RED_SCALE_MIN,
            magenta_compensation: MagentaCompensation::None,
            dehaze_enabled: false,
            dehaze_strength: 0.0,
            turbidity_compensation: ranges::TURBIDITY_COMPENSATION_MIN,
            clahe_enabled: false,
            saturation_enabled: false,
            saturation_level: 1.0,
            depth_attenuation_factor: ranges::DEPTH_FACTOR_MIN,
            fusion_enabled: false,
            ..Self::default()
        }
    }

    /// Copy with every numeric field pulled into its documented range
    ///
    /// NaN goes to the lower bound, saturation snaps to the nearest step and
    /// an inverted robust percentile window resets to the defaults. Returns
    /// the clamps so the caller can surface them.
    pub fn sanitized(&self) -> (Self, Vec<ParameterClamp>) {
        let mut p = self.clone();
        let mut clamps = Vec::new();

        clamp_field(
            "white_balance_strength",
            &mut p.white_balance_strength,
            ranges::WHITE_BALANCE_MIN,
            ranges::WHITE_BALANCE_MAX,
            &mut clamps,
        );
        clamp_field(
            "robust_lower_percentile",
            &mut p.robust_lower_percentile,
            ranges::PERCENTILE_MIN,
            ranges::PERCENTILE_MAX,
            &mut clamps,
        );
        clamp_field(
            "robust_upper_percentile",
            &mut p.robust_upper_percentile,
            ranges::PERCENTILE_MIN,
            ranges::PERCENTILE_MAX,
            &mut clamps,
        );
        if p.robust_lower_percentile >= p.robust_upper_percentile {
            clamps.push(ParameterClamp {
                parameter: "robust_lower_percentile",
                requested: p.robust_lower_percentile,
                applied: defaults::ROBUST_LOWER_PERCENTILE,
            });
            clamps.push(ParameterClamp {
                parameter: "robust_upper_percentile",
                requested: p.robust_upper_percentile,
                applied: defaults::ROBUST_UPPER_PERCENTILE,
            });
            p.robust_lower_percentile = defaults::ROBUST_LOWER_PERCENTILE;
            p.robust_upper_percentile = defaults::ROBUST_UPPER_PERCENTILE;
        }
        clamp_field(
            "white_patch_percentile",
            &mut p.white_patch_percentile,
            ranges::PERCENTILE_MIN,
            ranges::PERCENTILE_MAX,
            &mut clamps,
        );
        clamp_field(
            "red_channel_scale",
            &mut p.red_channel_scale,
            ranges::RED_SCALE_MIN,
            ranges::RED_SCALE_MAX,
            &mut clamps,
        );
        clamp_field(
            "dehaze_strength",
            &mut p.dehaze_strength,
            ranges::DEHAZE_MIN,
            ranges::DEHAZE_MAX,
            &mut clamps,
        );
        clamp_field(
            "turbidity_compensation",
            &mut p.turbidity_compensation,
            ranges::TURBIDITY_COMPENSATION_MIN,
            ranges::TURBIDITY_COMPENSATION_MAX,
            &mut clamps,
        );
        clamp_field(
            "clahe_clip_limit",
            &mut p.clahe_clip_limit,
            ranges::CLAHE_CLIP_MIN,
            ranges::CLAHE_CLIP_MAX,
            &mut clamps,
        );

        let snapped = snap_saturation(p.saturation_level);
        if snapped != p.saturation_level {
            clamps.push(ParameterClamp {
                parameter: "saturation_level",
                requested: p.saturation_level,
                applied: snapped,
            });
            p.saturation_level = snapped;
        }

        clamp_field(
            "depth_attenuation_factor",
            &mut p.depth_attenuation_factor,
            ranges::DEPTH_FACTOR_MIN,
            ranges::DEPTH_FACTOR_MAX,
            &mut clamps,
        );
        clamp_field(
            "attenuation.red",
            &mut p.attenuation.red,
            ranges::ATTENUATION_MIN,
            ranges::ATTENUATION_MAX,
            &mut clamps,
        );
        clamp_field(
            "attenuation.green",
            &mut p.attenuation.green,
            ranges::ATTENUATION_MIN,
            ranges::ATTENUATION_MAX,
            &mut clamps,
        );
        clamp_field(
            "fusion_balance",
            &mut p.fusion_balance,
            ranges::FUSION_BALANCE_MIN,
            ranges::FUSION_BALANCE_MAX,
            &mut clamps,
        );
        clamp_field(
            "unsharp_amount",
            &mut p.unsharp_amount,
            ranges::UNSHARP_AMOUNT_MIN,
            ranges::UNSHARP_AMOUNT_MAX,
            &mut clamps,
        );
        clamp_field(
            "unsharp_radius",
            &mut p.unsharp_radius,
            ranges::UNSHARP_RADIUS_MIN,
            ranges::UNSHARP_RADIUS_MAX,
            &mut clamps,
        );

        (p, clamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_within_ranges() {
        let (clean, clamps) = ProcessingParameters::default().sanitized();
        assert!(clamps.is_empty(), "unexpected clamps: {:?}", clamps);
        assert_eq!(clean, ProcessingParameters::default());
    }

    #[test]
    fn test_identity_is_within_ranges() {
        let (_, clamps) = ProcessingParameters::identity().sanitized();
        assert!(clamps.is_empty());
    }

    #[test]
    fn test_negative_strength_clamped_and_reported() {
        let params = ProcessingParameters {
            white_balance_strength: -0.5,
            red_channel_scale: 4.0,
            ..ProcessingParameters::default()
        };
        let (clean, clamps) = params.sanitized();
        assert_eq!(clean.white_balance_strength, 0.0);
        assert_eq!(clean.red_channel_scale, 1.6);
        assert_eq!(clamps.len(), 2);
        assert_eq!(clamps[0].parameter, "white_balance_strength");
        assert_eq!(clamps[0].requested, -0.5);
    }

    #[test]
    fn test_nan_goes_to_lower_bound() {
        let params = ProcessingParameters {
            dehaze_strength: f32::NAN,
            saturation_level: f32::NAN,
            ..ProcessingParameters::default()
        };
        let (clean, clamps) = params.sanitized();
        assert_eq!(clean.dehaze_strength, 0.0);
        assert_eq!(clean.saturation_level, 1.0);
        assert_eq!(clamps.len(), 2);
    }

    #[test]
    fn test_saturation_snaps_to_step() {
        assert_eq!(snap_saturation(1.17), 1.2);
        assert_eq!(snap_saturation(0.2), 1.0);
        assert_eq!(snap_saturation(9.0), 1.4);
        assert_eq!(snap_saturation(1.3), 1.3);
    }

    #[test]
    fn test_inverted_percentiles_reset() {
        let params = ProcessingParameters {
            robust_lower_percentile: 80.0,
            robust_upper_percentile: 20.0,
            ..ProcessingParameters::default()
        };
        let (clean, clamps) = params.sanitized();
        assert_eq!(clean.robust_lower_percentile, 5.0);
        assert_eq!(clean.robust_upper_percentile, 95.0);
        assert_eq!(clamps.len(), 2);
    }

    #[test]
    fn test_magenta_ordering_and_factors() {
        assert!(MagentaCompensation::Strong > MagentaCompensation::Medium);
        assert!(MagentaCompensation::Light > MagentaCompensation::None);
        assert_eq!(MagentaCompensation::Strong.factor(), 1.4);
        assert_eq!(MagentaCompensation::Light.factor(), 1.0);
    }

    #[test]
    fn test_magenta_scaled_down() {
        use MagentaCompensation::*;
        assert_eq!(Strong.scaled_down(1.0), Strong);
        assert_eq!(Strong.scaled_down(0.8), Medium);
        assert_eq!(Strong.scaled_down(0.56), Medium);
        assert_eq!(Medium.scaled_down(0.56), Light);
        assert_eq!(Light.scaled_down(0.56), Light);
        assert_eq!(None.scaled_down(0.56), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: ProcessingParameters =
            serde_json::from_str(r#"{ "water_type": "lake", "auto_detect": false }"#).unwrap();
        assert_eq!(params.water_type, WaterType::Lake);
        assert!(!params.auto_detect);
        assert_eq!(params.red_channel_scale, 1.3);
        assert_eq!(params.magenta_compensation, MagentaCompensation::None);
    }
}
