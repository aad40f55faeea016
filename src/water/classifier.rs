//! Ocean/lake water type classification
//!
//! A scene is lake water when its green dominance or its green-to-red ratio
//! passes a fixed threshold. Confidence grows linearly with the distance from
//! the nearer threshold, so images sitting on the boundary come out near 0.5.

use super::statistics::{ImageStatistics, SceneMetrics};
use crate::constants::{classification, synthetic};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Water color regime of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterType {
    /// Blue-dominant water
    Ocean,
    /// Green-dominant water
    Lake,
}

impl fmt::Display for WaterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaterType::Ocean => write!(f, "ocean"),
            WaterType::Lake => write!(f, "lake"),
        }
    }
}

impl std::str::FromStr for WaterType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ocean" => Ok(WaterType::Ocean),
            "lake" => Ok(WaterType::Lake),
            other => Err(format!("unknown water type '{}'", other)),
        }
    }
}

/// Classification result handed to the auto-tuner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterAnalysis {
    /// Relative excess of green channel energy [0, 1]
    pub green_dominance: f32,
    /// Green share of summed channel means [0, 1]
    pub green_ratio: f32,
    /// Green-to-red channel mean ratio
    pub g_to_r_ratio: f32,
    /// Blue-to-red channel mean ratio
    pub b_to_r_ratio: f32,
    /// Scattering proxy [0, 1]
    pub turbidity_indicator: f32,
    /// Classified (or forced) water type
    pub water_type: WaterType,
    /// Classification confidence [0, 1]
    pub confidence: f32,
    /// Scene measurements used by the tuner's secondary terms
    pub scene: SceneMetrics,
}

impl WaterAnalysis {
    /// Build the fixed analysis used when the user picks the water type
    ///
    /// The statistics are documented per-type defaults and the confidence is
    /// always 1.0. `scene` is still measured from the actual image so
    /// contrast, haze and saturation terms track the photo.
    pub fn synthesized(water_type: WaterType, scene: SceneMetrics) -> Self {
        let (green_dominance, green_ratio, g_to_r_ratio, b_to_r_ratio, turbidity_indicator) =
            match water_type {
                WaterType::Lake => (
                    synthetic::lake::GREEN_DOMINANCE,
                    synthetic::lake::GREEN_RATIO,
                    synthetic::lake::G_TO_R_RATIO,
                    synthetic::lake::B_TO_R_RATIO,
                    synthetic::lake::TURBIDITY,
                ),
                WaterType::Ocean => (
                    synthetic::ocean::GREEN_DOMINANCE,
                    synthetic::ocean::GREEN_RATIO,
                    synthetic::ocean::G_TO_R_RATIO,
                    synthetic::ocean::B_TO_R_RATIO,
                    synthetic::ocean::TURBIDITY,
                ),
            };

        Self {
            green_dominance,
            green_ratio,
            g_to_r_ratio,
            b_to_r_ratio,
            turbidity_indicator,
            water_type,
            confidence: synthetic::FORCED_CONFIDENCE,
            scene,
        }
    }
}

/// How the water type of a scene was established
#[derive(Debug, Clone, PartialEq)]
pub enum WaterTypeSource {
    /// Classified from image statistics
    Detected(WaterAnalysis),
    /// Chosen by the user; classification was skipped
    Forced {
        water_type: WaterType,
        scene: SceneMetrics,
    },
}

impl WaterTypeSource {
    /// Collapse into the single record the tuner consumes
    pub fn into_analysis(self) -> WaterAnalysis {
        match self {
            WaterTypeSource::Detected(analysis) => analysis,
            WaterTypeSource::Forced { water_type, scene } => {
                WaterAnalysis::synthesized(water_type, scene)
            }
        }
    }

    /// Whether the user chose the water type
    pub fn is_forced(&self) -> bool {
        matches!(self, WaterTypeSource::Forced { .. })
    }
}

/// Decide water type and confidence from the two classification inputs
///
/// Lake when `green_dominance` or `g_to_r_ratio` is strictly above its
/// threshold. Each input's signed distance from its threshold is normalized
/// by a span; lake confidence follows the larger (more lake-like) distance
/// and ocean confidence the smaller margin, both mapped as `0.5 + 0.5 * d`
/// and clamped to [0, 1].
pub fn decide(green_dominance: f32, g_to_r_ratio: f32) -> (WaterType, f32) {
    let dominance_distance = (green_dominance - classification::GREEN_DOMINANCE_THRESHOLD)
        / classification::DOMINANCE_CONFIDENCE_SPAN;
    let ratio_distance =
        (g_to_r_ratio - classification::G_TO_R_THRESHOLD) / classification::G_TO_R_CONFIDENCE_SPAN;

    let is_lake = green_dominance > classification::GREEN_DOMINANCE_THRESHOLD
        || g_to_r_ratio > classification::G_TO_R_THRESHOLD;

    let (water_type, distance) = if is_lake {
        (WaterType::Lake, dominance_distance.max(ratio_distance))
    } else {
        (WaterType::Ocean, (-dominance_distance).min(-ratio_distance))
    };

    let confidence = (classification::BORDERLINE_CONFIDENCE
        + (1.0 - classification::BORDERLINE_CONFIDENCE) * distance)
        .clamp(0.0, 1.0);
    // NaN statistics cannot come out of the analyzer, but hand-built ones can
    let confidence = if confidence.is_nan() {
        classification::BORDERLINE_CONFIDENCE
    } else {
        confidence
    };

    (water_type, confidence)
}

/// Classify image statistics into a [`WaterAnalysis`]
pub fn classify(stats: &ImageStatistics) -> WaterAnalysis {
    let (water_type, confidence) = decide(stats.green_dominance, stats.g_to_r_ratio);

    log::info!(
        "Detected {} water (confidence {:.2}, dominance {:.3}, G/R {:.2})",
        water_type,
        confidence,
        stats.green_dominance,
        stats.g_to_r_ratio
    );

    WaterAnalysis {
        green_dominance: stats.green_dominance,
        green_ratio: stats.green_ratio,
        g_to_r_ratio: stats.g_to_r_ratio,
        b_to_r_ratio: stats.b_to_r_ratio,
        turbidity_indicator: stats.turbidity_indicator,
        water_type,
        confidence,
        scene: SceneMetrics::from(stats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_strong_green_is_confident_lake() {
        let (water_type, confidence) = decide(0.61, 1.5);
        assert_eq!(water_type, WaterType::Lake);
        assert_abs_diff_eq!(confidence, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_balanced_blue_is_ocean() {
        let (water_type, confidence) = decide(0.1, 1.0);
        assert_eq!(water_type, WaterType::Ocean);
        assert!(confidence > 0.8);
    }

    #[test]
    fn test_either_threshold_selects_lake() {
        assert_eq!(decide(0.40, 1.0).0, WaterType::Lake);
        assert_eq!(decide(0.10, 1.4).0, WaterType::Lake);
        assert_eq!(decide(0.35, 1.3).0, WaterType::Ocean);
    }

    #[test]
    fn test_borderline_confidence_is_mid_range() {
        let (_, at_threshold) = decide(0.35, 1.0);
        assert_abs_diff_eq!(at_threshold, 0.5, epsilon = 1e-6);

        let (water_type, just_over) = decide(0.36, 1.0);
        assert_eq!(water_type, WaterType::Lake);
        assert!(just_over > 0.5 && just_over < 0.6);
    }

    #[test]
    fn test_lake_confidence_monotonic_in_dominance() {
        let mut last = 0.0;
        for step in 0..40 {
            let dominance = 0.36 + step as f32 * 0.01;
            let (water_type, confidence) = decide(dominance, 1.0);
            assert_eq!(water_type, WaterType::Lake);
            assert!(confidence >= last);
            last = confidence;
        }
    }

    #[test]
    fn test_nan_inputs_give_borderline_confidence() {
        let (_, confidence) = decide(f32::NAN, f32::NAN);
        assert_eq!(confidence, 0.5);
    }

    #[test]
    fn test_forced_source_uses_synthetic_defaults() {
        let source = WaterTypeSource::Forced {
            water_type: WaterType::Lake,
            scene: SceneMetrics::default(),
        };
        assert!(source.is_forced());
        let analysis = source.into_analysis();
        assert_eq!(analysis.water_type, WaterType::Lake);
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(analysis.green_dominance, 0.5);
        assert_eq!(analysis.green_ratio, 0.4);
        assert_eq!(analysis.g_to_r_ratio, 1.5);
        assert_eq!(analysis.turbidity_indicator, 0.3);

        let ocean = WaterAnalysis::synthesized(WaterType::Ocean, SceneMetrics::default());
        assert_eq!(ocean.green_dominance, 0.1);
        assert_eq!(ocean.g_to_r_ratio, 1.0);
    }

    #[test]
    fn test_water_type_parse_and_display() {
        assert_eq!("Lake".parse::<WaterType>().unwrap(), WaterType::Lake);
        assert_eq!(WaterType::Ocean.to_string(), "ocean");
        assert!("river".parse::<WaterType>().is_err());
        assert_eq!(serde_json::to_string(&WaterType::Lake).unwrap(), "\"lake\"");
    }
}
