//! Parameter auto-tuning
//!
//! Turns a [`WaterAnalysis`] into a complete [`ProcessingParameters`]. The
//! strategy follows the water type of the merged parameters: the analysis'
//! type, unless the baseline turned auto-detection off, in which case the
//! baseline's type is kept and its strategy runs on the measured statistics.
//!
//! # Lake strategy
//!
//! Every strength is split into a fixed base and a boost driven by the
//! statistics. When the classification is uncertain (confidence < 0.8) or the
//! green cast is mild (dominance < 0.3) the boosts are scaled by 0.8 and 0.7
//! respectively. Bases are never scaled, so no parameter drops below its
//! documented floor.
//!
//! # Ocean strategy
//!
//! White balance and red scale follow how far blue and green sit above red.
//! Dehaze follows turbidity. No magenta compensation.
//!
//! Both strategies finish with [`enforce_coupling`].

use super::coupling::enforce_coupling;
use super::params::{CouplingRecord, MagentaCompensation, ProcessingParameters};
use crate::constants::{fusion, lake, ocean, ranges, tuning_confidence};
use crate::water::{WaterAnalysis, WaterType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Tuned parameters with the reasoning behind them
#[derive(Debug, Clone, Serialize)]
pub struct TuneReport {
    pub parameters: ProcessingParameters,
    /// How much the statistics support the chosen parameters [0, 1]
    pub confidence: f32,
    /// Per-stage explanation, keyed by stage name
    pub notes: BTreeMap<String, String>,
}

/// Tune parameters for an analysis, merging into an optional baseline
///
/// Deterministic: identical inputs give identical output.
pub fn tune(analysis: &WaterAnalysis, baseline: Option<&ProcessingParameters>) -> ProcessingParameters {
    tune_with_report(analysis, baseline).parameters
}

/// Like [`tune`], also returning the tuning confidence and notes
pub fn tune_with_report(
    analysis: &WaterAnalysis,
    baseline: Option<&ProcessingParameters>,
) -> TuneReport {
    let mut notes = BTreeMap::new();
    let mut params = merge_baseline(analysis, baseline);

    let water_type = params.water_type;
    match water_type {
        WaterType::Lake => tune_lake(analysis, &mut params, &mut notes),
        WaterType::Ocean => tune_ocean(analysis, &mut params, &mut notes),
    }
    tune_fusion(analysis, &mut params, &mut notes);

    let coupling_notes = enforce_coupling(&mut params);
    if !coupling_notes.is_empty() {
        notes.insert("coupling".to_string(), coupling_notes.join("; "));
    }

    let confidence = match water_type {
        WaterType::Lake => lake_confidence(analysis),
        WaterType::Ocean => ocean_confidence(analysis),
    };

    log::info!(
        "Tuned {} parameters (tuning confidence {:.2}): wb={:.2} red={:.2}{} magenta={:?} dehaze={:.2}{} clahe={:.2} sat={:.1}",
        water_type,
        confidence,
        params.white_balance_strength,
        params.red_channel_scale,
        if params.red_channel_enabled { "" } else { " (off)" },
        params.magenta_compensation,
        params.dehaze_strength,
        if params.dehaze_enabled { "" } else { " (off)" },
        params.clahe_clip_limit,
        params.saturation_level
    );

    TuneReport {
        parameters: params,
        confidence,
        notes,
    }
}

/// Start from the baseline, keeping what the user chose
fn merge_baseline(
    analysis: &WaterAnalysis,
    baseline: Option<&ProcessingParameters>,
) -> ProcessingParameters {
    let mut params = baseline.cloned().unwrap_or_default();
    let manual = baseline.map(|b| !b.auto_detect).unwrap_or(false);

    if !manual {
        params.water_type = analysis.water_type;
    }

    // Stages the last coupling pass switched off get a fresh decision; a
    // stage off for any other reason was switched off by the user
    if !params.red_channel_enabled && params.coupling.disabled_red() {
        params.red_channel_enabled = true;
    }
    if !params.dehaze_enabled && params.coupling.disabled_dehaze() {
        params.dehaze_enabled = true;
    }
    params.coupling = CouplingRecord::default();

    params
}

/// Clamp a statistic to [0, 1], mapping NaN to 0
fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Boost multiplier for uncertain or mild lake scenes
fn aggressiveness(analysis: &WaterAnalysis, notes: &mut BTreeMap<String, String>) -> f32 {
    let mut multiplier = 1.0;
    let mut reasons = Vec::new();

    if analysis.confidence < lake::LOW_CONFIDENCE_THRESHOLD {
        multiplier *= lake::LOW_CONFIDENCE_FACTOR;
        reasons.push(format!("uncertain detection (confidence {:.2})", analysis.confidence));
    }
    if analysis.green_dominance < lake::MILD_CAST_DOMINANCE {
        multiplier *= lake::MILD_CAST_FACTOR;
        reasons.push(format!("mild green cast (dominance {:.2})", analysis.green_dominance));
    }

    if !reasons.is_empty() {
        notes.insert(
            "aggressiveness".to_string(),
            format!("boosts scaled by {:.2}: {}", multiplier, reasons.join(", ")),
        );
    }
    multiplier
}

fn tune_lake(
    analysis: &WaterAnalysis,
    params: &mut ProcessingParameters,
    notes: &mut BTreeMap<String, String>,
) {
    let m = aggressiveness(analysis, notes);
    let dominance = unit(analysis.green_dominance);
    let turbidity = unit(analysis.turbidity_indicator);
    let scene = &analysis.scene;

    let wb_boost = (dominance * lake::WB_DOMINANCE_GAIN).clamp(0.0, lake::WB_MAX_BOOST);
    params.white_balance_strength = (lake::WB_BASE + wb_boost * m).min(ranges::WHITE_BALANCE_MAX);
    notes.insert(
        "white_balance".to_string(),
        format!(
            "green water white balance (dominance {:.2}, strength {:.2})",
            dominance, params.white_balance_strength
        ),
    );

    let red_boost =
        ((analysis.g_to_r_ratio - 1.0) * lake::RED_G_TO_R_GAIN).clamp(0.0, lake::RED_MAX_BOOST);
    params.red_channel_scale = (lake::RED_BASE + red_boost * m).min(ranges::RED_SCALE_MAX);
    notes.insert(
        "red_channel".to_string(),
        format!(
            "green water red boost (G/R {:.2}, scale {:.2})",
            analysis.g_to_r_ratio, params.red_channel_scale
        ),
    );

    let selected = select_magenta(dominance, analysis.green_ratio);
    params.magenta_compensation = selected.scaled_down(m);
    notes.insert(
        "magenta_compensation".to_string(),
        format!(
            "{:?} compensation (dominance {:.2}, green ratio {:.2})",
            params.magenta_compensation, dominance, analysis.green_ratio
        ),
    );

    let haze_boost =
        (unit(scene.haze_level) * lake::DEHAZE_HAZE_GAIN - lake::DEHAZE_BASE).max(0.0);
    let dehaze_boost = haze_boost + turbidity * lake::DEHAZE_TURBIDITY_GAIN;
    params.dehaze_strength = (lake::DEHAZE_BASE + dehaze_boost * m).min(ranges::DEHAZE_MAX);
    params.turbidity_compensation = (lake::COMPENSATION_BASE
        + turbidity * lake::COMPENSATION_TURBIDITY_GAIN * m)
        .min(ranges::TURBIDITY_COMPENSATION_MAX);
    notes.insert(
        "dehazing".to_string(),
        format!(
            "turbid water dehaze (turbidity {:.2}, strength {:.2}, compensation {:.2})",
            turbidity, params.dehaze_strength, params.turbidity_compensation
        ),
    );

    let contrast_deficit = ((lake::CLAHE_CONTRAST_REFERENCE - scene.contrast)
        / lake::CLAHE_CONTRAST_DIVISOR)
        .clamp(0.0, lake::CLAHE_MAX_DEFICIT);
    let clahe_boost = turbidity * lake::CLAHE_TURBIDITY_GAIN + contrast_deficit;
    params.clahe_clip_limit = (lake::CLAHE_BASE + clahe_boost * m).min(ranges::CLAHE_CLIP_MAX);
    notes.insert(
        "clahe".to_string(),
        format!(
            "green water CLAHE (turbidity {:.2}, contrast {:.0}, clip {:.2})",
            turbidity, scene.contrast, params.clahe_clip_limit
        ),
    );

    let level = lake_saturation_level(dominance, scene.saturation_mean);
    params.saturation_level = scale_saturation(level, m);
    notes.insert(
        "saturation".to_string(),
        format!(
            "saturation {:.1} (dominance {:.2}, saturation mean {:.0})",
            params.saturation_level, dominance, scene.saturation_mean
        ),
    );

    let darkness = 1.0 - scene.mean_intensity / 255.0;
    let depth_proxy = lake::DEPTH_PROXY_WEIGHT * (turbidity + unit(darkness));
    params.depth_attenuation_factor = (lake::DEPTH_BASE + depth_proxy * lake::DEPTH_PROXY_GAIN)
        .clamp(ranges::DEPTH_FACTOR_MIN, ranges::DEPTH_FACTOR_MAX);
    params.attenuation = Default::default();
    notes.insert(
        "depth".to_string(),
        format!(
            "depth factor {:.2} (proxy {:.2})",
            params.depth_attenuation_factor, depth_proxy
        ),
    );
}

/// Magenta level from green dominance and green ratio
///
/// Both inputs are consulted so a moderately green but flat scene is not
/// pushed to the strong level on green ratio alone.
pub fn select_magenta(green_dominance: f32, green_ratio: f32) -> MagentaCompensation {
    if green_dominance > lake::MAGENTA_STRONG_DOMINANCE && green_ratio > lake::MAGENTA_STRONG_GREEN_RATIO
    {
        MagentaCompensation::Strong
    } else if green_dominance > lake::MAGENTA_MEDIUM_DOMINANCE
        || green_ratio > lake::MAGENTA_MEDIUM_GREEN_RATIO
    {
        MagentaCompensation::Medium
    } else {
        MagentaCompensation::Light
    }
}

/// Unscaled lake saturation step
fn lake_saturation_level(green_dominance: f32, saturation_mean: f32) -> f32 {
    let bucket = lake::SATURATION_DOMINANCE_BUCKETS
        .iter()
        .filter(|&&edge| green_dominance >= edge)
        .count();
    let desaturated = usize::from(saturation_mean < lake::SATURATION_DESATURATED_MEAN);
    let index = (1 + bucket + desaturated).min(ranges::SATURATION_STEPS.len() - 1);
    ranges::SATURATION_STEPS[index]
}

/// Scale the boost above 1.0 and drop to the highest step that fits
fn scale_saturation(level: f32, multiplier: f32) -> f32 {
    let target = 1.0 + (level - 1.0) * multiplier;
    ranges::SATURATION_STEPS
        .iter()
        .copied()
        .filter(|&step| step <= target + 1e-4)
        .fold(ranges::SATURATION_STEPS[0], f32::max)
}

fn tune_ocean(
    analysis: &WaterAnalysis,
    params: &mut ProcessingParameters,
    notes: &mut BTreeMap<String, String>,
) {
    let scene = &analysis.scene;
    let shift = (analysis.g_to_r_ratio + analysis.b_to_r_ratio) / 2.0;
    let excess = if shift.is_nan() { 0.0 } else { (shift - 1.0).max(0.0) };

    params.red_channel_scale = (ocean::RED_BASE + excess * ocean::RED_SHIFT_GAIN)
        .clamp(ranges::RED_SCALE_MIN, ranges::RED_SCALE_MAX);
    notes.insert(
        "red_channel".to_string(),
        format!(
            "blue shift {:.2} over red, scale {:.2}",
            shift, params.red_channel_scale
        ),
    );

    params.white_balance_strength = (ocean::WB_BASE + excess * ocean::WB_SHIFT_GAIN)
        .clamp(ranges::WHITE_BALANCE_MIN, ranges::WHITE_BALANCE_MAX);
    notes.insert(
        "white_balance".to_string(),
        format!(
            "color cast {:.1}, strength {:.2}",
            scene.color_cast, params.white_balance_strength
        ),
    );

    params.magenta_compensation = MagentaCompensation::None;

    params.dehaze_strength = (ocean::DEHAZE_BASE
        + unit(analysis.turbidity_indicator) * ocean::DEHAZE_TURBIDITY_GAIN)
        .min(ranges::DEHAZE_MAX);
    params.turbidity_compensation = ranges::TURBIDITY_COMPENSATION_MIN;
    notes.insert(
        "dehazing".to_string(),
        format!(
            "turbidity {:.2}, strength {:.2}",
            analysis.turbidity_indicator, params.dehaze_strength
        ),
    );

    params.clahe_clip_limit = ocean::CLAHE_CONTRAST_BUCKETS
        .iter()
        .find(|(below, _)| scene.contrast < *below)
        .map(|(_, clip)| *clip)
        .unwrap_or(ocean::CLAHE_HIGH_CONTRAST_CLIP);
    notes.insert(
        "clahe".to_string(),
        format!(
            "contrast {:.0}, clip {:.2}",
            scene.contrast, params.clahe_clip_limit
        ),
    );

    params.saturation_level = ocean::SATURATION_BUCKETS
        .iter()
        .find(|(below, _)| scene.saturation_mean < *below)
        .map(|(_, level)| *level)
        .unwrap_or(ocean::SATURATION_SATURATED);
    notes.insert(
        "saturation".to_string(),
        format!(
            "saturation mean {:.0}, level {:.1}",
            scene.saturation_mean, params.saturation_level
        ),
    );

    params.depth_attenuation_factor = ranges::DEPTH_FACTOR_MIN;
}

/// Balance between the dehazed and the detail variant, plus unsharp settings
fn tune_fusion(
    analysis: &WaterAnalysis,
    params: &mut ProcessingParameters,
    notes: &mut BTreeMap<String, String>,
) {
    let haze = unit(analysis.scene.haze_level);
    let detail = unit(analysis.scene.contrast / fusion::DETAIL_CONTRAST_SCALE);

    params.fusion_balance = (detail / (haze + detail + fusion::BALANCE_EPSILON))
        .clamp(ranges::FUSION_BALANCE_MIN, ranges::FUSION_BALANCE_MAX);
    params.unsharp_amount = (detail * fusion::UNSHARP_AMOUNT_GAIN)
        .clamp(fusion::UNSHARP_AMOUNT_MIN, fusion::UNSHARP_AMOUNT_MAX);
    params.unsharp_radius =
        (1.0 + detail).clamp(fusion::UNSHARP_RADIUS_MIN, fusion::UNSHARP_RADIUS_MAX);

    let focus = if params.fusion_balance > 0.7 {
        "detail-focused"
    } else if params.fusion_balance > 0.3 {
        "balanced"
    } else {
        "haze-focused"
    };
    notes.insert(
        "fusion".to_string(),
        format!("{} (balance {:.2})", focus, params.fusion_balance),
    );
}

fn first_bonus(value: f32, table: &[(f32, f32)]) -> f32 {
    table
        .iter()
        .find(|(above, _)| value > *above)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0)
}

fn lake_confidence(analysis: &WaterAnalysis) -> f32 {
    (tuning_confidence::LAKE_BASE
        + first_bonus(analysis.confidence, &tuning_confidence::LAKE_CLASSIFIER_BONUS)
        + first_bonus(analysis.green_dominance, &tuning_confidence::LAKE_DOMINANCE_BONUS))
    .min(1.0)
}

fn ocean_confidence(analysis: &WaterAnalysis) -> f32 {
    let scene = &analysis.scene;
    let (low, high) = tuning_confidence::OCEAN_CONTRAST_WINDOW;
    let contrast_bonus = if scene.contrast > low && scene.contrast < high {
        tuning_confidence::OCEAN_CONTRAST_BONUS
    } else {
        0.0
    };
    (tuning_confidence::OCEAN_BASE
        + first_bonus(scene.color_cast, &tuning_confidence::OCEAN_CAST_BONUS)
        + first_bonus(scene.haze_level, &tuning_confidence::OCEAN_HAZE_BONUS)
        + contrast_bonus)
        .min(1.0)
}

/// Saturation step under the given boost multiplier, exposed for tests
#[cfg(test)]
pub(crate) fn saturation_for(green_dominance: f32, saturation_mean: f32, multiplier: f32) -> f32 {
    scale_saturation(lake_saturation_level(green_dominance, saturation_mean), multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::coupling::is_coupled;
    use crate::water::SceneMetrics;
    use approx::assert_abs_diff_eq;

    fn lake_analysis(dominance: f32, g_to_r: f32, confidence: f32) -> WaterAnalysis {
        WaterAnalysis {
            green_dominance: dominance,
            green_ratio: 0.45,
            g_to_r_ratio: g_to_r,
            b_to_r_ratio: 1.1,
            turbidity_indicator: 0.3,
            water_type: WaterType::Lake,
            confidence,
            scene: SceneMetrics::default(),
        }
    }

    fn ocean_analysis(turbidity: f32) -> WaterAnalysis {
        WaterAnalysis {
            green_dominance: 0.1,
            green_ratio: 0.3,
            g_to_r_ratio: 1.2,
            b_to_r_ratio: 1.6,
            turbidity_indicator: turbidity,
            water_type: WaterType::Ocean,
            confidence: 0.9,
            scene: SceneMetrics::default(),
        }
    }

    #[test]
    fn test_strong_lake_is_coupled() {
        let params = tune(&lake_analysis(0.61, 1.5, 1.0), None);
        assert_eq!(params.magenta_compensation, MagentaCompensation::Strong);
        assert!(params.red_channel_scale <= 1.2);
        let before = params.coupling.dehaze_strength_before.unwrap();
        assert_abs_diff_eq!(params.dehaze_strength, before * 0.7, epsilon = 1e-6);
        assert!(is_coupled(&params));
    }

    #[test]
    fn test_lake_white_balance_and_red_formulas() {
        let params = tune(&lake_analysis(0.61, 1.5, 1.0), None);
        assert_abs_diff_eq!(params.white_balance_strength, 1.0 + 0.61 * 0.4, epsilon = 1e-5);
        let red_before = params.coupling.red_scale_before.unwrap();
        assert_abs_diff_eq!(red_before, 1.2 + 0.5 * 0.3, epsilon = 1e-5);
    }

    #[test]
    fn test_borderline_lake_is_gentler() {
        let confident = tune(&lake_analysis(0.61, 1.5, 1.0), None);
        let borderline = tune(&lake_analysis(0.25, 1.5, 0.6), None);

        assert!(borderline.white_balance_strength < confident.white_balance_strength);
        assert!(borderline.clahe_clip_limit <= confident.clahe_clip_limit);
        assert!(borderline.magenta_compensation < confident.magenta_compensation);

        // Boost portions scaled by 0.8 * 0.7
        let wb_boost = 0.25 * 0.4 * 0.56;
        assert_abs_diff_eq!(borderline.white_balance_strength, 1.0 + wb_boost, epsilon = 1e-5);
        let red_boost = 0.5 * 0.3 * 0.56;
        assert_abs_diff_eq!(borderline.red_channel_scale, 1.2 + red_boost, epsilon = 1e-5);
    }

    #[test]
    fn test_modifiers_never_go_below_base() {
        let params = tune(&lake_analysis(0.0, 1.31, 0.0), None);
        assert!(params.white_balance_strength >= 1.0);
        assert!(params.red_channel_scale >= 1.2 || !params.red_channel_enabled);
        assert!(params.clahe_clip_limit >= 2.5);
        assert!(params.saturation_level >= 1.0);
        assert!(params.turbidity_compensation >= 1.0);
    }

    #[test]
    fn test_magenta_selection_thresholds() {
        assert_eq!(select_magenta(0.6, 0.45), MagentaCompensation::Strong);
        assert_eq!(select_magenta(0.6, 0.35), MagentaCompensation::Medium);
        assert_eq!(select_magenta(0.2, 0.38), MagentaCompensation::Medium);
        assert_eq!(select_magenta(0.2, 0.33), MagentaCompensation::Light);
    }

    #[test]
    fn test_saturation_steps_follow_dominance() {
        assert_eq!(saturation_for(0.1, 100.0, 1.0), 1.1);
        assert_eq!(saturation_for(0.3, 100.0, 1.0), 1.2);
        assert_eq!(saturation_for(0.4, 100.0, 1.0), 1.3);
        assert_eq!(saturation_for(0.6, 100.0, 1.0), 1.4);
        assert_eq!(saturation_for(0.4, 40.0, 1.0), 1.4);
        assert_eq!(saturation_for(0.6, 40.0, 1.0), 1.4);
        assert_eq!(saturation_for(0.4, 100.0, 0.56), 1.1);
    }

    #[test]
    fn test_ocean_has_no_magenta() {
        let params = tune(&ocean_analysis(0.5), None);
        assert_eq!(params.water_type, WaterType::Ocean);
        assert_eq!(params.magenta_compensation, MagentaCompensation::None);
        assert_eq!(params.depth_attenuation_factor, 1.0);
        assert!(params.coupling.is_empty());
    }

    #[test]
    fn test_ocean_dehaze_follows_turbidity() {
        let clear = tune(&ocean_analysis(0.1), None);
        let murky = tune(&ocean_analysis(0.8), None);
        assert!(murky.dehaze_strength > clear.dehaze_strength);
        assert_abs_diff_eq!(clear.dehaze_strength, 0.3 + 0.1 * 0.6, epsilon = 1e-5);
    }

    #[test]
    fn test_ocean_red_follows_blue_shift() {
        let mut shifted = ocean_analysis(0.2);
        shifted.b_to_r_ratio = 2.5;
        let mild = tune(&ocean_analysis(0.2), None);
        let strong = tune(&shifted, None);
        assert!(strong.red_channel_scale > mild.red_channel_scale);
        assert!(strong.white_balance_strength > mild.white_balance_strength);
    }

    #[test]
    fn test_manual_baseline_preserved() {
        let baseline = ProcessingParameters {
            water_type: WaterType::Lake,
            auto_detect: false,
            ..ProcessingParameters::default()
        };
        let report = tune_with_report(&ocean_analysis(0.2), Some(&baseline));
        let params = &report.parameters;
        assert_eq!(params.water_type, WaterType::Lake);
        assert!(!params.auto_detect);

        // Lake strategy runs on the measured statistics
        assert_ne!(params.magenta_compensation, MagentaCompensation::None);
        assert!(params.red_channel_scale >= 1.2);
        assert!(params.depth_attenuation_factor > 1.0);
        assert!(report.notes["white_balance"].contains("green water"));
    }

    #[test]
    fn test_manual_ocean_on_green_statistics() {
        let baseline = ProcessingParameters {
            water_type: WaterType::Ocean,
            auto_detect: false,
            ..ProcessingParameters::default()
        };
        let params = tune(&lake_analysis(0.61, 1.5, 1.0), Some(&baseline));
        assert_eq!(params.water_type, WaterType::Ocean);
        assert_eq!(params.magenta_compensation, MagentaCompensation::None);
        assert!(params.coupling.is_empty());
    }

    #[test]
    fn test_user_disabled_stage_stays_off_after_retune() {
        let analysis = lake_analysis(0.61, 1.5, 1.0);
        let mut edited = tune(&analysis, None);
        assert!(!edited.coupling.is_empty());
        edited.red_channel_enabled = false;
        edited.dehaze_enabled = false;

        let retuned = tune(&analysis, Some(&edited));
        assert!(!retuned.red_channel_enabled);
        assert!(!retuned.dehaze_enabled);
    }

    #[test]
    fn test_coupling_disabled_stage_gets_fresh_decision() {
        let mut coupled = tune(&lake_analysis(0.61, 1.5, 1.0), None);
        coupled.red_channel_scale = 1.0;
        coupled.red_channel_enabled = false;
        coupled.coupling.red_scale_before = Some(1.0);

        let retuned = tune(&lake_analysis(0.61, 1.5, 1.0), Some(&coupled));
        assert!(retuned.red_channel_enabled);
        assert_abs_diff_eq!(retuned.red_channel_scale, 1.2, epsilon = 1e-6);
    }

    #[test]
    fn test_auto_baseline_takes_detected_type() {
        let baseline = ProcessingParameters {
            water_type: WaterType::Ocean,
            ..ProcessingParameters::default()
        };
        let params = tune(&lake_analysis(0.5, 1.5, 0.9), Some(&baseline));
        assert_eq!(params.water_type, WaterType::Lake);
        assert!(params.auto_detect);
    }

    #[test]
    fn test_user_choices_survive_tuning() {
        let baseline = ProcessingParameters {
            fusion_enabled: true,
            fusion_method: crate::tuning::FusionMethod::Pca,
            clahe_enabled: false,
            ..ProcessingParameters::default()
        };
        let params = tune(&ocean_analysis(0.2), Some(&baseline));
        assert!(params.fusion_enabled);
        assert_eq!(params.fusion_method, crate::tuning::FusionMethod::Pca);
        assert!(!params.clahe_enabled);
    }

    #[test]
    fn test_retuning_coupled_output_is_stable() {
        let analysis = lake_analysis(0.61, 1.5, 1.0);
        let first = tune(&analysis, None);
        let second = tune(&analysis, Some(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn test_deterministic() {
        let analysis = lake_analysis(0.45, 1.4, 0.75);
        assert_eq!(tune(&analysis, None), tune(&analysis, None));
    }

    #[test]
    fn test_report_confidence_and_notes() {
        let report = tune_with_report(&lake_analysis(0.61, 1.5, 1.0), None);
        assert_abs_diff_eq!(report.confidence, 0.95, epsilon = 1e-6);
        assert!(report.notes.contains_key("coupling"));
        assert!(report.notes.contains_key("magenta_compensation"));

        let gentle = tune_with_report(&lake_analysis(0.25, 1.5, 0.6), None);
        assert!(gentle.notes["aggressiveness"].contains("0.56"));
    }

    #[test]
    fn test_fusion_balance_formula() {
        let mut analysis = ocean_analysis(0.2);
        analysis.scene.haze_level = 0.4;
        analysis.scene.contrast = 500.0;
        let params = tune(&analysis, None);
        assert_abs_diff_eq!(params.fusion_balance, 0.5 / (0.4 + 0.5 + 0.1), epsilon = 1e-5);
        assert_abs_diff_eq!(params.unsharp_amount, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(params.unsharp_radius, 1.5, epsilon = 1e-5);
    }
}
