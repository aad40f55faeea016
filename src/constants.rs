//! Thresholds, multipliers and defaults for water classification and tuning
//!
//! Every magic number used by the classifier, the auto-tuner and the
//! correction stages lives here, grouped by the component that reads it.

/// Guards against degenerate channel statistics
pub mod numeric {
    /// Denominators below this magnitude yield the neutral ratio instead
    pub const RATIO_EPSILON: f32 = 1e-3;

    /// Ratio reported when a denominator is degenerate
    pub const NEUTRAL_RATIO: f32 = 1.0;

    /// Green share of luminance for a perfectly neutral image
    pub const NEUTRAL_GREEN_RATIO: f32 = 1.0 / 3.0;
}

/// Image statistics analyzer
pub mod analysis {
    /// Longest side of the analysis downsample
    pub const MAX_ANALYSIS_DIMENSION: i32 = 512;

    /// Common working size for the edge and haze measurements
    pub const STRUCTURE_DIMENSION: i32 = 512;

    /// OpenCV hue band (0-180 scale) counted as green
    pub const GREEN_HUE_MIN: u8 = 40;
    pub const GREEN_HUE_MAX: u8 = 80;

    /// Minimum HSV saturation for a pixel to count as green
    pub const GREEN_MIN_SATURATION: u8 = 30;

    /// Laplacian standard deviation of a crisp, clear-water image
    pub const LAPLACIAN_CLEAR_STD: f32 = 40.0;

    /// Weight of channel excess vs green pixel share in green dominance
    pub const DOMINANCE_EXCESS_WEIGHT: f32 = 0.7;
    pub const DOMINANCE_PIXEL_WEIGHT: f32 = 0.3;

    /// Weight of edge deficit vs dark-channel haze in the turbidity indicator
    pub const TURBIDITY_EDGE_WEIGHT: f32 = 0.5;
    pub const TURBIDITY_HAZE_WEIGHT: f32 = 0.5;

    /// Dark channel patch used for the haze statistic
    pub const HAZE_PATCH_SIZE: i32 = 15;
}

/// Water type classifier
pub mod classification {
    /// Green dominance above which the scene is lake water
    pub const GREEN_DOMINANCE_THRESHOLD: f32 = 0.35;

    /// Green-to-red ratio above which the scene is lake water
    pub const G_TO_R_THRESHOLD: f32 = 1.3;

    /// Distance past a threshold that maps to full confidence
    pub const DOMINANCE_CONFIDENCE_SPAN: f32 = 0.25;
    pub const G_TO_R_CONFIDENCE_SPAN: f32 = 0.4;

    /// Confidence reported exactly on a threshold
    pub const BORDERLINE_CONFIDENCE: f32 = 0.5;
}

/// Statistics substituted when the user forces a water type
pub mod synthetic {
    pub mod lake {
        pub const GREEN_DOMINANCE: f32 = 0.5;
        pub const GREEN_RATIO: f32 = 0.4;
        pub const G_TO_R_RATIO: f32 = 1.5;
        pub const B_TO_R_RATIO: f32 = 1.2;
        pub const TURBIDITY: f32 = 0.3;
    }

    pub mod ocean {
        pub const GREEN_DOMINANCE: f32 = 0.1;
        pub const GREEN_RATIO: f32 = 0.3;
        pub const G_TO_R_RATIO: f32 = 1.0;
        pub const B_TO_R_RATIO: f32 = 1.4;
        pub const TURBIDITY: f32 = 0.1;
    }

    /// Confidence of a user-selected water type
    pub const FORCED_CONFIDENCE: f32 = 1.0;
}

/// Documented ranges of every tuned parameter
pub mod ranges {
    pub const WHITE_BALANCE_MIN: f32 = 0.0;
    pub const WHITE_BALANCE_MAX: f32 = 1.3;

    pub const RED_SCALE_MIN: f32 = 1.0;
    pub const RED_SCALE_MAX: f32 = 1.6;

    pub const DEHAZE_MIN: f32 = 0.0;
    pub const DEHAZE_MAX: f32 = 1.0;

    pub const TURBIDITY_COMPENSATION_MIN: f32 = 1.0;
    pub const TURBIDITY_COMPENSATION_MAX: f32 = 1.5;

    pub const CLAHE_CLIP_MIN: f32 = 2.5;
    pub const CLAHE_CLIP_MAX: f32 = 3.5;

    /// Allowed saturation multipliers, ascending
    pub const SATURATION_STEPS: [f32; 5] = [1.0, 1.1, 1.2, 1.3, 1.4];

    pub const DEPTH_FACTOR_MIN: f32 = 1.0;
    pub const DEPTH_FACTOR_MAX: f32 = 1.5;

    pub const FUSION_BALANCE_MIN: f32 = 0.0;
    pub const FUSION_BALANCE_MAX: f32 = 1.0;

    pub const UNSHARP_AMOUNT_MIN: f32 = 0.0;
    pub const UNSHARP_AMOUNT_MAX: f32 = 3.0;

    pub const UNSHARP_RADIUS_MIN: f32 = 0.5;
    pub const UNSHARP_RADIUS_MAX: f32 = 3.0;

    pub const PERCENTILE_MIN: f32 = 0.0;
    pub const PERCENTILE_MAX: f32 = 100.0;

    pub const ATTENUATION_MIN: f32 = 0.0;
    pub const ATTENUATION_MAX: f32 = 2.0;
}

/// Parameter values used before any tuning has run
pub mod defaults {
    pub const WHITE_BALANCE_STRENGTH: f32 = 1.0;
    pub const ROBUST_LOWER_PERCENTILE: f32 = 5.0;
    pub const ROBUST_UPPER_PERCENTILE: f32 = 95.0;
    pub const WHITE_PATCH_PERCENTILE: f32 = 99.0;
    pub const RED_CHANNEL_SCALE: f32 = 1.3;
    pub const DEHAZE_STRENGTH: f32 = 0.8;
    pub const TURBIDITY_COMPENSATION: f32 = 1.2;
    pub const CLAHE_CLIP_LIMIT: f32 = 2.5;
    pub const SATURATION_LEVEL: f32 = 1.2;
    pub const DEPTH_ATTENUATION_FACTOR: f32 = 1.0;
    pub const FUSION_BALANCE: f32 = 0.5;
    pub const UNSHARP_AMOUNT: f32 = 1.5;
    pub const UNSHARP_RADIUS: f32 = 1.0;
}

/// Lake (green water) strategy
pub mod lake {
    /// White balance: 1.0 + min(0.4, dominance * 0.4)
    pub const WB_BASE: f32 = 1.0;
    pub const WB_DOMINANCE_GAIN: f32 = 0.4;
    pub const WB_MAX_BOOST: f32 = 0.4;

    /// Red channel: 1.2 + min(0.4, (G/R - 1) * 0.3)
    pub const RED_BASE: f32 = 1.2;
    pub const RED_G_TO_R_GAIN: f32 = 0.3;
    pub const RED_MAX_BOOST: f32 = 0.4;

    /// Magenta level selection
    pub const MAGENTA_STRONG_DOMINANCE: f32 = 0.5;
    pub const MAGENTA_STRONG_GREEN_RATIO: f32 = 0.4;
    pub const MAGENTA_MEDIUM_DOMINANCE: f32 = 0.3;
    pub const MAGENTA_MEDIUM_GREEN_RATIO: f32 = 0.37;

    /// Dehaze: 0.5 base, haze term, turbidity * 0.3
    pub const DEHAZE_BASE: f32 = 0.5;
    pub const DEHAZE_HAZE_GAIN: f32 = 1.2;
    pub const DEHAZE_TURBIDITY_GAIN: f32 = 0.3;

    /// Fusion compensation: 1.0 + turbidity * 0.4
    pub const COMPENSATION_BASE: f32 = 1.0;
    pub const COMPENSATION_TURBIDITY_GAIN: f32 = 0.4;

    /// CLAHE: 2.5 + turbidity * 0.5 + contrast deficit (bounded)
    pub const CLAHE_BASE: f32 = 2.5;
    pub const CLAHE_TURBIDITY_GAIN: f32 = 0.5;
    pub const CLAHE_CONTRAST_REFERENCE: f32 = 400.0;
    pub const CLAHE_CONTRAST_DIVISOR: f32 = 300.0;
    pub const CLAHE_MAX_DEFICIT: f32 = 1.0;

    /// Saturation dominance buckets, mapped onto SATURATION_STEPS[1..]
    pub const SATURATION_DOMINANCE_BUCKETS: [f32; 3] = [0.2, 0.35, 0.5];

    /// Scenes this desaturated get one extra saturation step
    pub const SATURATION_DESATURATED_MEAN: f32 = 60.0;

    /// Aggressiveness modifiers
    pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.8;
    pub const LOW_CONFIDENCE_FACTOR: f32 = 0.8;
    pub const MILD_CAST_DOMINANCE: f32 = 0.3;
    pub const MILD_CAST_FACTOR: f32 = 0.7;

    /// Depth attenuation: min(1.5, 1.0 + depth_proxy * 2.0)
    pub const DEPTH_BASE: f32 = 1.0;
    pub const DEPTH_PROXY_GAIN: f32 = 2.0;
    pub const DEPTH_PROXY_WEIGHT: f32 = 0.25;

    /// Beer-Lambert attenuation coefficients for green water
    pub const ATTENUATION_RED: f32 = 0.45;
    pub const ATTENUATION_GREEN: f32 = 0.25;
}

/// Ocean (blue water) strategy
pub mod ocean {
    /// White balance: base + (blue-green over red excess) * gain
    pub const WB_BASE: f32 = 0.7;
    pub const WB_SHIFT_GAIN: f32 = 0.4;

    /// Red channel: 1.0 + (blue-green over red excess) * gain
    pub const RED_BASE: f32 = 1.0;
    pub const RED_SHIFT_GAIN: f32 = 0.35;

    /// Dehaze: base + turbidity * gain
    pub const DEHAZE_BASE: f32 = 0.3;
    pub const DEHAZE_TURBIDITY_GAIN: f32 = 0.6;

    /// CLAHE clip by Laplacian-variance contrast bucket
    pub const CLAHE_CONTRAST_BUCKETS: [(f32, f32); 3] = [(100.0, 3.5), (300.0, 3.0), (600.0, 2.5)];
    pub const CLAHE_HIGH_CONTRAST_CLIP: f32 = 2.5;

    /// Saturation by HSV saturation mean bucket
    pub const SATURATION_BUCKETS: [(f32, f32); 2] = [(80.0, 1.4), (120.0, 1.2)];
    pub const SATURATION_SATURATED: f32 = 1.1;
}

/// Fusion tuning shared by both strategies
pub mod fusion {
    pub const DETAIL_CONTRAST_SCALE: f32 = 1000.0;
    pub const BALANCE_EPSILON: f32 = 0.1;
    pub const UNSHARP_AMOUNT_GAIN: f32 = 2.0;
    pub const UNSHARP_AMOUNT_MIN: f32 = 0.5;
    pub const UNSHARP_AMOUNT_MAX: f32 = 2.5;
    pub const UNSHARP_RADIUS_MIN: f32 = 0.5;
    pub const UNSHARP_RADIUS_MAX: f32 = 2.0;
}

/// Coupling rules between magenta compensation, red channel and dehaze
pub mod coupling {
    /// Magenta factor above which the red channel is capped
    pub const RED_CAP_MAGENTA: f32 = 1.3;

    /// Red channel cap under strong magenta compensation
    pub const RED_CAP: f32 = 1.2;

    /// Red scales at or below this are disabled outright
    pub const RED_DISABLE_AT: f32 = 1.05;

    /// Magenta factor from which dehaze is reduced (inclusive)
    pub const DEHAZE_REDUCE_MAGENTA: f32 = 1.4;

    /// Dehaze multiplier under strongest magenta compensation
    pub const DEHAZE_FACTOR: f32 = 0.7;

    /// Dehaze strengths at or below this are disabled outright
    pub const DEHAZE_DISABLE_AT: f32 = 0.3;
}

/// Tuning-confidence scoring for the report
pub mod tuning_confidence {
    pub const LAKE_BASE: f32 = 0.6;
    pub const OCEAN_BASE: f32 = 0.5;

    /// Lake: (classifier confidence above, bonus), strongest first
    pub const LAKE_CLASSIFIER_BONUS: [(f32, f32); 2] = [(0.8, 0.2), (0.6, 0.1)];
    /// Lake: (green dominance above, bonus), strongest first
    pub const LAKE_DOMINANCE_BONUS: [(f32, f32); 2] = [(0.2, 0.15), (0.15, 0.1)];

    /// Ocean: (color cast above, bonus), strongest first
    pub const OCEAN_CAST_BONUS: [(f32, f32); 2] = [(15.0, 0.2), (8.0, 0.1)];
    /// Ocean: (haze level above, bonus), strongest first
    pub const OCEAN_HAZE_BONUS: [(f32, f32); 2] = [(0.3, 0.2), (0.15, 0.1)];
    /// Ocean: contrast window that reads as a well-exposed scene
    pub const OCEAN_CONTRAST_WINDOW: (f32, f32) = (100.0, 1000.0);
    pub const OCEAN_CONTRAST_BONUS: f32 = 0.1;
}

/// Correction stage internals
pub mod pipeline {
    /// Dark channel prior defaults
    pub const DARK_CHANNEL_PATCH: i32 = 15;
    pub const ATMOSPHERIC_TOP_FRACTION: f32 = 0.001;
    pub const DEHAZE_OMEGA: f32 = 0.95;
    pub const TRANSMISSION_FLOOR: f32 = 0.1;
    pub const TRANSMISSION_BLUR: i32 = 15;

    /// CLAHE tile grid
    pub const CLAHE_TILE_GRID: i32 = 8;

    /// Red channel highlight roll-off knee (normalized)
    pub const RED_ROLLOFF_KNEE: f32 = 0.8;

    /// Magenta compensation channel shares of (factor - 1)
    pub const MAGENTA_RED_SHARE: f32 = 0.3;
    pub const MAGENTA_BLUE_SHARE: f32 = 0.2;

    /// Values within this of an identity setting are treated as identity
    pub const IDENTITY_EPSILON: f32 = 1e-6;
}
