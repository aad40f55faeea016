//! Coupling between magenta compensation, red channel and dehaze
//!
//! Magenta compensation, red channel enhancement and dehaze all act on the
//! same green cast. Tuned independently they stack into an over-corrected,
//! purple image. This pass is the single place where that is prevented:
//!
//! - magenta factor > 1.3: red channel scale capped at 1.2, red stage
//!   disabled when the cap leaves it at or below 1.05
//! - magenta factor >= 1.4: dehaze strength multiplied by 0.7, dehaze stage
//!   disabled when the result is at or below 0.3
//!
//! The pass always runs last in tuning. It reads the pre-coupling values
//! from [`CouplingRecord`] when present, so running it again on its own
//! output changes nothing.

use super::params::ProcessingParameters;
use crate::constants::coupling;

/// Enforce the coupling rules in place
///
/// Returns a human-readable note for each adjustment made.
pub fn enforce_coupling(params: &mut ProcessingParameters) -> Vec<String> {
    let mut notes = Vec::new();
    let magenta = params.magenta_compensation.factor();

    if magenta > coupling::RED_CAP_MAGENTA {
        let before = params
            .coupling
            .red_scale_before
            .unwrap_or(params.red_channel_scale);
        let capped = before.min(coupling::RED_CAP);

        params.coupling.red_scale_before = Some(before);
        params.red_channel_scale = capped;

        if capped <= coupling::RED_DISABLE_AT {
            params.red_channel_enabled = false;
            notes.push(format!(
                "red channel disabled: scale {:.2} too small under magenta {:.1}",
                capped, magenta
            ));
        } else if capped < before {
            notes.push(format!(
                "red channel capped {:.2} -> {:.2} under magenta {:.1}",
                before, capped, magenta
            ));
        }
    }

    if magenta >= coupling::DEHAZE_REDUCE_MAGENTA {
        let before = params
            .coupling
            .dehaze_strength_before
            .unwrap_or(params.dehaze_strength);
        let reduced = before * coupling::DEHAZE_FACTOR;

        params.coupling.dehaze_strength_before = Some(before);
        params.dehaze_strength = reduced;

        if reduced <= coupling::DEHAZE_DISABLE_AT {
            params.dehaze_enabled = false;
            notes.push(format!(
                "dehaze disabled: strength {:.2} too small under magenta {:.1}",
                reduced, magenta
            ));
        } else {
            notes.push(format!(
                "dehaze reduced {:.2} -> {:.2} under magenta {:.1}",
                before, reduced, magenta
            ));
        }
    }

    for note in &notes {
        log::info!("Coupling: {}", note);
    }

    notes
}

/// Check the coupling invariant without changing anything
pub fn is_coupled(params: &ProcessingParameters) -> bool {
    let magenta = params.magenta_compensation.factor();
    let red_ok = magenta <= coupling::RED_CAP_MAGENTA
        || params.red_channel_scale <= coupling::RED_CAP + f32::EPSILON;
    let dehaze_ok = magenta < coupling::DEHAZE_REDUCE_MAGENTA
        || params
            .coupling
            .dehaze_strength_before
            .map(|before| {
                params.dehaze_strength <= before * coupling::DEHAZE_FACTOR + f32::EPSILON
            })
            .unwrap_or(false);
    red_ok && dehaze_ok
}
