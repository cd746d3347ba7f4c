//! Stateless mapping from transition progress to camera parameters.

use std::f32::consts::PI;

use liminal_core::{TransitionEffect, TransitionParams};

const WARP_FOV_SWING: f32 = 35.0;
const ZOOM_GAIN: f32 = 2.0;
const ZOOM_FOV_NARROWING: f32 = 30.0;
const DISSOLVE_NOISE: f32 = 0.15;
const IMPOSSIBLE_FREQUENCY: f32 = 3.0;
const IMPOSSIBLE_FOV_SWING: f32 = 60.0;
const IMPOSSIBLE_WARP_GAIN: f32 = 1.5;
const IMPOSSIBLE_FADE: f32 = 0.5;

/// Cubic ease-in/ease-out over `[0, 1]`; inputs outside the range are clamped.
#[must_use]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Samples the camera parameters of `effect` at `progress`.
///
/// Pure: the same pair always yields the same parameters.
#[must_use]
pub fn transition_params(progress: f32, effect: TransitionEffect) -> TransitionParams {
    let eased = ease_in_out_cubic(progress);
    let base = TransitionParams::NEUTRAL;
    match effect {
        TransitionEffect::Fade => TransitionParams {
            opacity: 1.0 - eased,
            ..base
        },
        TransitionEffect::Warp => {
            let bump = (eased * PI).sin();
            TransitionParams {
                fov: base.fov + WARP_FOV_SWING * bump,
                warp_strength: bump,
                ..base
            }
        }
        TransitionEffect::Zoom => TransitionParams {
            fov: base.fov - ZOOM_FOV_NARROWING * eased,
            zoom: 1.0 + ZOOM_GAIN * eased,
            ..base
        },
        TransitionEffect::Dissolve => TransitionParams {
            opacity: 1.0 - eased,
            warp_strength: DISSOLVE_NOISE * (eased * PI).sin(),
            ..base
        },
        TransitionEffect::Impossible => {
            let swing = (IMPOSSIBLE_FREQUENCY * eased * PI).sin();
            TransitionParams {
                fov: base.fov + IMPOSSIBLE_FOV_SWING * swing,
                opacity: 1.0 - IMPOSSIBLE_FADE * eased,
                warp_strength: swing.abs() * IMPOSSIBLE_WARP_GAIN,
                ..base
            }
        }
    }
}
