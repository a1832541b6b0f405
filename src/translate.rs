//! Translation of [`Effect`] descriptions into `SDL_HapticEffect`.
//!
//! SDL wants a tagged union where the first field of every member doubles
//! as the type tag. Each builder below fills one member on a zeroed struct,
//! so only the fields of the selected kind are ever written.

use crate::{
    effects::*,
    error::{HapticError, HapticResult},
    AXIS_ORDER_INVERTED,
};
use sdl3_sys::haptic::*;
use std::mem;
use tracing::debug;

/// SDL counts haptic trigger buttons from 1 and reserves 0 for "none".
pub fn haptic_button(button: Option<u16>) -> u16 {
    match button {
        Some(index) => index.saturating_add(1),
        None => 0,
    }
}

pub fn haptic_length(length: Length) -> u32 {
    match length {
        Length::Infinite => SDL_HAPTIC_INFINITY,
        Length::Millis(ms) => ms,
    }
}

pub fn haptic_iterations(iterations: Iterations) -> u32 {
    match iterations {
        Iterations::Infinite => SDL_HAPTIC_INFINITY,
        Iterations::Times(n) => n,
    }
}

/// Encode a direction into SDL's three-slot vector.
///
/// With `invert_axis_order` the first two Cartesian components trade places.
pub fn haptic_direction(direction: &Direction, invert_axis_order: bool) -> SDL_HapticDirection {
    match *direction {
        Direction::Polar { angle } => SDL_HapticDirection {
            r#type: SDL_HAPTIC_POLAR,
            dir: [angle, 0, 0],
        },
        Direction::Spherical { angles } => SDL_HapticDirection {
            r#type: SDL_HAPTIC_SPHERICAL,
            dir: [angles[0], angles[1], 0],
        },
        Direction::Cartesian { x, y, z } => {
            let dir = if invert_axis_order { [y, x, z] } else { [x, y, z] };
            SDL_HapticDirection {
                r#type: SDL_HAPTIC_CARTESIAN,
                dir,
            }
        }
    }
}

/// SDL type tag for an effect kind.
pub fn haptic_type(kind: EffectKind) -> SDL_HapticEffectType {
    match kind {
        EffectKind::Constant => SDL_HAPTIC_CONSTANT,
        EffectKind::Sine => SDL_HAPTIC_SINE,
        EffectKind::Square => SDL_HAPTIC_SQUARE,
        EffectKind::Triangle => SDL_HAPTIC_TRIANGLE,
        EffectKind::SawtoothUp => SDL_HAPTIC_SAWTOOTHUP,
        EffectKind::SawtoothDown => SDL_HAPTIC_SAWTOOTHDOWN,
        EffectKind::Ramp => SDL_HAPTIC_RAMP,
        EffectKind::Spring => SDL_HAPTIC_SPRING,
        EffectKind::Damper => SDL_HAPTIC_DAMPER,
        EffectKind::Inertia => SDL_HAPTIC_INERTIA,
        EffectKind::Friction => SDL_HAPTIC_FRICTION,
        EffectKind::Custom => SDL_HAPTIC_CUSTOM,
    }
}

/// An `SDL_HapticEffect` ready for submission.
///
/// Custom effects point SDL at sample memory owned by this value, so the
/// buffer lives exactly as long as the effect description and is freed
/// once on drop, whether or not SDL accepted it.
pub struct NativeEffect {
    raw: SDL_HapticEffect,
    kind: EffectKind,
    samples: Option<Vec<u16>>,
}

impl NativeEffect {
    /// Translate using the build's axis order.
    pub fn from_effect(effect: &Effect) -> HapticResult<Self> {
        Self::with_axis_order(effect, AXIS_ORDER_INVERTED)
    }

    pub fn with_axis_order(effect: &Effect, invert_axis_order: bool) -> HapticResult<Self> {
        let kind = effect.kind();
        let mut native = NativeEffect {
            // SAFETY: SDL_HapticEffect is plain C data, all-zero is a valid value
            raw: unsafe { mem::zeroed() },
            kind,
            samples: None,
        };

        match effect {
            Effect::Constant { params, force } => {
                native.raw.constant = build_constant(params, force, invert_axis_order);
            }
            Effect::Periodic { params, effect } => {
                native.raw.periodic =
                    build_periodic(haptic_type(kind), params, effect, invert_axis_order);
            }
            Effect::Ramp { params, effect } => {
                native.raw.ramp = build_ramp(params, effect, invert_axis_order);
            }
            Effect::Condition { params, effect } => {
                native.raw.condition = build_condition(haptic_type(kind), params, effect);
            }
            Effect::Custom { params, effect } => {
                let mut samples = copy_samples(effect)?;
                native.raw.custom =
                    build_custom(params, effect, samples.as_mut_ptr(), invert_axis_order);
                native.samples = Some(samples);
            }
        }

        debug!(%kind, "translated haptic effect");
        Ok(native)
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn raw(&self) -> &SDL_HapticEffect {
        &self.raw
    }

    pub fn as_ptr(&self) -> *const SDL_HapticEffect {
        &self.raw
    }
}

impl std::fmt::Debug for NativeEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEffect")
            .field("kind", &self.kind)
            .field("samples", &self.samples.as_ref().map(Vec::len))
            .finish()
    }
}

fn copy_samples(custom: &CustomEffect) -> HapticResult<Vec<u16>> {
    let needed = custom.sample_count();
    if custom.data.len() < needed {
        return Err(HapticError::InvalidParameter(format!(
            "custom effect needs {} samples ({} x {} channels), got {}",
            needed,
            custom.samples,
            custom.channels,
            custom.data.len()
        )));
    }
    Ok(custom.data[..needed].to_vec())
}

fn build_constant(
    params: &EffectParams,
    force: &ConstantForce,
    invert_axis_order: bool,
) -> SDL_HapticConstant {
    // SAFETY: plain C struct, zero is valid
    let mut constant: SDL_HapticConstant = unsafe { mem::zeroed() };
    constant.r#type = SDL_HAPTIC_CONSTANT;
    constant.direction = haptic_direction(&force.direction, invert_axis_order);
    constant.length = haptic_length(params.length);
    constant.delay = params.delay;
    constant.button = haptic_button(params.button);
    constant.interval = params.interval;
    constant.level = force.level;

    constant.attack_length = force.envelope.attack_length;
    constant.attack_level = force.envelope.attack_level;
    constant.fade_length = force.envelope.fade_length;
    constant.fade_level = force.envelope.fade_level;
    constant
}

fn build_periodic(
    wave: SDL_HapticEffectType,
    params: &EffectParams,
    periodic: &PeriodicEffect,
    invert_axis_order: bool,
) -> SDL_HapticPeriodic {
    // SAFETY: plain C struct, zero is valid
    let mut effect: SDL_HapticPeriodic = unsafe { mem::zeroed() };
    effect.r#type = wave;
    effect.direction = haptic_direction(&periodic.direction, invert_axis_order);
    effect.length = haptic_length(params.length);
    effect.delay = params.delay;
    effect.button = haptic_button(params.button);
    effect.interval = params.interval;
    effect.period = periodic.period;
    effect.magnitude = periodic.magnitude;
    effect.offset = periodic.offset;
    effect.phase = periodic.phase;

    effect.attack_length = periodic.envelope.attack_length;
    effect.attack_level = periodic.envelope.attack_level;
    effect.fade_length = periodic.envelope.fade_length;
    effect.fade_level = periodic.envelope.fade_level;
    effect
}

fn build_ramp(params: &EffectParams, ramp: &RampEffect, invert_axis_order: bool) -> SDL_HapticRamp {
    // SAFETY: plain C struct, zero is valid
    let mut effect: SDL_HapticRamp = unsafe { mem::zeroed() };
    effect.r#type = SDL_HAPTIC_RAMP;
    effect.direction = haptic_direction(&ramp.direction, invert_axis_order);
    effect.length = haptic_length(params.length);
    effect.delay = params.delay;
    effect.button = haptic_button(params.button);
    effect.interval = params.interval;
    effect.start = ramp.start;
    effect.end = ramp.end;

    effect.attack_length = ramp.envelope.attack_length;
    effect.attack_level = ramp.envelope.attack_level;
    effect.fade_length = ramp.envelope.fade_length;
    effect.fade_level = ramp.envelope.fade_level;
    effect
}

fn build_condition(
    condition_type: SDL_HapticEffectType,
    params: &EffectParams,
    condition: &ConditionEffect,
) -> SDL_HapticCondition {
    // SAFETY: plain C struct, zero is valid
    let mut effect: SDL_HapticCondition = unsafe { mem::zeroed() };
    effect.r#type = condition_type;
    effect.length = haptic_length(params.length);
    effect.delay = params.delay;
    effect.button = haptic_button(params.button);
    effect.interval = params.interval;

    for (i, axis) in condition.axes().into_iter().enumerate() {
        effect.right_sat[i] = axis.right_sat;
        effect.left_sat[i] = axis.left_sat;
        effect.right_coeff[i] = axis.right_coeff;
        effect.left_coeff[i] = axis.left_coeff;
        effect.deadband[i] = axis.deadband;
        effect.center[i] = axis.center;
    }

    // Conditions act per axis; SDL still expects a direction, point it north
    effect.direction = SDL_HapticDirection {
        r#type: SDL_HAPTIC_POLAR,
        dir: [0, 0, 0],
    };
    effect
}

fn build_custom(
    params: &EffectParams,
    custom: &CustomEffect,
    data: *mut u16,
    invert_axis_order: bool,
) -> SDL_HapticCustom {
    // SAFETY: plain C struct, zero is valid
    let mut effect: SDL_HapticCustom = unsafe { mem::zeroed() };
    effect.r#type = SDL_HAPTIC_CUSTOM;
    effect.direction = haptic_direction(&custom.direction, invert_axis_order);
    effect.length = haptic_length(params.length);
    effect.delay = params.delay;
    effect.button = haptic_button(params.button);
    effect.interval = params.interval;
    effect.channels = custom.channels;
    effect.period = custom.period;
    effect.samples = custom.samples;
    effect.data = data;

    effect.attack_length = custom.envelope.attack_length;
    effect.attack_level = custom.envelope.attack_level;
    effect.fade_length = custom.envelope.fade_length;
    effect.fade_level = custom.envelope.fade_level;
    effect
}
