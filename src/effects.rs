use serde::{Deserialize, Serialize};
use std::fmt;

/// Effect length. `Infinite` keeps the effect running until it is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CountRepr", into = "CountRepr")]
pub enum Length {
    Infinite,
    Millis(u32),
}

impl Default for Length {
    fn default() -> Self {
        Length::Millis(1000)
    }
}

/// How many times an effect runs once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CountRepr", into = "CountRepr")]
pub enum Iterations {
    Infinite,
    Times(u32),
}

impl Default for Iterations {
    fn default() -> Self {
        Iterations::Times(1)
    }
}

/// YAML form shared by `Length` and `Iterations`: a number or `infinite`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum CountRepr {
    Count(u32),
    Keyword(String),
}

fn parse_keyword(word: &str) -> Result<(), String> {
    if word.eq_ignore_ascii_case("infinite") {
        Ok(())
    } else {
        Err(format!("expected a number or \"infinite\", got \"{}\"", word))
    }
}

impl TryFrom<CountRepr> for Length {
    type Error = String;

    fn try_from(repr: CountRepr) -> Result<Self, Self::Error> {
        match repr {
            CountRepr::Count(ms) => Ok(Length::Millis(ms)),
            CountRepr::Keyword(word) => parse_keyword(&word).map(|_| Length::Infinite),
        }
    }
}

impl From<Length> for CountRepr {
    fn from(length: Length) -> Self {
        match length {
            Length::Infinite => CountRepr::Keyword("infinite".to_string()),
            Length::Millis(ms) => CountRepr::Count(ms),
        }
    }
}

impl TryFrom<CountRepr> for Iterations {
    type Error = String;

    fn try_from(repr: CountRepr) -> Result<Self, Self::Error> {
        match repr {
            CountRepr::Count(n) => Ok(Iterations::Times(n)),
            CountRepr::Keyword(word) => parse_keyword(&word).map(|_| Iterations::Infinite),
        }
    }
}

impl From<Iterations> for CountRepr {
    fn from(iterations: Iterations) -> Self {
        match iterations {
            Iterations::Infinite => CountRepr::Keyword("infinite".to_string()),
            Iterations::Times(n) => CountRepr::Count(n),
        }
    }
}

/// Effect direction.
///
/// Polar angles and spherical coordinates are in hundredths of a degree,
/// Cartesian components are relative axis weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Direction {
    Polar {
        angle: i32,
    },
    Spherical {
        angles: [i32; 2],
    },
    Cartesian {
        x: i32,
        y: i32,
        #[serde(default)]
        z: i32,
    },
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Polar { angle: 0 }
    }
}

/// Envelope for smooth attack and fade of effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Attack time (ms)
    #[serde(default)]
    pub attack_length: u16,
    /// Level at start of attack (0-32767)
    #[serde(default)]
    pub attack_level: u16,
    /// Fade time (ms)
    #[serde(default)]
    pub fade_length: u16,
    /// Level at end of fade (0-32767)
    #[serde(default)]
    pub fade_level: u16,
}

/// Constant force
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantForce {
    /// Force level (-32767 to 32767)
    pub level: i16,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub envelope: Envelope,
}

/// Periodic wave types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveType {
    Sine,
    Square,
    Triangle,
    SawtoothUp,
    SawtoothDown,
}

/// Periodic effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicEffect {
    pub wave_type: WaveType,
    /// Period of the wave (ms)
    pub period: u16,
    /// Peak value (-32767 to 32767); negative values shift the phase
    pub magnitude: i16,
    /// Mean value of the wave
    #[serde(default)]
    pub offset: i16,
    /// Phase shift in hundredths of a degree (0-35999)
    #[serde(default)]
    pub phase: u16,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub envelope: Envelope,
}

/// Ramp effect (linear force change)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampEffect {
    /// Level at the start of the ramp
    pub start: i16,
    /// Level at the end of the ramp
    pub end: i16,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub envelope: Envelope,
}

/// Condition effects (depend on axis position/velocity/acceleration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Spring,
    Damper,
    Inertia,
    Friction,
}

/// Condition effect parameters for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionParams {
    /// Level when joystick is to the positive side
    #[serde(default = "default_saturation")]
    pub right_sat: u16,
    /// Level when joystick is to the negative side
    #[serde(default = "default_saturation")]
    pub left_sat: u16,
    /// How fast to increase the force towards the positive side
    #[serde(default = "default_coefficient")]
    pub right_coeff: i16,
    /// How fast to increase the force towards the negative side
    #[serde(default = "default_coefficient")]
    pub left_coeff: i16,
    /// Size of the dead zone around `center`
    #[serde(default)]
    pub deadband: u16,
    /// Position of the dead zone
    #[serde(default)]
    pub center: i16,
}

fn default_saturation() -> u16 {
    0xFFFF
}

fn default_coefficient() -> i16 {
    0x7FFF
}

impl Default for ConditionParams {
    fn default() -> Self {
        ConditionParams {
            right_sat: default_saturation(),
            left_sat: default_saturation(),
            right_coeff: default_coefficient(),
            left_coeff: default_coefficient(),
            deadband: 0,
            center: 0,
        }
    }
}

/// Condition effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionEffect {
    pub condition_type: ConditionType,
    #[serde(default)]
    pub x_axis: ConditionParams,
    #[serde(default)]
    pub y_axis: ConditionParams,
    #[serde(default)]
    pub z_axis: ConditionParams,
}

impl ConditionEffect {
    pub fn axes(&self) -> [&ConditionParams; 3] {
        [&self.x_axis, &self.y_axis, &self.z_axis]
    }
}

/// Custom waveform effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEffect {
    /// Axes the samples are interleaved for
    pub channels: u8,
    /// Sample period (ms)
    pub period: u16,
    /// Number of samples per channel
    pub samples: u16,
    /// Interleaved sample data, at least `samples * channels` long
    pub data: Vec<u16>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub envelope: Envelope,
}

impl CustomEffect {
    pub fn sample_count(&self) -> usize {
        self.samples as usize * self.channels as usize
    }
}

/// Common effect parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectParams {
    #[serde(default)]
    pub length: Length,
    /// Delay before start (ms)
    #[serde(default)]
    pub delay: u16,
    /// Joystick button (0-based) that triggers the effect
    #[serde(default)]
    pub button: Option<u16>,
    /// Minimum time between button-triggered runs (ms)
    #[serde(default)]
    pub interval: u16,
}

impl Default for EffectParams {
    fn default() -> Self {
        EffectParams {
            length: Length::default(),
            delay: 0,
            button: None,
            interval: 0,
        }
    }
}

/// All effect types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Constant {
        #[serde(flatten)]
        params: EffectParams,
        #[serde(flatten)]
        force: ConstantForce,
    },
    Periodic {
        #[serde(flatten)]
        params: EffectParams,
        #[serde(flatten)]
        effect: PeriodicEffect,
    },
    Ramp {
        #[serde(flatten)]
        params: EffectParams,
        #[serde(flatten)]
        effect: RampEffect,
    },
    Condition {
        #[serde(flatten)]
        params: EffectParams,
        #[serde(flatten)]
        effect: ConditionEffect,
    },
    Custom {
        #[serde(flatten)]
        params: EffectParams,
        #[serde(flatten)]
        effect: CustomEffect,
    },
}

impl Effect {
    pub fn params(&self) -> &EffectParams {
        match self {
            Effect::Constant { params, .. }
            | Effect::Periodic { params, .. }
            | Effect::Ramp { params, .. }
            | Effect::Condition { params, .. }
            | Effect::Custom { params, .. } => params,
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Constant { .. } => EffectKind::Constant,
            Effect::Periodic { effect, .. } => match effect.wave_type {
                WaveType::Sine => EffectKind::Sine,
                WaveType::Square => EffectKind::Square,
                WaveType::Triangle => EffectKind::Triangle,
                WaveType::SawtoothUp => EffectKind::SawtoothUp,
                WaveType::SawtoothDown => EffectKind::SawtoothDown,
            },
            Effect::Ramp { .. } => EffectKind::Ramp,
            Effect::Condition { effect, .. } => match effect.condition_type {
                ConditionType::Spring => EffectKind::Spring,
                ConditionType::Damper => EffectKind::Damper,
                ConditionType::Inertia => EffectKind::Inertia,
                ConditionType::Friction => EffectKind::Friction,
            },
            Effect::Custom { .. } => EffectKind::Custom,
        }
    }
}

/// Flat effect selector, one per SDL effect type bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Constant,
    Sine,
    Square,
    Triangle,
    SawtoothUp,
    SawtoothDown,
    Ramp,
    Spring,
    Damper,
    Inertia,
    Friction,
    Custom,
}

impl EffectKind {
    pub const ALL: [EffectKind; 12] = [
        EffectKind::Constant,
        EffectKind::Sine,
        EffectKind::Square,
        EffectKind::Triangle,
        EffectKind::SawtoothUp,
        EffectKind::SawtoothDown,
        EffectKind::Ramp,
        EffectKind::Spring,
        EffectKind::Damper,
        EffectKind::Inertia,
        EffectKind::Friction,
        EffectKind::Custom,
    ];

    pub fn is_condition(self) -> bool {
        matches!(
            self,
            EffectKind::Spring | EffectKind::Damper | EffectKind::Inertia | EffectKind::Friction
        )
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EffectKind::Constant => "Constant force",
            EffectKind::Sine => "Periodic (sine)",
            EffectKind::Square => "Periodic (square)",
            EffectKind::Triangle => "Periodic (triangle)",
            EffectKind::SawtoothUp => "Periodic (sawtooth up)",
            EffectKind::SawtoothDown => "Periodic (sawtooth down)",
            EffectKind::Ramp => "Ramp (linear change)",
            EffectKind::Spring => "Condition (spring)",
            EffectKind::Damper => "Condition (damper)",
            EffectKind::Inertia => "Condition (inertia)",
            EffectKind::Friction => "Condition (friction)",
            EffectKind::Custom => "Custom waveform",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_effect_from_yaml() {
        let yaml = r#"
type: constant
length: infinite
delay: 20
button: 2
interval: 100
level: -12000
direction:
  type: cartesian
  x: 1
  y: 0
envelope:
  attack_length: 50
  attack_level: 1000
"#;
        let effect: Effect = serde_yaml::from_str(yaml).unwrap();
        match &effect {
            Effect::Constant { params, force } => {
                assert_eq!(params.length, Length::Infinite);
                assert_eq!(params.delay, 20);
                assert_eq!(params.button, Some(2));
                assert_eq!(params.interval, 100);
                assert_eq!(force.level, -12000);
                assert_eq!(force.direction, Direction::Cartesian { x: 1, y: 0, z: 0 });
                assert_eq!(force.envelope.attack_length, 50);
                assert_eq!(force.envelope.fade_level, 0);
            }
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(effect.kind(), EffectKind::Constant);
    }

    #[test]
    fn missing_common_fields_use_defaults() {
        let yaml = "type: ramp\nstart: -1000\nend: 1000\n";
        let effect: Effect = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(effect.params(), &EffectParams::default());
        assert_eq!(effect.params().length, Length::Millis(1000));
        assert_eq!(effect.params().button, None);
    }

    #[test]
    fn periodic_kind_follows_wave_type() {
        let yaml = "type: periodic\nwave_type: sawtooth_down\nperiod: 100\nmagnitude: 5000\n";
        let effect: Effect = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(effect.kind(), EffectKind::SawtoothDown);
        assert!(!effect.kind().is_condition());
    }

    #[test]
    fn condition_axes_default_to_full_strength() {
        let yaml = r#"
type: condition
condition_type: friction
x_axis:
  deadband: 300
"#;
        let effect: Effect = serde_yaml::from_str(yaml).unwrap();
        let Effect::Condition { effect: condition, .. } = &effect else {
            panic!("expected condition effect");
        };
        assert_eq!(condition.x_axis.deadband, 300);
        assert_eq!(condition.x_axis.right_sat, 0xFFFF);
        assert_eq!(condition.y_axis, ConditionParams::default());
        assert_eq!(effect.kind(), EffectKind::Friction);
        assert!(effect.kind().is_condition());
    }

    #[test]
    fn length_keyword_is_case_insensitive_and_checked() {
        let length: Length = serde_yaml::from_str("Infinite").unwrap();
        assert_eq!(length, Length::Infinite);
        let length: Length = serde_yaml::from_str("250").unwrap();
        assert_eq!(length, Length::Millis(250));
        assert!(serde_yaml::from_str::<Length>("forever").is_err());

        let iterations: Iterations = serde_yaml::from_str("infinite").unwrap();
        assert_eq!(iterations, Iterations::Infinite);
    }

    #[test]
    fn custom_sample_count_is_samples_times_channels() {
        let custom = CustomEffect {
            channels: 2,
            period: 10,
            samples: 3,
            data: vec![0; 8],
            direction: Direction::default(),
            envelope: Envelope::default(),
        };
        assert_eq!(custom.sample_count(), 6);
    }

    #[test]
    fn spherical_direction_from_yaml() {
        let direction: Direction =
            serde_yaml::from_str("type: spherical\nangles: [9000, 4500]\n").unwrap();
        assert_eq!(direction, Direction::Spherical { angles: [9000, 4500] });
    }
}
