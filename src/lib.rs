//! Joystick input and force feedback on top of SDL3.
//!
//! [`JoystickManager`] owns SDL's joystick and haptic subsystems and keeps
//! open devices in fixed tables addressed by SDL's enumeration index.
//! Effects are described with [`Effect`] and translated into
//! `SDL_HapticEffect` by [`NativeEffect`].

pub mod capabilities;
pub mod devices;
pub mod driver;
pub mod effects;
pub mod error;
pub mod events;
pub mod manager;
pub mod scenario;
pub mod translate;

/// Analogue axes are reported in reverse order (`invert-axis-order` feature).
pub const AXIS_ORDER_INVERTED: bool = cfg!(feature = "invert-axis-order");

pub use capabilities::Capabilities;
pub use driver::{EffectDriver, HapticDriver};
pub use effects::{Direction, Effect, EffectKind, EffectParams, Envelope, Iterations, Length};
pub use error::{FailureSite, HapticError, HapticResult};
pub use events::{EventRecord, JoystickEvent, PovAxis, PovDirection};
pub use manager::{EffectId, JoystickManager};
pub use scenario::{Scenario, ScenarioStep, StepOutcome};
pub use translate::NativeEffect;
