//! Joystick event translation into the fixed six-slot event record.

use crate::error::{FailureSite, HapticError, HapticResult};
use sdl3_sys::events::*;
use sdl3_sys::joystick::SDL_JoystickID;

// SDL hat bits
const HAT_UP: u8 = 0x01;
const HAT_RIGHT: u8 = 0x02;
const HAT_DOWN: u8 = 0x04;
const HAT_LEFT: u8 = 0x08;

/// Hat switch position. Codes are the POV angle in hundredths of a degree,
/// clockwise from up, with -1 for centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PovDirection {
    Centered,
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl PovDirection {
    pub fn from_hat_bits(bits: u8) -> HapticResult<Self> {
        let direction = match bits {
            0 => PovDirection::Centered,
            HAT_UP => PovDirection::Up,
            b if b == HAT_UP | HAT_RIGHT => PovDirection::UpRight,
            HAT_RIGHT => PovDirection::Right,
            b if b == HAT_DOWN | HAT_RIGHT => PovDirection::DownRight,
            HAT_DOWN => PovDirection::Down,
            b if b == HAT_DOWN | HAT_LEFT => PovDirection::DownLeft,
            HAT_LEFT => PovDirection::Left,
            b if b == HAT_UP | HAT_LEFT => PovDirection::UpLeft,
            other => return Err(HapticError::InvalidHatState(other)),
        };
        Ok(direction)
    }

    pub fn code(self) -> i32 {
        match self {
            PovDirection::Centered => -1,
            PovDirection::Up => 0,
            PovDirection::UpRight => 4500,
            PovDirection::Right => 9000,
            PovDirection::DownRight => 13500,
            PovDirection::Down => 18000,
            PovDirection::DownLeft => 22500,
            PovDirection::Left => 27000,
            PovDirection::UpLeft => 31500,
        }
    }
}

/// One hat axis read as a tri-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PovAxis {
    Negative = -1,
    Neutral = 0,
    Positive = 1,
}

impl PovAxis {
    /// Right is positive.
    pub fn horizontal(bits: u8) -> Self {
        if bits & HAT_RIGHT != 0 {
            PovAxis::Positive
        } else if bits & HAT_LEFT != 0 {
            PovAxis::Negative
        } else {
            PovAxis::Neutral
        }
    }

    /// Down is positive.
    pub fn vertical(bits: u8) -> Self {
        if bits & HAT_DOWN != 0 {
            PovAxis::Positive
        } else if bits & HAT_UP != 0 {
            PovAxis::Negative
        } else {
            PovAxis::Neutral
        }
    }
}

/// Map an axis index to its position in reversed order.
///
/// Unknown or inconsistent axis counts leave the index as is.
pub fn reverse_axis(axis: u8, axes: i32) -> u8 {
    let reversed = axes - axis as i32 - 1;
    if reversed >= 0 {
        reversed as u8
    } else {
        axis
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoystickEvent {
    Button { device: usize, button: u8, pressed: bool },
    Axis { device: usize, axis: u8, value: i16 },
    /// `bits` is SDL's raw hat mask, decoded by [`PovDirection::from_hat_bits`].
    Hat { device: usize, hat: u8, bits: u8 },
    Ball { device: usize, ball: u8, dx: i16, dy: i16 },
}

impl JoystickEvent {
    pub const KIND_BUTTON: i32 = 1;
    pub const KIND_AXIS: i32 = 2;
    pub const KIND_HAT: i32 = 5;
    pub const KIND_BALL: i32 = 6;

    pub fn device(&self) -> usize {
        match *self {
            JoystickEvent::Button { device, .. }
            | JoystickEvent::Axis { device, .. }
            | JoystickEvent::Hat { device, .. }
            | JoystickEvent::Ball { device, .. } => device,
        }
    }
}

/// Flat event record: {present, device, kind, component, value1, value2}.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventRecord {
    pub present: bool,
    pub device: i32,
    pub kind: i32,
    pub component: i32,
    pub value1: i32,
    pub value2: i32,
}

impl EventRecord {
    pub fn to_array(&self) -> [i32; 6] {
        [
            self.present as i32,
            self.device,
            self.kind,
            self.component,
            self.value1,
            self.value2,
        ]
    }
}

impl From<Option<JoystickEvent>> for EventRecord {
    fn from(event: Option<JoystickEvent>) -> Self {
        let Some(event) = event else {
            return EventRecord::default();
        };
        let device = event.device() as i32;
        let (kind, component, value1, value2) = match event {
            JoystickEvent::Button { button, pressed, .. } => {
                (JoystickEvent::KIND_BUTTON, button, pressed as i32, 0)
            }
            JoystickEvent::Axis { axis, value, .. } => {
                (JoystickEvent::KIND_AXIS, axis, value as i32, 0)
            }
            JoystickEvent::Hat { hat, bits, .. } => {
                // An impossible mask still reports, with the error code as value
                let code = PovDirection::from_hat_bits(bits).map_or_else(|e| e.code(), PovDirection::code);
                (JoystickEvent::KIND_HAT, hat, code, 0)
            }
            JoystickEvent::Ball { ball, dx, dy, .. } => {
                (JoystickEvent::KIND_BALL, ball, dx as i32, dy as i32)
            }
        };
        EventRecord {
            present: true,
            device,
            kind,
            component: component as i32,
            value1,
            value2,
        }
    }
}

/// First and last event types fetched from the queue.
pub(crate) const FIRST_JOYSTICK_EVENT: u32 = SDL_EVENT_JOYSTICK_AXIS_MOTION.0;
pub(crate) const LAST_JOYSTICK_EVENT: u32 = SDL_EVENT_JOYSTICK_BUTTON_UP.0;

/// Translate one queued SDL event.
///
/// `resolve` maps an SDL joystick instance to its table slot and axis
/// count; events from joysticks outside the table yield `None`.
pub fn decode_event<F>(
    event: &SDL_Event,
    invert_axis_order: bool,
    resolve: F,
) -> HapticResult<Option<JoystickEvent>>
where
    F: Fn(SDL_JoystickID) -> Option<(usize, i32)>,
{
    // SAFETY: every SDL_Event member starts with the Uint32 type tag
    let kind = unsafe { event.r#type };

    let decoded = if kind == SDL_EVENT_JOYSTICK_BUTTON_DOWN.0 || kind == SDL_EVENT_JOYSTICK_BUTTON_UP.0 {
        // SAFETY: tag says jbutton
        let button = unsafe { event.jbutton };
        resolve(button.which).map(|(device, _)| JoystickEvent::Button {
            device,
            button: button.button,
            pressed: button.down,
        })
    } else if kind == SDL_EVENT_JOYSTICK_HAT_MOTION.0 {
        // SAFETY: tag says jhat
        let hat = unsafe { event.jhat };
        resolve(hat.which).map(|(device, _)| JoystickEvent::Hat {
            device,
            hat: hat.hat,
            bits: hat.value,
        })
    } else if kind == SDL_EVENT_JOYSTICK_AXIS_MOTION.0 {
        // SAFETY: tag says jaxis
        let axis = unsafe { event.jaxis };
        resolve(axis.which).map(|(device, axes)| JoystickEvent::Axis {
            device,
            axis: if invert_axis_order {
                reverse_axis(axis.axis, axes)
            } else {
                axis.axis
            },
            value: axis.value,
        })
    } else if kind == SDL_EVENT_JOYSTICK_BALL_MOTION.0 {
        // SAFETY: tag says jball
        let ball = unsafe { event.jball };
        resolve(ball.which).map(|(device, _)| JoystickEvent::Ball {
            device,
            ball: ball.ball,
            dx: ball.xrel,
            dy: ball.yrel,
        })
    } else {
        return Err(HapticError::Sdl {
            site: FailureSite::PollEvent,
            message: format!("unrecognised joystick event type {:#x}", kind),
        });
    };

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    const INSTANCE: SDL_JoystickID = SDL_JoystickID(42);

    fn resolve(id: SDL_JoystickID) -> Option<(usize, i32)> {
        (id == INSTANCE).then_some((3, 6))
    }

    fn zeroed_event() -> SDL_Event {
        unsafe { mem::zeroed() }
    }

    fn button_event(which: SDL_JoystickID, button: u8, down: bool) -> SDL_Event {
        let mut raw: SDL_JoyButtonEvent = unsafe { mem::zeroed() };
        raw.r#type = if down {
            SDL_EVENT_JOYSTICK_BUTTON_DOWN
        } else {
            SDL_EVENT_JOYSTICK_BUTTON_UP
        };
        raw.which = which;
        raw.button = button;
        raw.down = down;
        let mut event = zeroed_event();
        event.jbutton = raw;
        event
    }

    fn axis_event(axis: u8, value: i16) -> SDL_Event {
        let mut raw: SDL_JoyAxisEvent = unsafe { mem::zeroed() };
        raw.r#type = SDL_EVENT_JOYSTICK_AXIS_MOTION;
        raw.which = INSTANCE;
        raw.axis = axis;
        raw.value = value;
        let mut event = zeroed_event();
        event.jaxis = raw;
        event
    }

    fn hat_event(bits: u8) -> SDL_Event {
        let mut raw: SDL_JoyHatEvent = unsafe { mem::zeroed() };
        raw.r#type = SDL_EVENT_JOYSTICK_HAT_MOTION;
        raw.which = INSTANCE;
        raw.hat = 1;
        raw.value = bits;
        let mut event = zeroed_event();
        event.jhat = raw;
        event
    }

    #[test]
    fn hat_bits_decode_all_nine_states() {
        let cases = [
            (0x00, PovDirection::Centered, -1),
            (HAT_UP, PovDirection::Up, 0),
            (HAT_UP | HAT_RIGHT, PovDirection::UpRight, 4500),
            (HAT_RIGHT, PovDirection::Right, 9000),
            (HAT_DOWN | HAT_RIGHT, PovDirection::DownRight, 13500),
            (HAT_DOWN, PovDirection::Down, 18000),
            (HAT_DOWN | HAT_LEFT, PovDirection::DownLeft, 22500),
            (HAT_LEFT, PovDirection::Left, 27000),
            (HAT_UP | HAT_LEFT, PovDirection::UpLeft, 31500),
        ];
        for (bits, direction, code) in cases {
            let decoded = PovDirection::from_hat_bits(bits).unwrap();
            assert_eq!(decoded, direction, "bits {:#04x}", bits);
            assert_eq!(decoded.code(), code);
        }
    }

    #[test]
    fn impossible_hat_bits_are_rejected() {
        for bits in [HAT_UP | HAT_DOWN, HAT_LEFT | HAT_RIGHT, 0x0F, 0x10] {
            assert!(matches!(
                PovDirection::from_hat_bits(bits),
                Err(HapticError::InvalidHatState(b)) if b == bits
            ));
        }
    }

    #[test]
    fn pov_axes_split_the_bitmask() {
        assert_eq!(PovAxis::horizontal(HAT_UP | HAT_RIGHT), PovAxis::Positive);
        assert_eq!(PovAxis::horizontal(HAT_LEFT), PovAxis::Negative);
        assert_eq!(PovAxis::horizontal(HAT_DOWN), PovAxis::Neutral);
        assert_eq!(PovAxis::vertical(HAT_DOWN | HAT_LEFT), PovAxis::Positive);
        assert_eq!(PovAxis::vertical(HAT_UP), PovAxis::Negative);
        assert_eq!(PovAxis::vertical(0), PovAxis::Neutral);
    }

    #[test]
    fn axis_reversal() {
        assert_eq!(reverse_axis(0, 4), 3);
        assert_eq!(reverse_axis(3, 4), 0);
        assert_eq!(reverse_axis(2, -1), 2);
    }

    #[test]
    fn empty_record_is_all_zero() {
        assert_eq!(EventRecord::from(None).to_array(), [0; 6]);
    }

    #[test]
    fn button_events_become_kind_one() {
        let event = decode_event(&button_event(INSTANCE, 4, true), false, resolve)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            JoystickEvent::Button {
                device: 3,
                button: 4,
                pressed: true
            }
        );
        assert_eq!(EventRecord::from(Some(event)).to_array(), [1, 3, 1, 4, 1, 0]);

        let released = decode_event(&button_event(INSTANCE, 4, false), false, resolve).unwrap();
        assert_eq!(EventRecord::from(released).to_array(), [1, 3, 1, 4, 0, 0]);
    }

    #[test]
    fn axis_events_honour_axis_order() {
        let straight = decode_event(&axis_event(1, -12345), false, resolve).unwrap();
        assert_eq!(EventRecord::from(straight).to_array(), [1, 3, 2, 1, -12345, 0]);

        let reversed = decode_event(&axis_event(1, -12345), true, resolve).unwrap();
        assert_eq!(EventRecord::from(reversed).to_array(), [1, 3, 2, 4, -12345, 0]);
    }

    #[test]
    fn hat_events_carry_direction_code() {
        let event = decode_event(&hat_event(HAT_DOWN | HAT_LEFT), false, resolve).unwrap();
        assert_eq!(EventRecord::from(event).to_array(), [1, 3, 5, 1, 22500, 0]);

    }

    #[test]
    fn impossible_hat_mask_is_reported_with_error_code() {
        let event = decode_event(&hat_event(HAT_UP | HAT_DOWN), false, resolve)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            JoystickEvent::Hat {
                device: 3,
                hat: 1,
                bits: HAT_UP | HAT_DOWN
            }
        );
        assert_eq!(
            EventRecord::from(Some(event)).to_array(),
            [1, 3, 5, 1, HapticError::InvalidHatState(0x05).code(), 0]
        );
        assert_eq!(EventRecord::from(Some(event)).value1, -99);
    }

    #[test]
    fn ball_events_carry_both_deltas() {
        let mut raw: SDL_JoyBallEvent = unsafe { mem::zeroed() };
        raw.r#type = SDL_EVENT_JOYSTICK_BALL_MOTION;
        raw.which = INSTANCE;
        raw.ball = 0;
        raw.xrel = -7;
        raw.yrel = 12;
        let mut event = zeroed_event();
        event.jball = raw;

        let decoded = decode_event(&event, false, resolve).unwrap();
        assert_eq!(EventRecord::from(decoded).to_array(), [1, 3, 6, 0, -7, 12]);
    }

    #[test]
    fn events_from_unknown_joysticks_are_dropped() {
        let decoded = decode_event(&button_event(SDL_JoystickID(7), 0, true), false, resolve).unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn untyped_event_is_an_error() {
        let err = decode_event(&zeroed_event(), false, resolve).unwrap_err();
        assert_eq!(err.code(), FailureSite::PollEvent.code());
    }
}
