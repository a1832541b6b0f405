use sdl3_sys::error::SDL_GetError;
use std::ffi::CStr;
use std::fmt;
use thiserror::Error;

/// Call site that failed inside SDL.
///
/// Each site maps to its own negative status code, which is what callers
/// that only deal in integers get back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSite {
    Init,
    OpenJoystick,
    OpenHaptic,
    JoystickName,
    NumButtons,
    NumHats,
    NumAxes,
    NumBalls,
    InitEvents,
    EnableEvents,
    DisableEvents,
    PollEvent,
    HapticAxes,
    EffectsPlaying,
    EffectsStored,
    SetGain,
    Pause,
    Unpause,
    NewEffect,
    PlayEffect,
    EffectStatus,
    UpdateEffect,
    StopEffect,
    Capabilities,
    StopAll,
    SetAutocenter,
}

impl FailureSite {
    pub fn code(self) -> i32 {
        match self {
            FailureSite::Init => -1,
            FailureSite::OpenJoystick => -2,
            FailureSite::OpenHaptic => -4,
            FailureSite::JoystickName => -6,
            FailureSite::NumButtons => -7,
            FailureSite::NumHats => -8,
            FailureSite::NumAxes => -9,
            FailureSite::NumBalls => -10,
            FailureSite::InitEvents => -11,
            FailureSite::EnableEvents => -12,
            FailureSite::DisableEvents => -13,
            FailureSite::PollEvent => -14,
            FailureSite::HapticAxes => -15,
            FailureSite::EffectsPlaying => -16,
            FailureSite::EffectsStored => -17,
            FailureSite::SetGain => -18,
            FailureSite::Pause => -19,
            FailureSite::Unpause => -20,
            FailureSite::NewEffect => -21,
            FailureSite::PlayEffect => -22,
            FailureSite::EffectStatus => -23,
            FailureSite::UpdateEffect => -24,
            FailureSite::StopEffect => -25,
            FailureSite::Capabilities => -26,
            FailureSite::StopAll => -27,
            FailureSite::SetAutocenter => -28,
        }
    }

    fn label(self) -> &'static str {
        match self {
            FailureSite::Init => "SDL_Init",
            FailureSite::OpenJoystick => "SDL_OpenJoystick",
            FailureSite::OpenHaptic => "SDL_OpenHapticFromJoystick",
            FailureSite::JoystickName => "SDL_GetJoystickName",
            FailureSite::NumButtons => "SDL_GetNumJoystickButtons",
            FailureSite::NumHats => "SDL_GetNumJoystickHats",
            FailureSite::NumAxes => "SDL_GetNumJoystickAxes",
            FailureSite::NumBalls => "SDL_GetNumJoystickBalls",
            FailureSite::InitEvents => "SDL_Init(EVENTS)",
            FailureSite::EnableEvents => "SDL_SetJoystickEventsEnabled(true)",
            FailureSite::DisableEvents => "SDL_SetJoystickEventsEnabled(false)",
            FailureSite::PollEvent => "SDL_PeepEvents",
            FailureSite::HapticAxes => "SDL_GetNumHapticAxes",
            FailureSite::EffectsPlaying => "SDL_GetMaxHapticEffectsPlaying",
            FailureSite::EffectsStored => "SDL_GetMaxHapticEffects",
            FailureSite::SetGain => "SDL_SetHapticGain",
            FailureSite::Pause => "SDL_PauseHaptic",
            FailureSite::Unpause => "SDL_ResumeHaptic",
            FailureSite::NewEffect => "SDL_CreateHapticEffect",
            FailureSite::PlayEffect => "SDL_RunHapticEffect",
            FailureSite::EffectStatus => "SDL_GetHapticEffectStatus",
            FailureSite::UpdateEffect => "SDL_UpdateHapticEffect",
            FailureSite::StopEffect => "SDL_StopHapticEffect",
            FailureSite::Capabilities => "SDL_GetHapticFeatures",
            FailureSite::StopAll => "SDL_StopHapticEffects",
            FailureSite::SetAutocenter => "SDL_SetHapticAutocenter",
        }
    }
}

impl fmt::Display for FailureSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

#[derive(Error, Debug)]
pub enum HapticError {
    #[error("{site} failed: {message}")]
    Sdl { site: FailureSite, message: String },

    #[error("No joystick open at index {0}")]
    JoystickNotOpen(usize),

    #[error("No haptic device open at index {0}")]
    HapticNotOpen(usize),

    #[error("Joystick {0} has no force feedback support")]
    NoForceFeedback(usize),

    #[error("Device index {index} out of range (max {max})")]
    IndexOutOfRange { index: usize, max: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid hat state: {0:#04x}")]
    InvalidHatState(u8),
}

impl HapticError {
    /// Negative status code for integer-only callers.
    pub fn code(&self) -> i32 {
        match self {
            HapticError::Sdl { site, .. } => site.code(),
            HapticError::JoystickNotOpen(_) => -2,
            HapticError::HapticNotOpen(_) | HapticError::NoForceFeedback(_) => -4,
            HapticError::IndexOutOfRange { .. } => -5,
            HapticError::InvalidParameter(_) => -3,
            HapticError::InvalidHatState(_) => -99,
        }
    }
}

pub type HapticResult<T> = Result<T, HapticError>;

/// Current SDL error string.
pub(crate) fn sdl_error() -> String {
    unsafe {
        let error = SDL_GetError();
        if !error.is_null() {
            CStr::from_ptr(error).to_string_lossy().into_owned()
        } else {
            "Unknown error".to_string()
        }
    }
}

/// Wrap the current SDL error for a failed call.
pub(crate) fn sdl_failure(site: FailureSite) -> HapticError {
    HapticError::Sdl {
        site,
        message: sdl_error(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdl_error_carries_site_and_message() {
        let err = HapticError::Sdl {
            site: FailureSite::NewEffect,
            message: "Haptic: Effect not supported".to_string(),
        };
        assert_eq!(err.code(), -21);
        assert_eq!(
            err.to_string(),
            "SDL_CreateHapticEffect (-21) failed: Haptic: Effect not supported"
        );
    }

    #[test]
    fn site_codes_are_negative_and_unique() {
        let sites = [
            FailureSite::Init,
            FailureSite::OpenJoystick,
            FailureSite::OpenHaptic,
            FailureSite::JoystickName,
            FailureSite::NumButtons,
            FailureSite::NumHats,
            FailureSite::NumAxes,
            FailureSite::NumBalls,
            FailureSite::InitEvents,
            FailureSite::EnableEvents,
            FailureSite::DisableEvents,
            FailureSite::PollEvent,
            FailureSite::HapticAxes,
            FailureSite::EffectsPlaying,
            FailureSite::EffectsStored,
            FailureSite::SetGain,
            FailureSite::Pause,
            FailureSite::Unpause,
            FailureSite::NewEffect,
            FailureSite::PlayEffect,
            FailureSite::EffectStatus,
            FailureSite::UpdateEffect,
            FailureSite::StopEffect,
            FailureSite::Capabilities,
            FailureSite::StopAll,
            FailureSite::SetAutocenter,
        ];
        let mut codes: Vec<i32> = sites.iter().map(|s| s.code()).collect();
        assert!(codes.iter().all(|c| *c < 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), sites.len());
    }

    #[test]
    fn hat_state_error_formats_as_hex() {
        assert_eq!(
            HapticError::InvalidHatState(0x05).to_string(),
            "Invalid hat state: 0x05"
        );
    }
}
