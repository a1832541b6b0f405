use crate::{effects::EffectKind, translate::haptic_type};
use std::fmt;

// Device feature bits that are not effect types. sdl3-sys types these as
// 16-bit `SDL_HapticEffectType`, which truncates them to zero.
pub(crate) const FEATURE_GAIN: u32 = 1 << 16;
pub(crate) const FEATURE_AUTOCENTER: u32 = 1 << 17;
pub(crate) const FEATURE_STATUS: u32 = 1 << 18;
pub(crate) const FEATURE_PAUSE: u32 = 1 << 19;

/// What a haptic device can do, decoded from `SDL_GetHapticFeatures`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    features: u32,
}

impl Capabilities {
    pub fn from_features(features: u32) -> Self {
        Capabilities { features }
    }

    pub fn features(&self) -> u32 {
        self.features
    }

    pub fn supports(&self, kind: EffectKind) -> bool {
        self.features & haptic_type(kind).0 as u32 != 0
    }

    pub fn gain(&self) -> bool {
        self.features & FEATURE_GAIN != 0
    }

    pub fn autocenter(&self) -> bool {
        self.features & FEATURE_AUTOCENTER != 0
    }

    pub fn status(&self) -> bool {
        self.features & FEATURE_STATUS != 0
    }

    pub fn pause(&self) -> bool {
        self.features & FEATURE_PAUSE != 0
    }

    /// Sixteen flags: the twelve effect kinds in `EffectKind::ALL` order,
    /// then gain, autocenter, status, pause.
    pub fn to_flags(&self) -> [bool; 16] {
        let mut flags = [false; 16];
        for (slot, kind) in EffectKind::ALL.iter().enumerate() {
            flags[slot] = self.supports(*kind);
        }
        flags[12] = self.gain();
        flags[13] = self.autocenter();
        flags[14] = self.status();
        flags[15] = self.pause();
        flags
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Supported effects:")?;
        for kind in EffectKind::ALL {
            if self.supports(kind) {
                writeln!(f, "  - {}", kind)?;
            }
        }
        write!(
            f,
            "Gain: {}, autocenter: {}, status: {}, pause: {}",
            self.gain(),
            self.autocenter(),
            self.status(),
            self.pause()
        )
    }
}
