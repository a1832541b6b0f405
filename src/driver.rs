use crate::{
    capabilities::Capabilities,
    effects::{Effect, Iterations},
    error::HapticResult,
    manager::{EffectId, JoystickManager},
};

/// Something effects can be uploaded to and played on.
pub trait EffectDriver {
    /// Get the driver name for logging
    fn name(&self) -> &str;

    fn capabilities(&self) -> HapticResult<Capabilities>;

    fn set_gain(&mut self, gain: i32) -> HapticResult<()>;

    fn set_autocenter(&mut self, autocenter: i32) -> HapticResult<()>;

    /// Upload an effect without starting it
    fn upload(&mut self, effect: &Effect) -> HapticResult<EffectId>;

    fn run(&mut self, id: EffectId, iterations: Iterations) -> HapticResult<()>;

    fn stop(&mut self, id: EffectId) -> HapticResult<()>;

    fn destroy(&mut self, id: EffectId) -> HapticResult<()>;

    /// Stop all effects
    fn stop_all(&mut self) -> HapticResult<()>;

    /// Checked before every scenario step; `false` ends playback.
    fn keep_running(&self) -> bool {
        true
    }
}

/// One open haptic device of a [`JoystickManager`].
pub struct HapticDriver<'a> {
    manager: &'a mut JoystickManager,
    haptic: usize,
    name: String,
}

impl<'a> HapticDriver<'a> {
    pub fn new(manager: &'a mut JoystickManager, haptic: usize, name: impl Into<String>) -> Self {
        HapticDriver {
            manager,
            haptic,
            name: name.into(),
        }
    }
}

impl EffectDriver for HapticDriver<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> HapticResult<Capabilities> {
        self.manager.capabilities(self.haptic)
    }

    fn set_gain(&mut self, gain: i32) -> HapticResult<()> {
        self.manager.set_gain(self.haptic, gain)
    }

    fn set_autocenter(&mut self, autocenter: i32) -> HapticResult<()> {
        self.manager.set_autocenter(self.haptic, autocenter)
    }

    fn upload(&mut self, effect: &Effect) -> HapticResult<EffectId> {
        self.manager.new_effect(self.haptic, effect)
    }

    fn run(&mut self, id: EffectId, iterations: Iterations) -> HapticResult<()> {
        self.manager.play_effect(self.haptic, id, iterations)
    }

    fn stop(&mut self, id: EffectId) -> HapticResult<()> {
        self.manager.stop_effect(self.haptic, id)
    }

    fn destroy(&mut self, id: EffectId) -> HapticResult<()> {
        self.manager.destroy_effect(self.haptic, id)
    }

    fn stop_all(&mut self) -> HapticResult<()> {
        self.manager.stop_all(self.haptic)
    }
}
