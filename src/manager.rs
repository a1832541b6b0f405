use crate::{
    capabilities::Capabilities,
    devices::{haptic_ids, haptic_ptr, joystick_ids, joystick_ptr, DeviceTable, Haptic, Joystick},
    effects::{Effect, Iterations},
    error::{sdl_failure, FailureSite, HapticError, HapticResult},
    events::{
        decode_event, reverse_axis, EventRecord, JoystickEvent, PovAxis, PovDirection,
        FIRST_JOYSTICK_EVENT, LAST_JOYSTICK_EVENT,
    },
    translate::{haptic_iterations, NativeEffect},
    AXIS_ORDER_INVERTED,
};
use sdl3_sys::events::*;
use sdl3_sys::haptic::*;
use sdl3_sys::init::*;
use sdl3_sys::joystick::*;
use std::ffi::{c_int, CStr};
use std::mem;
use tracing::{debug, info, warn};

/// Handle of an effect uploaded to a haptic device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(pub i32);

impl EffectId {
    fn raw(self) -> SDL_HapticEffectID {
        SDL_HapticEffectID(self.0)
    }
}

/// Owner of SDL's joystick and haptic subsystems.
///
/// Joysticks and haptic devices live in fixed tables keyed by SDL's
/// enumeration index. Everything runs on the calling thread; the raw
/// handles inside make this type neither `Send` nor `Sync`.
pub struct JoystickManager {
    joysticks: DeviceTable<Joystick>,
    haptics: DeviceTable<Haptic>,
}

impl JoystickManager {
    /// Initialise SDL's joystick and haptic subsystems.
    pub fn init() -> HapticResult<Self> {
        unsafe {
            if !SDL_Init(SDL_INIT_JOYSTICK | SDL_INIT_HAPTIC) {
                return Err(sdl_failure(FailureSite::Init));
            }
        }
        info!("SDL joystick and haptic subsystems ready");
        Ok(JoystickManager {
            joysticks: DeviceTable::new(),
            haptics: DeviceTable::new(),
        })
    }

    /// Bring up the event queue with joystick events switched off.
    pub fn init_events(&mut self) -> HapticResult<()> {
        unsafe {
            if !SDL_Init(SDL_INIT_EVENTS) {
                return Err(sdl_failure(FailureSite::InitEvents));
            }
        }
        self.disable_event_polling()
    }

    pub fn enable_event_polling(&mut self) -> HapticResult<()> {
        self.set_event_polling(true, FailureSite::EnableEvents)
    }

    pub fn disable_event_polling(&mut self) -> HapticResult<()> {
        self.set_event_polling(false, FailureSite::DisableEvents)
    }

    fn set_event_polling(&mut self, enabled: bool, site: FailureSite) -> HapticResult<()> {
        unsafe {
            SDL_SetJoystickEventsEnabled(enabled);
            if SDL_JoystickEventsEnabled() != enabled {
                return Err(sdl_failure(site));
            }
        }
        debug!(enabled, "joystick event polling");
        Ok(())
    }

    pub fn num_joysticks(&self) -> usize {
        joystick_ids().len()
    }

    fn joystick_id_at(index: usize, site: FailureSite) -> HapticResult<SDL_JoystickID> {
        joystick_ids()
            .get(index)
            .copied()
            .ok_or_else(|| HapticError::Sdl {
                site,
                message: format!("No joystick at index {}", index),
            })
    }

    /// Open the joystick at `index` in SDL's current enumeration.
    pub fn open_joystick(&mut self, index: usize) -> HapticResult<()> {
        let id = Self::joystick_id_at(index, FailureSite::OpenJoystick)?;
        let joystick = Joystick::open(id)?;
        info!(index, name = %joystick.name().unwrap_or_default(), "joystick open");
        if self.joysticks.insert(index, joystick)?.is_some() {
            warn!(index, "replaced an already open joystick");
        }
        Ok(())
    }

    /// Open force feedback on an open joystick, returning the haptic index.
    pub fn open_haptic(&mut self, joystick_index: usize) -> HapticResult<usize> {
        let joystick = self
            .joysticks
            .get(joystick_index)
            .ok_or(HapticError::JoystickNotOpen(joystick_index))?;
        let haptic = Haptic::from_joystick(joystick)?
            .ok_or(HapticError::NoForceFeedback(joystick_index))?;

        let index = haptic_ids()
            .iter()
            .position(|id| *id == haptic.id())
            .ok_or_else(|| HapticError::Sdl {
                site: FailureSite::OpenHaptic,
                message: format!("Haptic device {} is not enumerated", haptic.id().0),
            })?;
        self.haptics.insert(index, haptic)?;
        info!(joystick_index, haptic_index = index, "haptic device open");
        Ok(index)
    }

    /// Close a joystick and any haptic device opened from it.
    pub fn close_joystick(&mut self, index: usize) -> bool {
        let Some(joystick) = self.joysticks.remove(index) else {
            return false;
        };
        while let Some(slot) = self.haptics.position(|h| h.joystick_id() == joystick.id()) {
            self.haptics.remove(slot);
        }
        true
    }

    pub fn close_haptic(&mut self, index: usize) -> bool {
        self.haptics.remove(index).is_some()
    }

    /// Refresh joystick state without touching the event queue.
    pub fn update(&self) {
        unsafe { SDL_UpdateJoysticks() };
    }

    /// Take at most one joystick event off the queue.
    pub fn poll_joystick_event(&mut self) -> HapticResult<Option<JoystickEvent>> {
        // SDL does not reliably queue joystick events without this
        self.update();

        // SAFETY: plain C union, zero is valid
        let mut event: SDL_Event = unsafe { mem::zeroed() };
        let stored = unsafe {
            SDL_PeepEvents(
                &mut event,
                1,
                SDL_GETEVENT,
                FIRST_JOYSTICK_EVENT,
                LAST_JOYSTICK_EVENT,
            )
        };
        if stored < 0 {
            return Err(sdl_failure(FailureSite::PollEvent));
        }
        if stored == 0 {
            return Ok(None);
        }

        let joysticks = &self.joysticks;
        decode_event(&event, AXIS_ORDER_INVERTED, |id| {
            let slot = joysticks.position(|j| j.id() == id)?;
            let axes = joysticks
                .get(slot)
                .map(|j| unsafe { SDL_GetNumJoystickAxes(j.as_ptr()) })
                .unwrap_or(-1);
            Some((slot, axes))
        })
    }

    /// Fixed-shape form of [`poll_joystick_event`](Self::poll_joystick_event).
    pub fn poll_event(&mut self) -> HapticResult<EventRecord> {
        self.poll_joystick_event().map(EventRecord::from)
    }

    // Joystick queries

    /// Name of the joystick at `index`; the joystick need not be open.
    pub fn joystick_name(&self, index: usize) -> HapticResult<String> {
        let id = Self::joystick_id_at(index, FailureSite::JoystickName)?;
        unsafe {
            let name = SDL_GetJoystickNameForID(id);
            if name.is_null() {
                return Err(sdl_failure(FailureSite::JoystickName));
            }
            Ok(CStr::from_ptr(name).to_string_lossy().into_owned())
        }
    }

    fn joystick_count<Q>(&self, index: usize, query: Q, site: FailureSite) -> HapticResult<usize>
    where
        Q: FnOnce(*mut SDL_Joystick) -> c_int,
    {
        let joystick = joystick_ptr(&self.joysticks, index)?;
        let count = query(joystick);
        if count < 0 {
            return Err(sdl_failure(site));
        }
        Ok(count as usize)
    }

    pub fn num_buttons(&self, index: usize) -> HapticResult<usize> {
        self.joystick_count(
            index,
            |j| unsafe { SDL_GetNumJoystickButtons(j) },
            FailureSite::NumButtons,
        )
    }

    pub fn num_hats(&self, index: usize) -> HapticResult<usize> {
        self.joystick_count(
            index,
            |j| unsafe { SDL_GetNumJoystickHats(j) },
            FailureSite::NumHats,
        )
    }

    pub fn num_axes(&self, index: usize) -> HapticResult<usize> {
        self.joystick_count(
            index,
            |j| unsafe { SDL_GetNumJoystickAxes(j) },
            FailureSite::NumAxes,
        )
    }

    pub fn num_balls(&self, index: usize) -> HapticResult<usize> {
        self.joystick_count(
            index,
            |j| unsafe { SDL_GetNumJoystickBalls(j) },
            FailureSite::NumBalls,
        )
    }

    pub fn is_button_pressed(&self, index: usize, button: u8) -> HapticResult<bool> {
        let joystick = joystick_ptr(&self.joysticks, index)?;
        Ok(unsafe { SDL_GetJoystickButton(joystick, button as c_int) })
    }

    pub fn axis_value(&self, index: usize, axis: u8) -> HapticResult<i16> {
        let joystick = joystick_ptr(&self.joysticks, index)?;
        let axis = if AXIS_ORDER_INVERTED {
            reverse_axis(axis, unsafe { SDL_GetNumJoystickAxes(joystick) })
        } else {
            axis
        };
        Ok(unsafe { SDL_GetJoystickAxis(joystick, axis as c_int) })
    }

    fn hat_bits(&self, index: usize, hat: u8) -> HapticResult<u8> {
        let joystick = joystick_ptr(&self.joysticks, index)?;
        Ok(unsafe { SDL_GetJoystickHat(joystick, hat as c_int) })
    }

    pub fn pov_direction(&self, index: usize, hat: u8) -> HapticResult<PovDirection> {
        PovDirection::from_hat_bits(self.hat_bits(index, hat)?)
    }

    pub fn pov_x(&self, index: usize, hat: u8) -> HapticResult<PovAxis> {
        Ok(PovAxis::horizontal(self.hat_bits(index, hat)?))
    }

    pub fn pov_y(&self, index: usize, hat: u8) -> HapticResult<PovAxis> {
        Ok(PovAxis::vertical(self.hat_bits(index, hat)?))
    }

    /// Relative ball motion since the last call; `(0, 0)` if SDL refuses.
    pub fn ball_delta(&self, index: usize, ball: u8) -> HapticResult<(i32, i32)> {
        let joystick = joystick_ptr(&self.joysticks, index)?;
        let (mut dx, mut dy) = (0, 0);
        if !unsafe { SDL_GetJoystickBall(joystick, ball as c_int, &mut dx, &mut dy) } {
            debug!(index, ball, "ball delta unavailable");
            return Ok((0, 0));
        }
        Ok((dx, dy))
    }

    // Haptic queries and control

    pub fn capabilities(&self, haptic: usize) -> HapticResult<Capabilities> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        let features = unsafe { SDL_GetHapticFeatures(device) };
        if features == 0 {
            return Err(sdl_failure(FailureSite::Capabilities));
        }
        Ok(Capabilities::from_features(features))
    }

    fn haptic_count<Q>(&self, haptic: usize, query: Q, site: FailureSite) -> HapticResult<usize>
    where
        Q: FnOnce(*mut SDL_Haptic) -> c_int,
    {
        let device = haptic_ptr(&self.haptics, haptic)?;
        let count = query(device);
        if count < 0 {
            return Err(sdl_failure(site));
        }
        Ok(count as usize)
    }

    pub fn haptic_axes(&self, haptic: usize) -> HapticResult<usize> {
        self.haptic_count(
            haptic,
            |h| unsafe { SDL_GetNumHapticAxes(h) },
            FailureSite::HapticAxes,
        )
    }

    /// How many effects can play at the same time.
    pub fn max_effects_playing(&self, haptic: usize) -> HapticResult<usize> {
        self.haptic_count(
            haptic,
            |h| unsafe { SDL_GetMaxHapticEffectsPlaying(h) },
            FailureSite::EffectsPlaying,
        )
    }

    /// How many effects the device can store.
    pub fn max_effects_stored(&self, haptic: usize) -> HapticResult<usize> {
        self.haptic_count(
            haptic,
            |h| unsafe { SDL_GetMaxHapticEffects(h) },
            FailureSite::EffectsStored,
        )
    }

    fn check_percent(value: i32, what: &str) -> HapticResult<()> {
        if (0..=100).contains(&value) {
            Ok(())
        } else {
            Err(HapticError::InvalidParameter(format!(
                "{} must be 0-100, got {}",
                what, value
            )))
        }
    }

    /// Autocenter strength, 0 (off) to 100.
    pub fn set_autocenter(&mut self, haptic: usize, autocenter: i32) -> HapticResult<()> {
        Self::check_percent(autocenter, "autocenter")?;
        let device = haptic_ptr(&self.haptics, haptic)?;
        if !unsafe { SDL_SetHapticAutocenter(device, autocenter) } {
            return Err(sdl_failure(FailureSite::SetAutocenter));
        }
        Ok(())
    }

    /// Global gain, 0 to 100.
    pub fn set_gain(&mut self, haptic: usize, gain: i32) -> HapticResult<()> {
        Self::check_percent(gain, "gain")?;
        let device = haptic_ptr(&self.haptics, haptic)?;
        if !unsafe { SDL_SetHapticGain(device, gain) } {
            return Err(sdl_failure(FailureSite::SetGain));
        }
        Ok(())
    }

    pub fn pause(&mut self, haptic: usize) -> HapticResult<()> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        if !unsafe { SDL_PauseHaptic(device) } {
            return Err(sdl_failure(FailureSite::Pause));
        }
        Ok(())
    }

    pub fn unpause(&mut self, haptic: usize) -> HapticResult<()> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        if !unsafe { SDL_ResumeHaptic(device) } {
            return Err(sdl_failure(FailureSite::Unpause));
        }
        Ok(())
    }

    /// Upload an effect. The translated description, custom samples
    /// included, is released before returning on every path.
    pub fn new_effect(&mut self, haptic: usize, effect: &Effect) -> HapticResult<EffectId> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        let native = NativeEffect::from_effect(effect)?;
        let id = unsafe { SDL_CreateHapticEffect(device, native.as_ptr()) };
        if id.0 < 0 {
            return Err(sdl_failure(FailureSite::NewEffect));
        }
        debug!(haptic, effect = id.0, kind = %native.kind(), "effect created");
        Ok(EffectId(id.0))
    }

    /// Replace the parameters of an uploaded effect. The kind must match.
    pub fn update_effect(
        &mut self,
        haptic: usize,
        effect_id: EffectId,
        effect: &Effect,
    ) -> HapticResult<()> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        let native = NativeEffect::from_effect(effect)?;
        if !unsafe { SDL_UpdateHapticEffect(device, effect_id.raw(), native.as_ptr()) } {
            return Err(sdl_failure(FailureSite::UpdateEffect));
        }
        debug!(haptic, effect = effect_id.0, "effect updated");
        Ok(())
    }

    pub fn play_effect(
        &mut self,
        haptic: usize,
        effect_id: EffectId,
        iterations: Iterations,
    ) -> HapticResult<()> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        let iterations = haptic_iterations(iterations);
        if !unsafe { SDL_RunHapticEffect(device, effect_id.raw(), iterations) } {
            return Err(sdl_failure(FailureSite::PlayEffect));
        }
        debug!(haptic, effect = effect_id.0, iterations, "effect running");
        Ok(())
    }

    /// Whether the effect is playing. Needs the status feature.
    pub fn effect_status(&self, haptic: usize, effect_id: EffectId) -> HapticResult<bool> {
        if !self.capabilities(haptic)?.status() {
            return Err(HapticError::Sdl {
                site: FailureSite::EffectStatus,
                message: "Device does not report effect status".to_string(),
            });
        }
        let device = haptic_ptr(&self.haptics, haptic)?;
        Ok(unsafe { SDL_GetHapticEffectStatus(device, effect_id.raw()) })
    }

    pub fn stop_effect(&mut self, haptic: usize, effect_id: EffectId) -> HapticResult<()> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        if !unsafe { SDL_StopHapticEffect(device, effect_id.raw()) } {
            return Err(sdl_failure(FailureSite::StopEffect));
        }
        Ok(())
    }

    pub fn destroy_effect(&mut self, haptic: usize, effect_id: EffectId) -> HapticResult<()> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        unsafe { SDL_DestroyHapticEffect(device, effect_id.raw()) };
        Ok(())
    }

    pub fn stop_all(&mut self, haptic: usize) -> HapticResult<()> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        if !unsafe { SDL_StopHapticEffects(device) } {
            return Err(sdl_failure(FailureSite::StopAll));
        }
        Ok(())
    }

    /// Destroy every effect slot the device has.
    pub fn destroy_all(&mut self, haptic: usize) -> HapticResult<()> {
        let device = haptic_ptr(&self.haptics, haptic)?;
        let slots = unsafe { SDL_GetMaxHapticEffects(device) };
        for slot in (0..=slots.max(0)).rev() {
            unsafe { SDL_DestroyHapticEffect(device, SDL_HapticEffectID(slot)) };
        }
        Ok(())
    }
}

impl Drop for JoystickManager {
    fn drop(&mut self) {
        // Haptic devices go first, they borrow their joystick
        self.haptics.clear();
        self.joysticks.clear();
        unsafe { SDL_Quit() };
        debug!("SDL shut down");
    }
}
