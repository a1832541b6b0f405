//! Owned SDL joystick and haptic handles, and the fixed slot tables that
//! hold them.

use crate::error::{sdl_failure, FailureSite, HapticError, HapticResult};
use sdl3_sys::haptic::*;
use sdl3_sys::joystick::*;
use sdl3_sys::stdinc::SDL_free;
use std::ffi::CStr;
use tracing::debug;

/// Slots per table.
pub const MAX_DEVICES: usize = 64;

/// An open SDL joystick, closed on drop.
pub struct Joystick {
    raw: *mut SDL_Joystick,
    id: SDL_JoystickID,
}

impl Joystick {
    pub(crate) fn open(id: SDL_JoystickID) -> HapticResult<Self> {
        let raw = unsafe { SDL_OpenJoystick(id) };
        if raw.is_null() {
            return Err(sdl_failure(FailureSite::OpenJoystick));
        }
        debug!(id = id.0, "opened joystick");
        Ok(Joystick { raw, id })
    }

    pub fn id(&self) -> SDL_JoystickID {
        self.id
    }

    pub fn as_ptr(&self) -> *mut SDL_Joystick {
        self.raw
    }

    pub fn name(&self) -> HapticResult<String> {
        unsafe {
            let name = SDL_GetJoystickName(self.raw);
            if name.is_null() {
                return Err(sdl_failure(FailureSite::JoystickName));
            }
            Ok(CStr::from_ptr(name).to_string_lossy().into_owned())
        }
    }

    pub fn is_haptic(&self) -> bool {
        unsafe { SDL_IsJoystickHaptic(self.raw) }
    }
}

impl Drop for Joystick {
    fn drop(&mut self) {
        unsafe { SDL_CloseJoystick(self.raw) };
        debug!(id = self.id.0, "closed joystick");
    }
}

/// An open SDL haptic device, closed on drop.
pub struct Haptic {
    raw: *mut SDL_Haptic,
    id: SDL_HapticID,
    joystick: SDL_JoystickID,
}

impl Haptic {
    /// Open the haptic side of a joystick. `Ok(None)` when the joystick
    /// has no force feedback.
    pub(crate) fn from_joystick(joystick: &Joystick) -> HapticResult<Option<Self>> {
        if !joystick.is_haptic() {
            return Ok(None);
        }
        let raw = unsafe { SDL_OpenHapticFromJoystick(joystick.as_ptr()) };
        if raw.is_null() {
            return Err(sdl_failure(FailureSite::OpenHaptic));
        }
        let id = unsafe { SDL_GetHapticID(raw) };
        if id.0 == 0 {
            let err = sdl_failure(FailureSite::OpenHaptic);
            unsafe { SDL_CloseHaptic(raw) };
            return Err(err);
        }
        debug!(id = id.0, joystick = joystick.id().0, "opened haptic device");
        Ok(Some(Haptic {
            raw,
            id,
            joystick: joystick.id(),
        }))
    }

    pub fn id(&self) -> SDL_HapticID {
        self.id
    }

    /// Instance id of the joystick this device was opened from.
    pub fn joystick_id(&self) -> SDL_JoystickID {
        self.joystick
    }

    pub fn as_ptr(&self) -> *mut SDL_Haptic {
        self.raw
    }
}

impl Drop for Haptic {
    fn drop(&mut self) {
        unsafe { SDL_CloseHaptic(self.raw) };
        debug!(id = self.id.0, "closed haptic device");
    }
}

/// Instance ids of connected joysticks, in SDL's enumeration order.
pub(crate) fn joystick_ids() -> Vec<SDL_JoystickID> {
    let mut count = 0;
    unsafe {
        let ids = SDL_GetJoysticks(&mut count);
        collect_ids(ids, count)
    }
}

/// Instance ids of connected haptic devices, in SDL's enumeration order.
pub(crate) fn haptic_ids() -> Vec<SDL_HapticID> {
    let mut count = 0;
    unsafe {
        let ids = SDL_GetHaptics(&mut count);
        collect_ids(ids, count)
    }
}

/// Copy an SDL-allocated id array and free it.
unsafe fn collect_ids<T: Copy>(ids: *mut T, count: i32) -> Vec<T> {
    if ids.is_null() {
        return Vec::new();
    }
    let list = std::slice::from_raw_parts(ids, count.max(0) as usize).to_vec();
    SDL_free(ids as *mut _);
    list
}

/// Fixed-size slot table. Slots are addressed by SDL's enumeration index,
/// never compacted, and drop their device when cleared or replaced.
pub struct DeviceTable<T> {
    slots: [Option<T>; MAX_DEVICES],
}

impl<T> DeviceTable<T> {
    pub fn new() -> Self {
        DeviceTable {
            slots: std::array::from_fn(|_| None),
        }
    }

    fn check(index: usize) -> HapticResult<()> {
        if index < MAX_DEVICES {
            Ok(())
        } else {
            Err(HapticError::IndexOutOfRange {
                index,
                max: MAX_DEVICES - 1,
            })
        }
    }

    /// Store `device` at `index`, handing back whatever was there.
    pub fn insert(&mut self, index: usize, device: T) -> HapticResult<Option<T>> {
        Self::check(index)?;
        Ok(self.slots[index].replace(device))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|device| (index, device)))
    }

    pub fn position<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter()
            .find(|(_, device)| predicate(device))
            .map(|(index, _)| index)
    }

    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.take();
        }
    }
}

impl<T> Default for DeviceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn joystick_ptr(
    table: &DeviceTable<Joystick>,
    index: usize,
) -> HapticResult<*mut SDL_Joystick> {
    table
        .get(index)
        .map(Joystick::as_ptr)
        .ok_or(HapticError::JoystickNotOpen(index))
}

pub(crate) fn haptic_ptr(table: &DeviceTable<Haptic>, index: usize) -> HapticResult<*mut SDL_Haptic> {
    table
        .get(index)
        .map(Haptic::as_ptr)
        .ok_or(HapticError::HapticNotOpen(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked(Rc<Cell<u32>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn missing_id_list_is_empty() {
        let joysticks = unsafe { collect_ids::<SDL_JoystickID>(std::ptr::null_mut(), 3) };
        assert!(joysticks.is_empty());
        let haptics = unsafe { collect_ids::<SDL_HapticID>(std::ptr::null_mut(), 1) };
        assert!(haptics.is_empty());
    }

    #[test]
    fn slots_keep_their_index() {
        let mut table = DeviceTable::new();
        assert!(table.insert(5, "wheel").unwrap().is_none());
        assert!(table.insert(2, "stick").unwrap().is_none());
        assert_eq!(table.get(5), Some(&"wheel"));
        assert!(!table.contains(3));
        let order: Vec<usize> = table.iter().map(|(i, _)| i).collect();
        assert_eq!(order, vec![2, 5]);
        assert_eq!(table.position(|d| *d == "wheel"), Some(5));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut table = DeviceTable::new();
        let err = table.insert(MAX_DEVICES, 1u8).unwrap_err();
        assert!(matches!(err, HapticError::IndexOutOfRange { index: 64, max: 63 }));
        assert_eq!(table.get(MAX_DEVICES), None);
        assert_eq!(table.remove(1000), None);
    }

    #[test]
    fn replacing_or_clearing_drops_each_device_once() {
        let drops = Rc::new(Cell::new(0));
        let mut table = DeviceTable::new();
        table.insert(0, Tracked(drops.clone())).unwrap();
        let previous = table.insert(0, Tracked(drops.clone())).unwrap();
        drop(previous);
        assert_eq!(drops.get(), 1);

        table.insert(1, Tracked(drops.clone())).unwrap();
        table.clear();
        assert_eq!(drops.get(), 3);
        table.clear();
        assert_eq!(drops.get(), 3);
    }
}
