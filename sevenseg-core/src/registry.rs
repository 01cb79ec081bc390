//! Display instance registry
//!
//! Tracks live displays so each gets a stable serial number for naming its
//! timers. Slots are freed when a display is dropped; serial numbers are
//! never handed out twice.

use core::cell::RefCell;
use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::{String, Vec};

use crate::error::DisplayError;
use crate::traits::TickKind;

/// Maximum simultaneously live displays
pub const MAX_DISPLAYS: usize = 10;

/// Timer name capacity, e.g. `Disp07blnk_tmr`
pub type TimerName = String<16>;

/// Identity of one registered display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InstanceId {
    serial: u16,
    slot: u8,
}

impl InstanceId {
    /// Serial number, unique for the lifetime of the registry
    pub fn serial(&self) -> u16 {
        self.serial
    }

    /// Slot index in the registry
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Timer name for one of this display's ticks
    pub fn timer_name(&self, kind: TickKind) -> TimerName {
        let suffix = match kind {
            TickKind::Blink => "blnk_tmr",
            TickKind::Wait => "wait_tmr",
        };
        let mut name = TimerName::new();
        // 4 + 2 + 8 characters always fit
        let _ = write!(name, "Disp{:02}{}", self.serial % 100, suffix);
        name
    }
}

struct Slots {
    entries: [Option<InstanceId>; MAX_DISPLAYS],
    next_serial: u16,
}

/// Fixed-capacity table of live displays
///
/// Usually a `static` shared by every display on the board.
pub struct Registry<M: RawMutex> {
    slots: Mutex<M, RefCell<Slots>>,
}

impl<M: RawMutex> Default for Registry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Registry<M> {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Slots {
                entries: [None; MAX_DISPLAYS],
                next_serial: 0,
            })),
        }
    }

    /// Claim the first free slot
    pub fn register(&self) -> Result<InstanceId, DisplayError> {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let serial = slots.next_serial;
            let Some((index, entry)) = slots
                .entries
                .iter_mut()
                .enumerate()
                .find(|(_, entry)| entry.is_none())
            else {
                return Err(DisplayError::RegistryFull);
            };

            let id = InstanceId {
                serial,
                slot: index as u8,
            };
            *entry = Some(id);
            slots.next_serial = serial.wrapping_add(1);
            Ok(id)
        })
    }

    /// Free the slot held by `id`
    ///
    /// Releasing an id that is not registered does nothing.
    pub fn release(&self, id: InstanceId) {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            if let Some(entry) = slots.entries.get_mut(id.slot as usize) {
                if *entry == Some(id) {
                    *entry = None;
                }
            }
        });
    }

    /// Snapshot of the live displays in slot order
    pub fn live(&self) -> Vec<InstanceId, MAX_DISPLAYS> {
        self.slots.lock(|cell| {
            cell.borrow()
                .entries
                .iter()
                .flatten()
                .copied()
                .collect()
        })
    }

    /// Check if `id` is still registered
    pub fn contains(&self, id: InstanceId) -> bool {
        self.slots
            .lock(|cell| cell.borrow().entries.contains(&Some(id)))
    }

    /// Number of live displays
    pub fn len(&self) -> usize {
        self.slots
            .lock(|cell| cell.borrow().entries.iter().flatten().count())
    }

    /// Check if no display is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_register_fills_slots_in_order() {
        let registry = Registry::<NoopRawMutex>::new();
        let a = registry.register().unwrap();
        let b = registry.register().unwrap();

        assert_eq!((a.slot(), a.serial()), (0, 0));
        assert_eq!((b.slot(), b.serial()), (1, 1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_full() {
        let registry = Registry::<NoopRawMutex>::new();
        for _ in 0..MAX_DISPLAYS {
            registry.register().unwrap();
        }
        assert_eq!(registry.register(), Err(DisplayError::RegistryFull));
        assert_eq!(registry.len(), MAX_DISPLAYS);
    }

    #[test]
    fn test_slot_reused_serial_not() {
        let registry = Registry::<NoopRawMutex>::new();
        let a = registry.register().unwrap();
        let b = registry.register().unwrap();
        registry.release(a);

        let c = registry.register().unwrap();
        assert_eq!(c.slot(), a.slot());
        assert_eq!(c.serial(), 2);
        assert!(!registry.contains(a));
        assert_eq!(registry.live().as_slice(), &[c, b]);
    }

    #[test]
    fn test_stale_release_is_ignored() {
        let registry = Registry::<NoopRawMutex>::new();
        let a = registry.register().unwrap();
        registry.release(a);
        let b = registry.register().unwrap();

        // `a` and `b` share a slot; only `b` owns it now
        registry.release(a);
        assert!(registry.contains(b));
    }

    #[test]
    fn test_timer_names() {
        let registry = Registry::<NoopRawMutex>::new();
        let id = registry.register().unwrap();
        assert_eq!(id.timer_name(TickKind::Blink).as_str(), "Disp00blnk_tmr");
        assert_eq!(id.timer_name(TickKind::Wait).as_str(), "Disp00wait_tmr");
    }
}
