//! Host emulator collaborator
//!
//! Everything the session needs from the emulator it is embedded in. The
//! session never simulates, snapshots or wires hardware itself.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::pad::{PeripheralMask, PeripheralSlot};

/// Read-only view of emulated memory; `None` means the read faulted
pub trait MemoryView: Send + Sync {
    fn read_u8(&self, addr: u32) -> Option<u8>;
    fn read_u16(&self, addr: u32) -> Option<u16>;
    fn read_u32(&self, addr: u32) -> Option<u32>;
}

/// Emulator services consumed by a [`MovieSession`](super::MovieSession)
pub trait Host {
    /// Suspend the simulation context; returns whether it was running
    fn pause_and_lock(&mut self) -> bool;

    /// Release the lock taken by [`Host::pause_and_lock`]
    fn unlock(&mut self, resume: bool);

    /// Whether emulation has booted
    fn is_running(&self) -> bool;

    fn is_paused(&self) -> bool;

    fn set_paused(&mut self, paused: bool);

    /// Reset the emulated console
    fn request_reset(&mut self);

    /// Write a snapshot of the whole machine
    fn save_state(&mut self, path: &Path) -> anyhow::Result<()>;

    /// Restore a snapshot written by [`Host::save_state`]
    fn load_state(&mut self, path: &Path) -> anyhow::Result<()>;

    /// Shared start epoch while a networked session is running
    fn network_epoch(&self) -> Option<u64>;

    /// Wall clock in seconds since the Unix epoch
    fn wall_clock(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }

    /// Whether the title was booted with a blank save area
    fn starts_from_clear_save(&self) -> bool {
        false
    }

    /// Back up the user's save and present a blank one for playback
    fn prepare_clear_save(&mut self) {}

    /// Restore the save backed up by [`Host::prepare_clear_save`]
    fn restore_save(&mut self) {}

    /// Identifier of the running title, when known
    fn title_id(&self) -> Option<u64> {
        None
    }

    /// Slots currently wired to a device
    fn wired_peripherals(&self) -> PeripheralMask;

    /// Attach or detach one slot, instantly or through a graceful hot-swap
    fn wire_peripheral(&mut self, slot: PeripheralSlot, enabled: bool, instantly: bool);

    /// Transient on-screen notification
    fn display_message(&mut self, message: &str, duration_ms: u32);

    /// Emulated memory for scripts
    fn memory(&self) -> Option<Arc<dyn MemoryView>> {
        None
    }

    /// Settings that must match for a recording to replay
    fn settings(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Apply settings stored in a movie before its playback starts
    fn apply_settings(&mut self, _settings: &BTreeMap<String, String>) {}
}
