//! Shared test utilities for integration and unit tests

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::MovieConfig;
use crate::pad::{PeripheralMask, PeripheralSlot};
use crate::session::{Host, MemoryView, MovieSession};

// ============================================================================
// Test Host Implementation
// ============================================================================

/// Host call observed by [`TestHost`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    PauseAndLock,
    Unlock { resume: bool },
    SetPaused(bool),
    RequestReset,
    SaveState(PathBuf),
    LoadState(PathBuf),
    Wire { slot: PeripheralSlot, enabled: bool, instantly: bool },
    Message(String),
    ApplySettings(BTreeMap<String, String>),
    PrepareClearSave,
    RestoreSave,
}

/// In-memory host that records every call
pub struct TestHost {
    pub calls: Vec<HostCall>,
    pub running: bool,
    pub paused: bool,
    pub wired: PeripheralMask,
    pub epoch: Option<u64>,
    pub clock: u64,
    pub title: Option<u64>,
    pub memory: Option<Arc<dyn MemoryView>>,
    pub settings: BTreeMap<String, String>,
    /// Snapshot files are written with this content
    pub snapshot_bytes: Vec<u8>,
    pub fail_snapshots: bool,
    /// Reported as [`Host::starts_from_clear_save`]
    pub clear_save: bool,
}

impl Default for TestHost {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            running: false,
            paused: false,
            wired: PeripheralMask::PAD_1,
            epoch: None,
            clock: 1_700_000_000,
            title: None,
            memory: None,
            settings: BTreeMap::new(),
            snapshot_bytes: b"snapshot".to_vec(),
            fail_snapshots: false,
            clear_save: false,
        }
    }
}

impl TestHost {
    /// Host that has booted a title
    pub fn running() -> Self {
        Self {
            running: true,
            ..Self::default()
        }
    }

    pub fn wire_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::Wire { .. }))
            .count()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Message(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Host for TestHost {
    fn pause_and_lock(&mut self) -> bool {
        self.calls.push(HostCall::PauseAndLock);
        self.running && !self.paused
    }

    fn unlock(&mut self, resume: bool) {
        self.calls.push(HostCall::Unlock { resume });
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.calls.push(HostCall::SetPaused(paused));
    }

    fn request_reset(&mut self) {
        self.calls.push(HostCall::RequestReset);
    }

    fn save_state(&mut self, path: &Path) -> anyhow::Result<()> {
        self.calls.push(HostCall::SaveState(path.to_path_buf()));
        if self.fail_snapshots {
            anyhow::bail!("snapshot refused");
        }
        std::fs::write(path, &self.snapshot_bytes)?;
        Ok(())
    }

    fn load_state(&mut self, path: &Path) -> anyhow::Result<()> {
        self.calls.push(HostCall::LoadState(path.to_path_buf()));
        if self.fail_snapshots {
            anyhow::bail!("snapshot refused");
        }
        std::fs::read(path)?;
        Ok(())
    }

    fn network_epoch(&self) -> Option<u64> {
        self.epoch
    }

    fn wall_clock(&self) -> u64 {
        self.clock
    }

    fn title_id(&self) -> Option<u64> {
        self.title
    }

    fn starts_from_clear_save(&self) -> bool {
        self.clear_save
    }

    fn prepare_clear_save(&mut self) {
        self.calls.push(HostCall::PrepareClearSave);
    }

    fn restore_save(&mut self) {
        self.calls.push(HostCall::RestoreSave);
    }

    fn wired_peripherals(&self) -> PeripheralMask {
        self.wired
    }

    fn wire_peripheral(&mut self, slot: PeripheralSlot, enabled: bool, instantly: bool) {
        self.calls.push(HostCall::Wire {
            slot,
            enabled,
            instantly,
        });
        let bit = match slot {
            PeripheralSlot::Pad(i) => PeripheralMask::pad(i),
            PeripheralSlot::Motion(i) => PeripheralMask::motion(i),
        };
        self.wired.set(bit, enabled);
    }

    fn display_message(&mut self, message: &str, _duration_ms: u32) {
        self.calls.push(HostCall::Message(message.to_string()));
    }

    fn memory(&self) -> Option<Arc<dyn MemoryView>> {
        self.memory.clone()
    }

    fn settings(&self) -> BTreeMap<String, String> {
        self.settings.clone()
    }

    fn apply_settings(&mut self, settings: &BTreeMap<String, String>) {
        self.calls.push(HostCall::ApplySettings(settings.clone()));
    }
}

// ============================================================================
// Test Memory
// ============================================================================

/// Flat little-endian memory starting at address 0
pub struct TestMemory(pub Vec<u8>);

impl TestMemory {
    fn bytes<const N: usize>(&self, addr: u32) -> Option<[u8; N]> {
        let start = addr as usize;
        self.0.get(start..start + N)?.try_into().ok()
    }
}

impl MemoryView for TestMemory {
    fn read_u8(&self, addr: u32) -> Option<u8> {
        self.0.get(addr as usize).copied()
    }

    fn read_u16(&self, addr: u32) -> Option<u16> {
        self.bytes(addr).map(u16::from_le_bytes)
    }

    fn read_u32(&self, addr: u32) -> Option<u32> {
        self.bytes(addr).map(u32::from_le_bytes)
    }
}

/// Session over a fresh [`TestHost`] whose snapshots land in `dir`
pub fn test_session(host: TestHost, dir: &Path) -> MovieSession<TestHost> {
    let mut config = MovieConfig::default();
    config.recording.snapshot_dir = Some(dir.to_path_buf());
    MovieSession::new(host, config)
}
