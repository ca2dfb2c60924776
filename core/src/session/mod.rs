//! Movie session controller
//!
//! The only component the host calls into while emulating. Per frame the
//! host polls every peripheral zero or more times through
//! [`MovieSession::poll_pad`] / [`MovieSession::poll_motion`], then calls
//! [`MovieSession::tick`] exactly once.
//!
//! ```text
//! Idle ──begin_recording──▶ Recording ──end_playback / shutdown──▶ Idle
//! Idle ──begin_playback───▶ Playing   ──end_playback / finished──▶ Idle
//! ```
//!
//! Recording and playing are the two variants of the held backend, so they
//! cannot overlap.

mod display;
mod frame_skip;
mod host;

pub use display::{InputDisplay, motion_line, pad_line};
pub use frame_skip::FrameSkip;
pub use host::{Host, MemoryView};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::MovieConfig;
use crate::error::{MovieError, SessionError};
use crate::movie::{
    ActiveBackend, BackendEvent, LinearRecording, OpenOptions, Playback, PlaybackBackend,
    Recording, RecordingInfo,
};
use crate::pad::{MAX_MOTION, MAX_PADS, PadStatus, PeripheralMask, PeripheralSlot};

/// Transforms live pad input before it is recorded or displayed
pub type PadHook = Box<dyn FnMut(&mut PadStatus, usize) + Send>;

/// Transforms a live motion report before it is recorded or displayed
pub type MotionHook = Box<dyn FnMut(&mut [u8], usize) + Send>;

/// Current session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Idle,
    Recording,
    Playing,
}

/// Counters carried inside host savestates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub frame: u64,
    pub lag: u64,
    pub polled: bool,
}

/// Record/playback state machine bound to one host
pub struct MovieSession<H: Host> {
    host: H,
    config: MovieConfig,
    backend: Option<ActiveBackend>,

    frame: u64,
    lag: u64,
    polled: bool,

    peripherals: PeripheralMask,
    from_save_state: bool,
    clear_save: bool,
    disc_change: Option<String>,
    start_time: u64,
    /// Snapshot taken when a recording started mid-session
    start_snapshot: Option<PathBuf>,

    frame_step: bool,
    frame_skip: Arc<FrameSkip>,
    display: InputDisplay,

    pad_hook: Option<PadHook>,
    motion_hook: Option<MotionHook>,
}

impl<H: Host> MovieSession<H> {
    pub fn new(host: H, config: MovieConfig) -> Self {
        Self {
            host,
            config,
            backend: None,
            frame: 0,
            lag: 0,
            polled: false,
            peripherals: PeripheralMask::empty(),
            from_save_state: false,
            clear_save: false,
            disc_change: None,
            start_time: 0,
            start_snapshot: None,
            frame_step: false,
            frame_skip: Arc::new(FrameSkip::default()),
            display: InputDisplay::default(),
            pad_hook: None,
            motion_hook: None,
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Start recording the peripherals in `mask`.
    ///
    /// Refused while any session is active or when `mask` is empty. A host
    /// that is already running gets a start snapshot so frame 0 is relative
    /// to it.
    pub fn begin_recording(&mut self, mask: PeripheralMask) -> Result<(), SessionError> {
        if self.backend.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        if mask.is_empty() {
            return Err(SessionError::NoPeripherals);
        }

        let was_running = self.host.pause_and_lock();

        let mut start_snapshot = None;
        if self.host.is_running() {
            let path = self.config.recording.snapshot_path();
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), "failed to remove stale snapshot: {e}");
                }
            }
            if let Err(e) = self.host.save_state(&path) {
                self.host.unlock(was_running);
                return Err(SessionError::Snapshot(e));
            }
            start_snapshot = Some(path);
        }

        self.peripherals = mask;
        self.reset_counters();
        self.start_time = self
            .host
            .network_epoch()
            .unwrap_or_else(|| self.host.wall_clock());
        self.from_save_state = start_snapshot.is_some();
        self.start_snapshot = start_snapshot;
        self.clear_save = self.host.starts_from_clear_save();
        self.disc_change = None;

        let info = RecordingInfo {
            start_time: self.start_time,
            author: self.config.recording.author.clone(),
            from_save_state: self.from_save_state,
            clear_save: self.clear_save,
            disc_change: None,
            title_id: self.host.title_id(),
            peripherals: mask,
            settings: self.host.settings(),
        };
        self.backend = Some(ActiveBackend::Recording(LinearRecording::new(
            info,
            self.config.recording.default_format,
            self.config.recording.compress,
        )));

        if self.host.wired_peripherals() != mask {
            self.change_peripherals(false);
        }

        self.host.unlock(was_running);

        tracing::info!(
            peripherals = mask.bits(),
            start_time = self.start_time,
            from_save_state = self.from_save_state,
            "recording started"
        );
        self.notify("Starting movie recording");
        Ok(())
    }

    /// Start playing `source` with the backend its signature selects.
    ///
    /// Nothing changes unless the source opens and parses completely.
    pub fn begin_playback(&mut self, source: &Path) -> Result<(), SessionError> {
        if self.backend.is_some() {
            return Err(SessionError::AlreadyActive);
        }

        let options = OpenOptions {
            memory: self.host.memory(),
            instruction_budget: self.config.script.instruction_budget,
        };
        let backend = match PlaybackBackend::open(source, &options) {
            Ok(backend) => backend,
            Err(SessionError::Script(e)) => {
                tracing::error!(source = %source.display(), "input script failed to load: {e}");
                self.notify(&format!("Script error: {e}"));
                return Err(SessionError::Script(e));
            }
            Err(e) => return Err(e),
        };

        let (peripherals, from_save_state, start_time) = match &backend {
            PlaybackBackend::Linear(linear) => {
                let doc = linear.document();
                (
                    doc.peripherals()
                        .unwrap_or_else(|| self.host.wired_peripherals()),
                    doc.from_save_state(),
                    doc.start_time(),
                )
            }
            PlaybackBackend::Script(_) => (
                self.host.wired_peripherals() & PeripheralMask::PADS,
                false,
                None,
            ),
        };
        let (clear_save, disc_change) = match &backend {
            PlaybackBackend::Linear(linear) => {
                let doc = linear.document();
                (doc.clear_save(), doc.disc_change().map(str::to_owned))
            }
            PlaybackBackend::Script(_) => (false, None),
        };

        let was_running = self.host.pause_and_lock();

        if from_save_state {
            let snapshot = snapshot_path_for(source);
            if let Err(e) = self.host.load_state(&snapshot) {
                self.host.unlock(was_running);
                return Err(SessionError::Snapshot(
                    e.context(format!("loading {}", snapshot.display())),
                ));
            }
        }
        if let PlaybackBackend::Linear(linear) = &backend {
            self.host.apply_settings(&linear.document().settings);
        }
        if clear_save {
            self.host.prepare_clear_save();
        }

        self.peripherals = peripherals;
        self.from_save_state = from_save_state;
        self.clear_save = clear_save;
        self.disc_change = disc_change;
        self.start_time = start_time.unwrap_or_else(|| self.host.wall_clock());
        self.reset_counters();

        let format = backend.format();
        self.backend = Some(ActiveBackend::Playback(backend));
        self.change_peripherals(true);

        self.host.unlock(was_running);

        tracing::info!(
            source = %source.display(),
            %format,
            peripherals = peripherals.bits(),
            clear_save,
            "playback started"
        );
        self.notify("Starting movie playback");
        Ok(())
    }

    /// Leave recording or playback; a no-op when idle.
    ///
    /// A recording is discarded unless it was saved first.
    pub fn end_playback(&mut self) {
        match self.backend.take() {
            Some(ActiveBackend::Playback(_)) => {
                self.from_save_state = false;
                if std::mem::take(&mut self.clear_save) {
                    self.host.restore_save();
                }
                self.disc_change = None;
                tracing::info!(frame = self.frame, lag = self.lag, "playback ended");
                self.notify("Movie End.");
                if self.config.playback.pause_on_playback {
                    self.host.set_paused(true);
                }
            }
            Some(ActiveBackend::Recording(_)) => {
                self.from_save_state = false;
                self.clear_save = false;
                self.disc_change = None;
                self.start_snapshot = None;
                tracing::info!(frame = self.frame, "recording ended");
                self.notify("Movie recording stopped");
            }
            None => {}
        }
    }

    /// Persist the current recording without stopping it.
    ///
    /// A recording that started from a snapshot also gets the snapshot
    /// copied to `<destination>.sav`.
    pub fn save_recording(&mut self, destination: &Path) -> Result<(), SessionError> {
        let Some(ActiveBackend::Recording(recording)) = &mut self.backend else {
            return Err(SessionError::NotRecording);
        };
        recording.persist(destination)?;

        if let Some(snapshot) = self.start_snapshot.as_ref().filter(|_| self.from_save_state) {
            let target = snapshot_path_for(destination);
            std::fs::copy(snapshot, &target).map_err(|e| MovieError::io(&target, e))?;
        }

        self.notify(&format!("Movie saved: {}", destination.display()));
        Ok(())
    }

    /// Drop any backend without notifying the host
    pub fn shutdown(&mut self) {
        if matches!(self.backend.take(), Some(ActiveBackend::Playback(_))) && self.clear_save {
            self.host.restore_save();
        }
        self.from_save_state = false;
        self.clear_save = false;
        self.disc_change = None;
        self.start_snapshot = None;
    }

    /// Called by the host once the title has booted.
    ///
    /// Wiring asked for before boot is applied here, and per-frame state left
    /// over from before boot is cleared.
    pub fn on_boot(&mut self) {
        self.polled = false;
        self.frame_step = false;
        if !self.is_active() {
            return;
        }
        self.rewire(true, true);
        tracing::debug!(
            peripherals = self.peripherals.bits(),
            wired = self.host.wired_peripherals().bits(),
            "applied movie peripherals at boot"
        );
    }

    /// Rewire host slots to match the session's peripheral mask.
    ///
    /// With `instantly` set, a class whose wiring already matches is left
    /// untouched; otherwise every slot of that class is rewired. Primary pads
    /// are only rewired on a running host; [`MovieSession::on_boot`] catches
    /// up on them.
    pub fn change_peripherals(&mut self, instantly: bool) {
        let running = self.host.is_running();
        self.rewire(instantly, running);
    }

    /// Record a disc swap into the current recording
    pub fn signal_disc_change(&mut self, disc: &str) {
        if let Some(ActiveBackend::Recording(recording)) = &mut self.backend {
            recording.set_disc_change(disc);
            self.disc_change = Some(disc.to_string());
            tracing::info!(frame = self.frame, disc, "disc change recorded");
        }
    }

    fn rewire(&mut self, instantly: bool, pads: bool) {
        let wired = self.host.wired_peripherals();

        let pads_match = (wired & PeripheralMask::PADS) == (self.peripherals & PeripheralMask::PADS);
        if pads && !(instantly && pads_match) {
            for index in 0..MAX_PADS {
                let enabled = self.peripherals.uses_pad(index);
                self.host
                    .wire_peripheral(PeripheralSlot::Pad(index), enabled, instantly);
            }
        }

        let motion_match =
            (wired & PeripheralMask::MOTION) == (self.peripherals & PeripheralMask::MOTION);
        if !(instantly && motion_match) {
            for index in 0..MAX_MOTION {
                let enabled = self.peripherals.uses_motion(index);
                self.host
                    .wire_peripheral(PeripheralSlot::Motion(index), enabled, instantly);
            }
        }
    }

    // ------------------------------------------------------------------
    // Per-frame entry points
    // ------------------------------------------------------------------

    /// Advance the frame clock; called once per simulated frame
    pub fn tick(&mut self) {
        self.frame += 1;
        if !self.polled {
            self.lag += 1;
        }

        let mut events = crate::movie::BackendEvents::new();
        let mut finished = false;
        match &mut self.backend {
            Some(ActiveBackend::Recording(recording)) => recording.advance(self.frame),
            Some(ActiveBackend::Playback(playback)) => {
                events = playback.advance(self.frame);
                finished = playback.is_finished();
            }
            None => {}
        }

        for event in events {
            match event {
                BackendEvent::Pause => self.host.set_paused(true),
                BackendEvent::Reset => self.host.request_reset(),
                BackendEvent::Fault(e) => {
                    tracing::error!(frame = self.frame, "input script failed: {e}");
                    self.notify(&format!("Script error: {e}"));
                    finished = true;
                }
            }
        }
        if finished {
            self.end_playback();
        }

        if self.frame_step {
            self.host.set_paused(true);
            self.frame_step = false;
        }

        // Skipping frames desyncs a movie unless netplay drives the clock.
        let skip_allowed = !self.is_active() || self.host.network_epoch().is_some();
        self.frame_skip.step(skip_allowed);

        self.polled = false;
    }

    /// Input for primary pad `index` this frame.
    ///
    /// `live` is what the physical controller reports. During playback the
    /// stored state replaces it; during recording it is stored.
    pub fn poll_pad(&mut self, index: usize, live: PadStatus) -> PadStatus {
        self.polled = true;
        let mut status = live;
        if let Some(hook) = &mut self.pad_hook {
            hook(&mut status, index);
        }

        let enabled = self.peripherals.uses_pad(index);
        match &mut self.backend {
            Some(ActiveBackend::Playback(playback)) if enabled => {
                status = playback.read_pad(self.frame, index);
            }
            Some(ActiveBackend::Recording(recording)) if enabled => {
                recording.write_pad(self.frame, index, &status);
            }
            _ => {}
        }

        self.display.set_pad(index, &status);
        status
    }

    /// Motion controller counterpart of [`MovieSession::poll_pad`]; `report`
    /// is rewritten in place during playback
    pub fn poll_motion(&mut self, index: usize, report: &mut [u8]) {
        self.polled = true;
        if let Some(hook) = &mut self.motion_hook {
            hook(report, index);
        }

        let enabled = self.peripherals.uses_motion(index);
        match &mut self.backend {
            Some(ActiveBackend::Playback(playback)) if enabled => {
                playback.read_motion(self.frame, index, report);
            }
            Some(ActiveBackend::Recording(recording)) if enabled => {
                recording.write_motion(self.frame, index, report);
            }
            _ => {}
        }

        self.display.set_motion(index, report);
    }

    /// Record a console reset on the current frame
    pub fn signal_reset(&mut self) {
        if let Some(ActiveBackend::Recording(recording)) = &mut self.backend {
            recording.write_reset(self.frame);
        }
    }

    /// Whether the movie being played resets the console on this frame
    pub fn reset_requested(&self) -> bool {
        match &self.backend {
            Some(ActiveBackend::Playback(playback)) => playback.reset_at(self.frame),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Host controls
    // ------------------------------------------------------------------

    /// Advance one frame when paused; pause otherwise
    pub fn frame_step(&mut self) {
        if self.host.is_paused() {
            self.host.set_paused(false);
            self.frame_step = true;
        } else if !self.frame_step {
            self.host.set_paused(true);
        }
    }

    pub fn set_frame_skipping(&self, frames: u32) {
        self.frame_skip.set(frames);
    }

    /// Handle for the presentation path
    pub fn frame_skip(&self) -> Arc<FrameSkip> {
        self.frame_skip.clone()
    }

    pub fn set_pad_hook(&mut self, hook: Option<PadHook>) {
        self.pad_hook = hook;
    }

    pub fn set_motion_hook(&mut self, hook: Option<MotionHook>) {
        self.motion_hook = hook;
    }

    /// Serialize the counters for a host savestate
    pub fn export_counters(&self) -> Result<Vec<u8>, SessionError> {
        let state = CounterState {
            frame: self.frame,
            lag: self.lag,
            polled: self.polled,
        };
        Ok(bincode::serialize(&state)?)
    }

    /// Restore counters written by [`MovieSession::export_counters`]
    pub fn import_counters(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        let state: CounterState = bincode::deserialize(bytes)?;
        self.frame = state.frame;
        self.lag = state.lag;
        self.polled = state.polled;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub fn mode(&self) -> SessionMode {
        match &self.backend {
            None => SessionMode::Idle,
            Some(ActiveBackend::Recording(_)) => SessionMode::Recording,
            Some(ActiveBackend::Playback(_)) => SessionMode::Playing,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.mode() == SessionMode::Recording
    }

    pub fn is_playing(&self) -> bool {
        self.mode() == SessionMode::Playing
    }

    pub fn is_active(&self) -> bool {
        self.backend.is_some()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn lag_count(&self) -> u64 {
        self.lag
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn peripherals(&self) -> PeripheralMask {
        self.peripherals
    }

    pub fn is_from_save_state(&self) -> bool {
        self.from_save_state
    }

    /// Whether the active movie expects a blank save area
    pub fn is_starting_from_clear_save(&self) -> bool {
        self.clear_save
    }

    /// Disc the active movie swapped to
    pub fn disc_change(&self) -> Option<&str> {
        self.disc_change.as_deref()
    }

    /// First frame of a session that began from a snapshot
    pub fn is_just_starting_from_save_state(&self) -> bool {
        self.from_save_state
            && match self.mode() {
                SessionMode::Recording => self.frame == 0,
                SessionMode::Playing => self.frame == 1,
                SessionMode::Idle => false,
            }
    }

    /// Frame, lag and input lines as configured in `[display]`
    pub fn status_text(&self) -> String {
        let display = &self.config.display;
        let mut text = String::new();
        if display.frame_counter {
            text.push_str(&format!("Frame: {}\n", self.frame));
        }
        if display.lag_counter {
            text.push_str(&format!("Lag: {}\n", self.lag));
        }
        if display.input_display {
            let mask = if self.is_active() {
                self.peripherals
            } else {
                self.host.wired_peripherals()
            };
            text.push_str(&self.display.render(mask));
        }
        text
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &MovieConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MovieConfig {
        &mut self.config
    }

    /// Script buffers of pad `index`, when a script is playing
    pub fn script_pad(&self, index: usize) -> Option<crate::script::pads::ScriptPad> {
        match &self.backend {
            Some(ActiveBackend::Playback(PlaybackBackend::Script(script))) => {
                script.pad_buffers(index)
            }
            _ => None,
        }
    }

    fn reset_counters(&mut self) {
        self.frame = 0;
        self.lag = 0;
        self.polled = false;
        self.frame_step = false;
        self.frame_skip.restart();
        self.display.clear();
    }

    fn notify(&mut self, message: &str) {
        let duration = self.config.playback.message_duration_ms;
        self.host.display_message(message, duration);
    }
}

/// Snapshot stored next to a movie: `<movie>.sav`
pub fn snapshot_path_for(movie: &Path) -> PathBuf {
    let mut name = movie.as_os_str().to_os_string();
    name.push(".sav");
    PathBuf::from(name)
}
