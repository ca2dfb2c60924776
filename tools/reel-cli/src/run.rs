//! Run command - play an input script without an emulator
//!
//! The script drives a session over a headless host. Each frame's pad state
//! can be printed and baked into a linear movie.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use inputreel_core::movie::{LinearRecording, Recording, RecordingInfo};
use inputreel_core::session::pad_line;
use inputreel_core::{
    Host, MovieConfig, MovieSession, PadStatus, PeripheralMask, PeripheralSlot,
};

/// Prefix of the notification a failing script produces
const SCRIPT_ERROR_PREFIX: &str = "Script error:";

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// Lua input script
    pub script: PathBuf,

    /// Frames to run at most
    #[arg(short, long, default_value_t = 600)]
    pub frames: u64,

    /// Number of connected pads
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub pads: u8,

    /// Bake the played input into a movie (profile follows the extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Don't print per-frame input
    #[arg(short, long)]
    pub quiet: bool,
}

/// Host with no emulator behind it
pub struct HeadlessHost {
    wired: PeripheralMask,
    paused: bool,
    reset_pending: bool,
    messages: Vec<String>,
}

impl HeadlessHost {
    pub fn new(wired: PeripheralMask) -> Self {
        Self {
            wired,
            paused: false,
            reset_pending: false,
            messages: Vec::new(),
        }
    }

    /// Whether a reset was requested since the last call
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_pending)
    }

    pub fn script_error(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.starts_with(SCRIPT_ERROR_PREFIX))
            .map(String::as_str)
    }
}

impl Host for HeadlessHost {
    fn pause_and_lock(&mut self) -> bool {
        !self.paused
    }

    fn unlock(&mut self, _resume: bool) {}

    fn is_running(&self) -> bool {
        false
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        if paused && !self.paused {
            tracing::info!("script requested a pause; continuing headless");
        }
        self.paused = paused;
    }

    fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    fn save_state(&mut self, _path: &Path) -> Result<()> {
        anyhow::bail!("headless runs have no emulator state")
    }

    fn load_state(&mut self, _path: &Path) -> Result<()> {
        anyhow::bail!("headless runs have no emulator state")
    }

    fn network_epoch(&self) -> Option<u64> {
        None
    }

    fn wired_peripherals(&self) -> PeripheralMask {
        self.wired
    }

    fn wire_peripheral(&mut self, slot: PeripheralSlot, enabled: bool, _instantly: bool) {
        let bit = match slot {
            PeripheralSlot::Pad(index) => PeripheralMask::pad(index),
            PeripheralSlot::Motion(index) => PeripheralMask::motion(index),
        };
        self.wired.set(bit, enabled);
    }

    fn display_message(&mut self, message: &str, _duration_ms: u32) {
        tracing::info!("{message}");
        self.messages.push(message.to_string());
    }
}

/// Outcome of a headless run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Frames ticked
    pub frames: u64,
    /// Whether the script returned before the frame limit
    pub finished: bool,
}

/// Mask of the first `count` pads
pub fn pads_mask(count: usize) -> PeripheralMask {
    (0..count).fold(PeripheralMask::empty(), |mask, index| {
        mask | PeripheralMask::pad(index)
    })
}

/// Play `script` for at most `frames` frames.
///
/// `on_frame` sees every frame's pad states before the frame is ticked; a
/// recording, when given, receives the same states.
pub fn run_headless(
    script: &Path,
    config: &MovieConfig,
    frames: u64,
    pads: usize,
    mut recording: Option<&mut LinearRecording>,
    mut on_frame: impl FnMut(u64, &[PadStatus]),
) -> Result<RunReport> {
    let mut session = MovieSession::new(HeadlessHost::new(pads_mask(pads)), config.clone());
    session.begin_playback(script)?;
    session.on_boot();

    let mut played = 0;
    let mut statuses = Vec::with_capacity(pads);
    while played < frames && session.is_playing() {
        let frame = session.frame_count();
        statuses.clear();
        for index in 0..pads {
            let status = session.poll_pad(index, PadStatus::NEUTRAL);
            if let Some(recording) = recording.as_deref_mut() {
                recording.write_pad(frame, index, &status);
            }
            statuses.push(status);
        }
        on_frame(frame, &statuses);

        session.tick();
        played += 1;

        let reset = session.host_mut().take_reset();
        if let Some(recording) = recording.as_deref_mut() {
            if reset {
                recording.write_reset(session.frame_count());
            }
            recording.advance(session.frame_count());
        }
    }

    if let Some(error) = session.host().script_error() {
        anyhow::bail!("{error}");
    }

    let finished = !session.is_playing();
    session.shutdown();
    Ok(RunReport {
        frames: played,
        finished,
    })
}

/// Execute the run command
pub fn execute(args: RunArgs) -> Result<()> {
    let config = inputreel_core::config::load();
    let pads = usize::from(args.pads);

    let mut recording = args.output.as_ref().map(|_| {
        LinearRecording::new(
            RecordingInfo {
                start_time: chrono::Utc::now().timestamp().max(0) as u64,
                author: config.recording.author.clone(),
                peripherals: pads_mask(pads),
                ..Default::default()
            },
            config.recording.default_format,
            config.recording.compress,
        )
    });

    let quiet = args.quiet;
    let report = run_headless(
        &args.script,
        &config,
        args.frames,
        pads,
        recording.as_mut(),
        |frame, statuses| {
            if quiet {
                return;
            }
            let lines: Vec<String> = statuses
                .iter()
                .enumerate()
                .map(|(index, status)| pad_line(index, status))
                .collect();
            println!("{frame:>6}  {}", lines.join("  "));
        },
    )?;

    if let (Some(recording), Some(output)) = (recording.as_mut(), &args.output) {
        recording.persist(output)?;
        println!("Baked {} frames into {}", report.frames, output.display());
    }

    if report.finished {
        println!("Script finished after {} frames", report.frames);
    } else {
        println!("Stopped at the {}-frame limit", report.frames);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inputreel_core::PadButtons;

    fn script(dir: &Path, source: &str) -> PathBuf {
        let path = dir.join("combo.lua");
        std::fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn test_pads_mask() {
        assert_eq!(pads_mask(1), PeripheralMask::PAD_1);
        assert_eq!(pads_mask(4), PeripheralMask::PADS);
    }

    #[test]
    fn test_run_bakes_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(
            dir.path(),
            r#"
            function main()
                pad1.hold(A)
                core.advance(2)
                pad1.release(A)
                pad2.press(B)
                core.advance(1)
            end
            "#,
        );

        let info = RecordingInfo {
            peripherals: pads_mask(2),
            ..Default::default()
        };
        let mut recording = LinearRecording::new(info, inputreel_core::MovieFormat::Binary, true);
        let mut seen = Vec::new();
        let report = run_headless(
            &path,
            &MovieConfig::default(),
            100,
            2,
            Some(&mut recording),
            |frame, statuses| seen.push((frame, statuses[0].buttons, statuses[1].buttons)),
        )
        .unwrap();

        assert!(report.finished);
        assert_eq!(report.frames, 4);
        assert_eq!(
            seen,
            vec![
                (0, PadButtons::empty(), PadButtons::empty()),
                (1, PadButtons::A, PadButtons::empty()),
                (2, PadButtons::A, PadButtons::empty()),
                (3, PadButtons::empty(), PadButtons::B),
            ]
        );

        let doc = recording.document();
        assert_eq!(doc.pad(1, 0).map(|s| s.buttons), Some(PadButtons::A));
        assert_eq!(doc.pad(3, 1).map(|s| s.buttons), Some(PadButtons::B));
        assert!(doc.pad(0, 0).is_none());
    }

    #[test]
    fn test_frame_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(dir.path(), "function main() core.advance(1000) end");

        let report =
            run_headless(&path, &MovieConfig::default(), 10, 1, None, |_, _| {}).unwrap();
        assert_eq!(report.frames, 10);
        assert!(!report.finished);
    }

    #[test]
    fn test_script_error_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(dir.path(), "function main() error('jammed') end");

        let err = run_headless(&path, &MovieConfig::default(), 10, 1, None, |_, _| {})
            .unwrap_err();
        assert!(err.to_string().contains("jammed"));
    }
}
