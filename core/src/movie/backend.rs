//! Playback and recording capabilities
//!
//! A session holds exactly one backend for its lifetime. The set of backends
//! is closed: linear documents (either profile) and scripts for playback,
//! linear documents for recording.

use smallvec::SmallVec;
use std::path::Path;
use std::sync::Arc;

use super::format::MovieFormat;
use super::linear::{LinearPlayback, LinearRecording};
use crate::error::{MovieError, ScriptError, SessionError};
use crate::pad::PadStatus;
use crate::script::ScriptPlayback;
use crate::session::MemoryView;

/// Something a backend asks of the session after advancing
#[derive(Debug)]
pub enum BackendEvent {
    /// Pause the host
    Pause,
    /// Reset the emulated console
    Reset,
    /// The backend failed and playback must end
    Fault(ScriptError),
}

/// Events produced by one advance; usually none
pub type BackendEvents = SmallVec<[BackendEvent; 2]>;

/// Read side of a movie source
pub trait Playback {
    /// State of a primary pad on `frame`, neutral when nothing is stored
    fn read_pad(&mut self, frame: u64, index: usize) -> PadStatus;

    /// Fill `report` with the motion report stored for `frame`
    fn read_motion(&mut self, frame: u64, index: usize, report: &mut [u8]);

    /// Whether a console reset happens on `frame`
    fn reset_at(&self, _frame: u64) -> bool {
        false
    }

    /// Called once per tick with the new frame counter
    fn advance(&mut self, frame: u64) -> BackendEvents;

    fn is_finished(&self) -> bool;
}

/// Write side of a movie source
pub trait Recording {
    fn write_pad(&mut self, frame: u64, index: usize, status: &PadStatus);

    fn write_motion(&mut self, frame: u64, index: usize, report: &[u8]);

    fn write_reset(&mut self, frame: u64);

    /// Called once per tick with the new frame counter
    fn advance(&mut self, frame: u64);

    /// Write the document to `destination`; the profile follows its extension
    fn persist(&mut self, destination: &Path) -> Result<(), MovieError>;
}

/// Options needed to construct a playback backend
#[derive(Clone, Default)]
pub struct OpenOptions {
    /// Emulated memory exposed to scripts
    pub memory: Option<Arc<dyn MemoryView>>,
    /// Script instruction budget per resumption (0 disables the limit)
    pub instruction_budget: u32,
}

/// Active playback source
pub enum PlaybackBackend {
    Linear(LinearPlayback),
    Script(ScriptPlayback),
}

impl PlaybackBackend {
    /// Open `path` with the backend its signature selects.
    ///
    /// Nothing is constructed unless the source parses completely.
    pub fn open(path: &Path, options: &OpenOptions) -> Result<Self, SessionError> {
        let format = MovieFormat::detect(path)?;
        tracing::debug!(path = %path.display(), %format, "opening movie source");

        match format {
            MovieFormat::Text | MovieFormat::Binary => {
                Ok(Self::Linear(LinearPlayback::load(path, format)?))
            }
            MovieFormat::Script => Ok(Self::Script(ScriptPlayback::load(
                path,
                options.memory.clone(),
                options.instruction_budget,
            )?)),
        }
    }

    pub fn format(&self) -> MovieFormat {
        match self {
            Self::Linear(linear) => linear.format(),
            Self::Script(_) => MovieFormat::Script,
        }
    }
}

impl Playback for PlaybackBackend {
    fn read_pad(&mut self, frame: u64, index: usize) -> PadStatus {
        match self {
            Self::Linear(linear) => linear.read_pad(frame, index),
            Self::Script(script) => script.read_pad(frame, index),
        }
    }

    fn read_motion(&mut self, frame: u64, index: usize, report: &mut [u8]) {
        match self {
            Self::Linear(linear) => linear.read_motion(frame, index, report),
            Self::Script(script) => script.read_motion(frame, index, report),
        }
    }

    fn reset_at(&self, frame: u64) -> bool {
        match self {
            Self::Linear(linear) => linear.reset_at(frame),
            Self::Script(script) => script.reset_at(frame),
        }
    }

    fn advance(&mut self, frame: u64) -> BackendEvents {
        match self {
            Self::Linear(linear) => linear.advance(frame),
            Self::Script(script) => script.advance(frame),
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            Self::Linear(linear) => linear.is_finished(),
            Self::Script(script) => script.is_finished(),
        }
    }
}

/// Backend held by an active session; the variant is the session mode
pub enum ActiveBackend {
    Recording(LinearRecording),
    Playback(PlaybackBackend),
}
