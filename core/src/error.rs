//! Error types
//!
//! Format and script failures are local to backend construction or to a
//! single script resumption; the session turns both into a clean return to
//! idle.

use std::path::PathBuf;

/// Failure to read, write or identify a movie document
#[derive(Debug, thiserror::Error)]
pub enum MovieError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized movie signature: {0}")]
    UnknownSignature(PathBuf),

    #[error("malformed movie: {0}")]
    Format(String),

    #[error("{0} cannot be written as a movie; scripts are read-only sources")]
    NotWritable(PathBuf),
}

impl MovieError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}

impl From<std::io::Error> for MovieError {
    fn from(e: std::io::Error) -> Self {
        // Stream-level errors inside a decoder are malformed input, not a missing file.
        Self::Format(e.to_string())
    }
}

/// Failure of a scripted input source
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load script: {0}")]
    Load(String),

    #[error("script has no main() function")]
    MissingMain,

    #[error("script failed: {0}")]
    Runtime(String),

    #[error("script panicked: {0}")]
    Panic(String),
}

impl From<mlua::Error> for ScriptError {
    fn from(e: mlua::Error) -> Self {
        Self::Runtime(e.to_string())
    }
}

/// Why a session transition was refused
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a movie session is already active")]
    AlreadyActive,

    #[error("no peripheral selected for recording")]
    NoPeripherals,

    #[error("no movie is being recorded")]
    NotRecording,

    #[error(transparent)]
    Movie(#[from] MovieError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("snapshot error: {0:#}")]
    Snapshot(anyhow::Error),

    #[error("counter snapshot: {0}")]
    Counters(#[from] bincode::Error),
}
