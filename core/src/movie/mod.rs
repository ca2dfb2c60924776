//! Movie documents and the backends that play and record them
//!
//! A movie is a sparse map from frame number to the inputs that left their
//! rest state on that frame, plus string metadata and host settings.
//!
//! # Profiles
//!
//! | Profile | Extension | Notes |
//! |---------|-----------|-------|
//! | Text    | `.irt`    | Tab-indented JSON, symbolic button names |
//! | Binary  | `.irb`    | `IREL` magic, optional LZ4 body |
//! | Script  | `.lua`    | Generated input, playback only |
//!
//! Both document profiles share the field-presence scheme in [`codec`].

pub mod backend;
pub mod binary;
pub mod codec;
pub mod format;
pub mod linear;
pub mod text;
pub mod types;

pub use backend::{
    ActiveBackend, BackendEvent, BackendEvents, OpenOptions, Playback, PlaybackBackend, Recording,
};
pub use format::MovieFormat;
pub use linear::{LinearPlayback, LinearRecording, RecordingInfo, load_document, save_document};
pub use types::{InputRecord, MovieDocument, RecordKind};
