//! inputreel core - deterministic input movies for emulators
//!
//! Records the inputs delivered to emulated peripherals and replays them
//! frame-exactly, either from a stored movie or from a script that
//! generates input on the fly.
//!
//! # Architecture
//!
//! - [`MovieSession`] - Record/playback state machine the host calls every frame
//! - [`Host`] - Emulator services the session consumes (pause, snapshots, wiring)
//! - [`movie`] - Movie documents, the text and binary profiles, and backends
//! - [`script`] - Lua input scripts with hold/press controller buffers
//! - [`pad`] - Peripheral state and the shared neutral table

pub mod config;
pub mod error;
#[cfg(test)]
mod integration;
pub mod movie;
pub mod pad;
pub mod script;
pub mod session;
#[cfg(test)]
pub mod test_utils;

pub use config::MovieConfig;
pub use error::{MovieError, ScriptError, SessionError};
pub use movie::{MovieDocument, MovieFormat};
pub use pad::{MotionReport, PadButtons, PadStatus, PeripheralMask, PeripheralSlot};
pub use script::ScriptPlayback;
pub use session::{Host, MemoryView, MovieSession, SessionMode};
