//! Binary movie profile (.irb)
//!
//! Compact storage for recorded sessions. The body can be LZ4-compressed.
//!
//! # File Structure
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │ Header (8 bytes)                               │
//! │ ├─ magic: "IREL"                               │
//! │ ├─ version: u8                                 │
//! │ ├─ flags: u8                                   │
//! │ └─ reserved: [u8; 2]                           │
//! ├────────────────────────────────────────────────┤
//! │ Body (LZ4 with prepended size if COMPRESSED)   │
//! │ ├─ info: u32 count, (str, str)*                │
//! │ ├─ settings: u32 count, (str, str)*            │
//! │ └─ frames: u64 count, (u64 frame, u16 n,       │
//! │            record*)*                           │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! A record is `tag: u8` followed, for pads and motion controllers, by the
//! presence mask and the present fields. Strings are `u32` length + UTF-8.

mod reader;
mod writer;

pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// File magic
pub const MAGIC: [u8; 4] = *b"IREL";

/// Current format version
pub const VERSION: u8 = 1;

bitflags::bitflags! {
    /// Binary profile header flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BinaryFlags: u8 {
        /// Body is LZ4-compressed with a prepended size
        const COMPRESSED = 0b0000_0001;
    }
}
