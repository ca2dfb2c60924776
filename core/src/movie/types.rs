//! In-memory movie document
//!
//! Shared by both serialization profiles. Records are sparse in time: a
//! frame only appears once some peripheral left its rest state on it.

use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::pad::{MotionReport, PadStatus, PeripheralMask};

/// Metadata key: session start epoch (seconds)
pub const INFO_START_TIME: &str = "start_time";
/// Metadata key: number of frames the recording covers
pub const INFO_FRAMES: &str = "frames";
/// Metadata key: whether the movie starts from a snapshot
pub const INFO_SAVESTATE: &str = "savestate";
/// Metadata key: title identifier (hex)
pub const INFO_TITLE_ID: &str = "title_id";
/// Metadata key: movie author
pub const INFO_AUTHOR: &str = "author";
/// Metadata key: whether the movie starts from a blank save area
pub const INFO_CLEAR_SAVE: &str = "clear_save";
/// Metadata key: disc image swapped in during the recording
pub const INFO_DISC_CHANGE: &str = "disc_change";
/// Settings key: enabled peripheral mask
pub const SETTING_PERIPHERALS: &str = "peripherals";

/// Peripheral class tag of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    Pad = 0,
    Motion = 1,
    Reset = 2,
}

impl RecordKind {
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Pad),
            1 => Some(Self::Motion),
            2 => Some(Self::Reset),
            _ => None,
        }
    }
}

/// One stored input for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRecord {
    /// Primary controller state
    Pad { index: u8, status: PadStatus },
    /// Motion controller report
    Motion { index: u8, report: MotionReport },
    /// Console reset on this frame
    Reset,
}

impl InputRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            InputRecord::Pad { .. } => RecordKind::Pad,
            InputRecord::Motion { .. } => RecordKind::Motion,
            InputRecord::Reset => RecordKind::Reset,
        }
    }

    /// Whether this record carries nothing beyond the rest state
    pub fn is_neutral(&self) -> bool {
        match self {
            InputRecord::Pad { status, .. } => status.is_neutral(),
            InputRecord::Motion { report, .. } => report.is_neutral(),
            InputRecord::Reset => false,
        }
    }

    /// Whether this record belongs to the same peripheral slot as `other`
    fn same_slot(&self, other: &InputRecord) -> bool {
        match (self, other) {
            (InputRecord::Pad { index: a, .. }, InputRecord::Pad { index: b, .. }) => a == b,
            (InputRecord::Motion { index: a, .. }, InputRecord::Motion { index: b, .. }) => {
                a == b
            }
            (InputRecord::Reset, InputRecord::Reset) => true,
            _ => false,
        }
    }
}

/// Records of a single frame; one or two is the common case
pub type FrameRecords = SmallVec<[InputRecord; 2]>;

/// A complete movie: metadata, host settings and sparse per-frame inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieDocument {
    /// Free-form metadata (author, start epoch, ...)
    pub info: BTreeMap<String, String>,
    /// Host configuration needed to reproduce the run
    pub settings: BTreeMap<String, String>,
    /// Frame number -> records stored for that frame
    pub inputs: BTreeMap<u64, FrameRecords>,
}

impl MovieDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records stored for one frame
    pub fn frame(&self, frame: u64) -> &[InputRecord] {
        self.inputs.get(&frame).map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Stored pad state for a frame, if any
    pub fn pad(&self, frame: u64, index: u8) -> Option<&PadStatus> {
        self.frame(frame).iter().find_map(|record| match record {
            InputRecord::Pad { index: i, status } if *i == index => Some(status),
            _ => None,
        })
    }

    /// Stored motion report for a frame, if any
    pub fn motion(&self, frame: u64, index: u8) -> Option<&MotionReport> {
        self.frame(frame).iter().find_map(|record| match record {
            InputRecord::Motion { index: i, report } if *i == index => Some(report),
            _ => None,
        })
    }

    /// Whether a reset is stored for a frame
    pub fn has_reset(&self, frame: u64) -> bool {
        self.frame(frame).iter().any(|r| matches!(r, InputRecord::Reset))
    }

    /// Store a record, replacing the slot's previous record for that frame.
    ///
    /// A neutral record removes the slot's entry instead; no neutral record
    /// is ever kept.
    pub fn put(&mut self, frame: u64, record: InputRecord) {
        let neutral = record.is_neutral();
        let records = self.inputs.entry(frame).or_default();
        let existing = records.iter().position(|r| r.same_slot(&record));

        match (existing, neutral) {
            (Some(pos), true) => {
                records.remove(pos);
            }
            (Some(pos), false) => records[pos] = record,
            (None, false) => records.push(record),
            (None, true) => {}
        }

        if records.is_empty() {
            self.inputs.remove(&frame);
        }
    }

    /// Greatest frame with a stored record
    pub fn last_frame(&self) -> Option<u64> {
        self.inputs.keys().next_back().copied()
    }

    /// Total number of stored records
    pub fn record_count(&self) -> usize {
        self.inputs.values().map(|r| r.len()).sum()
    }

    /// Recorded frame length from metadata (0 when absent or unparsable)
    pub fn frame_length(&self) -> u64 {
        self.info
            .get(INFO_FRAMES)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Session start epoch from metadata
    pub fn start_time(&self) -> Option<u64> {
        self.info.get(INFO_START_TIME).and_then(|v| v.parse().ok())
    }

    /// Whether the movie begins from a snapshot rather than a cold boot
    pub fn from_save_state(&self) -> bool {
        self.info.get(INFO_SAVESTATE).is_some_and(|v| v == "true")
    }

    /// Whether the movie expects to start from a blank save area
    pub fn clear_save(&self) -> bool {
        self.info.get(INFO_CLEAR_SAVE).is_some_and(|v| v == "true")
    }

    /// Disc the movie switches to, if it changed discs
    pub fn disc_change(&self) -> Option<&str> {
        self.info
            .get(INFO_DISC_CHANGE)
            .map(String::as_str)
            .filter(|disc| !disc.is_empty())
    }

    /// Peripheral mask the movie was recorded with
    pub fn peripherals(&self) -> Option<PeripheralMask> {
        self.settings
            .get(SETTING_PERIPHERALS)
            .and_then(|v| v.parse::<u8>().ok())
            .map(PeripheralMask::from_bits_truncate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad::PadButtons;

    fn pad(index: u8, buttons: PadButtons) -> InputRecord {
        InputRecord::Pad {
            index,
            status: PadStatus::with_buttons(buttons),
        }
    }

    #[test]
    fn test_put_inserts_and_replaces() {
        let mut doc = MovieDocument::new();
        doc.put(5, pad(0, PadButtons::A));
        doc.put(5, pad(1, PadButtons::B));
        doc.put(5, pad(0, PadButtons::X));

        assert_eq!(doc.frame(5).len(), 2);
        assert_eq!(doc.pad(5, 0).unwrap().buttons, PadButtons::X);
        assert_eq!(doc.pad(5, 1).unwrap().buttons, PadButtons::B);
    }

    #[test]
    fn test_neutral_put_removes() {
        let mut doc = MovieDocument::new();
        doc.put(3, pad(2, PadButtons::A));
        doc.put(3, pad(2, PadButtons::empty()));

        assert!(doc.pad(3, 2).is_none());
        assert!(doc.inputs.is_empty());
    }

    #[test]
    fn test_neutral_put_on_empty_frame_is_noop() {
        let mut doc = MovieDocument::new();
        doc.put(
            9,
            InputRecord::Motion {
                index: 0,
                report: MotionReport::new(vec![0, 0]),
            },
        );
        assert!(doc.inputs.is_empty());
    }

    #[test]
    fn test_pad_and_motion_slots_are_distinct() {
        let mut doc = MovieDocument::new();
        doc.put(0, pad(0, PadButtons::A));
        doc.put(
            0,
            InputRecord::Motion {
                index: 0,
                report: MotionReport::new(vec![1]),
            },
        );
        doc.put(0, InputRecord::Reset);
        doc.put(0, InputRecord::Reset);

        assert_eq!(doc.record_count(), 3);
        assert!(doc.has_reset(0));
        assert_eq!(doc.motion(0, 0).unwrap().as_bytes(), &[1]);
    }

    #[test]
    fn test_metadata_accessors() {
        let mut doc = MovieDocument::new();
        assert_eq!(doc.frame_length(), 0);
        assert!(!doc.from_save_state());

        doc.info.insert(INFO_FRAMES.into(), "120".into());
        doc.info.insert(INFO_SAVESTATE.into(), "true".into());
        doc.info.insert(INFO_START_TIME.into(), "1700000000".into());
        doc.settings.insert(SETTING_PERIPHERALS.into(), "17".into());

        assert_eq!(doc.frame_length(), 120);
        assert!(doc.from_save_state());
        assert_eq!(doc.start_time(), Some(1_700_000_000));
        assert_eq!(
            doc.peripherals(),
            Some(PeripheralMask::PAD_1 | PeripheralMask::MOTION_1)
        );
    }

    #[test]
    fn test_last_frame() {
        let mut doc = MovieDocument::new();
        assert_eq!(doc.last_frame(), None);
        doc.put(2, pad(0, PadButtons::A));
        doc.put(40, pad(0, PadButtons::B));
        assert_eq!(doc.last_frame(), Some(40));
    }
}
