//! Linear movie backend
//!
//! Plays and records a [`MovieDocument`] frame by frame. Either profile can
//! back it; the choice is made from the file signature on load and from the
//! destination extension on persist.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::backend::{BackendEvents, Playback, Recording};
use super::binary::{BinaryReader, BinaryWriter};
use super::format::MovieFormat;
use super::text::{read_text, write_text};
use super::types::{
    INFO_AUTHOR, INFO_CLEAR_SAVE, INFO_DISC_CHANGE, INFO_FRAMES, INFO_SAVESTATE, INFO_START_TIME,
    INFO_TITLE_ID, InputRecord, MovieDocument, SETTING_PERIPHERALS,
};
use crate::error::MovieError;
use crate::pad::{MotionReport, PadStatus, PeripheralMask};

/// Read a document from disk in the given profile
pub fn load_document(path: &Path, format: MovieFormat) -> Result<MovieDocument, MovieError> {
    let file = File::open(path).map_err(|e| MovieError::io(path, e))?;
    let reader = BufReader::new(file);
    match format {
        MovieFormat::Text => read_text(reader),
        MovieFormat::Binary => BinaryReader::new(reader).read_document(),
        MovieFormat::Script => Err(MovieError::format(format!(
            "{} is a script, not a document",
            path.display()
        ))),
    }
}

/// Write a document to disk in the given profile
pub fn save_document(
    doc: &MovieDocument,
    path: &Path,
    format: MovieFormat,
    compress: bool,
) -> Result<(), MovieError> {
    let create = || {
        File::create(path)
            .map(BufWriter::new)
            .map_err(|e| MovieError::io(path, e))
    };
    match format {
        MovieFormat::Text => write_text(create()?, doc),
        MovieFormat::Binary => BinaryWriter::new(create()?, compress)
            .write_document(doc)
            .map_err(|e| MovieError::io(path, e)),
        MovieFormat::Script => Err(MovieError::NotWritable(path.to_path_buf())),
    }
}

/// Playback over a loaded document
#[derive(Debug)]
pub struct LinearPlayback {
    doc: MovieDocument,
    format: MovieFormat,
    finished: bool,
}

impl LinearPlayback {
    /// Load a document; fails without side effects on any format error
    pub fn load(path: &Path, format: MovieFormat) -> Result<Self, MovieError> {
        let doc = load_document(path, format)?;
        tracing::debug!(
            path = %path.display(),
            frames = doc.frame_length(),
            records = doc.record_count(),
            "loaded movie"
        );
        Ok(Self::from_document(doc, format))
    }

    pub fn from_document(doc: MovieDocument, format: MovieFormat) -> Self {
        let finished = doc.inputs.is_empty();
        Self {
            doc,
            format,
            finished,
        }
    }

    pub fn document(&self) -> &MovieDocument {
        &self.doc
    }

    pub fn format(&self) -> MovieFormat {
        self.format
    }
}

impl Playback for LinearPlayback {
    fn read_pad(&mut self, frame: u64, index: usize) -> PadStatus {
        u8::try_from(index)
            .ok()
            .and_then(|index| self.doc.pad(frame, index))
            .copied()
            .unwrap_or(PadStatus::NEUTRAL)
    }

    fn read_motion(&mut self, frame: u64, index: usize, report: &mut [u8]) {
        report.fill(0);
        let stored = u8::try_from(index)
            .ok()
            .and_then(|index| self.doc.motion(frame, index));
        if let Some(stored) = stored {
            let len = stored.as_bytes().len().min(report.len());
            report[..len].copy_from_slice(&stored.as_bytes()[..len]);
        }
    }

    fn reset_at(&self, frame: u64) -> bool {
        self.doc.has_reset(frame)
    }

    fn advance(&mut self, frame: u64) -> BackendEvents {
        if !self.finished {
            let past_last = self.doc.last_frame().is_none_or(|last| frame > last);
            self.finished = past_last && frame >= self.doc.frame_length();
        }
        BackendEvents::new()
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Session facts stamped into a recording's metadata
#[derive(Debug, Clone, Default)]
pub struct RecordingInfo {
    /// Session start epoch (seconds)
    pub start_time: u64,
    pub author: Option<String>,
    pub from_save_state: bool,
    /// The title was started with a blank save area
    pub clear_save: bool,
    /// Last disc swapped in while recording
    pub disc_change: Option<String>,
    pub title_id: Option<u64>,
    pub peripherals: PeripheralMask,
    /// Host settings needed to reproduce the run
    pub settings: BTreeMap<String, String>,
}

/// Recording into a fresh document
#[derive(Debug)]
pub struct LinearRecording {
    doc: MovieDocument,
    info: RecordingInfo,
    /// Frames covered so far, trailing neutral frames included
    end_frame: u64,
    default_format: MovieFormat,
    compress: bool,
}

impl LinearRecording {
    pub fn new(info: RecordingInfo, default_format: MovieFormat, compress: bool) -> Self {
        Self {
            doc: MovieDocument::new(),
            info,
            end_frame: 0,
            default_format,
            compress,
        }
    }

    pub fn document(&self) -> &MovieDocument {
        &self.doc
    }

    pub fn info(&self) -> &RecordingInfo {
        &self.info
    }

    /// Note a disc swap; the last one wins
    pub fn set_disc_change(&mut self, disc: impl Into<String>) {
        self.info.disc_change = Some(disc.into());
    }

    fn cover(&mut self, frame: u64) {
        self.end_frame = self.end_frame.max(frame + 1);
    }

    fn stamp(&mut self) {
        let info = &mut self.doc.info;
        info.insert(INFO_START_TIME.into(), self.info.start_time.to_string());
        info.insert(INFO_FRAMES.into(), self.end_frame.to_string());
        info.insert(INFO_SAVESTATE.into(), self.info.from_save_state.to_string());
        info.insert(INFO_CLEAR_SAVE.into(), self.info.clear_save.to_string());
        if let Some(disc) = &self.info.disc_change {
            info.insert(INFO_DISC_CHANGE.into(), disc.clone());
        }
        if let Some(author) = &self.info.author {
            info.insert(INFO_AUTHOR.into(), author.clone());
        }
        if let Some(title_id) = self.info.title_id {
            info.insert(INFO_TITLE_ID.into(), format!("{title_id:016x}"));
        }

        let settings = &mut self.doc.settings;
        settings.extend(self.info.settings.clone());
        settings.insert(
            SETTING_PERIPHERALS.into(),
            self.info.peripherals.bits().to_string(),
        );
    }
}

impl Recording for LinearRecording {
    fn write_pad(&mut self, frame: u64, index: usize, status: &PadStatus) {
        let Ok(index) = u8::try_from(index) else {
            return;
        };
        self.cover(frame);
        self.doc.put(
            frame,
            InputRecord::Pad {
                index,
                status: *status,
            },
        );
    }

    fn write_motion(&mut self, frame: u64, index: usize, report: &[u8]) {
        let Ok(index) = u8::try_from(index) else {
            return;
        };
        self.cover(frame);
        self.doc.put(
            frame,
            InputRecord::Motion {
                index,
                report: MotionReport::new(report),
            },
        );
    }

    fn write_reset(&mut self, frame: u64) {
        self.cover(frame);
        self.doc.put(frame, InputRecord::Reset);
    }

    fn advance(&mut self, frame: u64) {
        self.end_frame = self.end_frame.max(frame);
    }

    fn persist(&mut self, destination: &Path) -> Result<(), MovieError> {
        let format = MovieFormat::from_extension(destination).unwrap_or(self.default_format);
        self.stamp();
        save_document(&self.doc, destination, format, self.compress)?;
        tracing::info!(
            path = %destination.display(),
            %format,
            frames = self.end_frame,
            "movie saved"
        );
        Ok(())
    }
}
