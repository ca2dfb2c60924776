//! Binary movie profile writer

use byteorder::{LittleEndian, WriteBytesExt};
use lz4_flex::compress_prepend_size;
use std::collections::BTreeMap;
use std::io::{self, Write};

use super::{BinaryFlags, MAGIC, VERSION};
use crate::movie::codec::{FieldMask, PadFields};
use crate::movie::types::{InputRecord, MovieDocument};

/// Writer for the binary movie profile
pub struct BinaryWriter<W: Write> {
    writer: W,
    compress: bool,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer
    pub fn new(writer: W, compress: bool) -> Self {
        Self { writer, compress }
    }

    /// Write a complete document to the output
    pub fn write_document(&mut self, doc: &MovieDocument) -> io::Result<()> {
        let mut flags = BinaryFlags::empty();
        if self.compress {
            flags |= BinaryFlags::COMPRESSED;
        }

        self.writer.write_all(&MAGIC)?;
        self.writer.write_u8(VERSION)?;
        self.writer.write_u8(flags.bits())?;
        self.writer.write_all(&[0u8; 2])?;

        let mut body = Vec::new();
        write_map(&mut body, &doc.info)?;
        write_map(&mut body, &doc.settings)?;
        write_inputs(&mut body, doc)?;

        if self.compress {
            self.writer.write_all(&compress_prepend_size(&body))?;
        } else {
            self.writer.write_all(&body)?;
        }
        self.writer.flush()
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Length prefix for `len`, refusing values the prefix type can't hold
fn length<T: TryFrom<usize>>(len: usize, what: &str) -> io::Result<T> {
    T::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{what} too long for the binary profile ({len})"),
        )
    })
}

fn write_str(out: &mut Vec<u8>, s: &str) -> io::Result<()> {
    out.write_u32::<LittleEndian>(length(s.len(), "string")?)?;
    out.write_all(s.as_bytes())
}

fn write_map(out: &mut Vec<u8>, map: &BTreeMap<String, String>) -> io::Result<()> {
    out.write_u32::<LittleEndian>(length(map.len(), "map")?)?;
    for (key, value) in map {
        write_str(out, key)?;
        write_str(out, value)?;
    }
    Ok(())
}

fn write_inputs(out: &mut Vec<u8>, doc: &MovieDocument) -> io::Result<()> {
    out.write_u64::<LittleEndian>(doc.inputs.len() as u64)?;
    for (frame, records) in &doc.inputs {
        out.write_u64::<LittleEndian>(*frame)?;
        out.write_u16::<LittleEndian>(length(records.len(), "frame group")?)?;
        for record in records {
            write_record(out, record)?;
        }
    }
    Ok(())
}

fn write_record(out: &mut Vec<u8>, record: &InputRecord) -> io::Result<()> {
    out.write_u8(record.kind() as u8)?;
    match record {
        InputRecord::Pad { index, status } => {
            let mask = FieldMask::for_pad(*index, status);
            let fields = PadFields::present(mask, *index, status);
            out.write_u8(mask.bits())?;
            if let Some(index) = fields.index {
                out.write_u8(index)?;
            }
            if let Some(buttons) = fields.buttons {
                out.write_u16::<LittleEndian>(buttons.bits())?;
            }
            for value in fields.axes.into_iter().flatten() {
                out.write_u8(value)?;
            }
        }
        InputRecord::Motion { index, report } => {
            let mask = FieldMask::for_motion(*index, report);
            out.write_u8(mask.bits())?;
            if mask.contains(FieldMask::INDEX) {
                out.write_u8(*index)?;
            }
            if mask.contains(FieldMask::BUTTONS) {
                let bytes = report.as_bytes();
                out.write_u16::<LittleEndian>(length(bytes.len(), "motion report")?)?;
                out.write_all(bytes)?;
            }
        }
        InputRecord::Reset => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad::{MotionReport, PadButtons, PadStatus};

    #[test]
    fn test_write_header() {
        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer, true)
            .write_document(&MovieDocument::new())
            .unwrap();

        assert_eq!(&buffer[0..4], b"IREL");
        assert_eq!(buffer[4], VERSION);
        assert_eq!(buffer[5], BinaryFlags::COMPRESSED.bits());
        assert_eq!(&buffer[6..8], &[0, 0]);
    }

    #[test]
    fn test_record_only_carries_present_fields() {
        let mut out = Vec::new();
        write_record(
            &mut out,
            &InputRecord::Pad {
                index: 0,
                status: PadStatus::with_buttons(PadButtons::A),
            },
        )
        .unwrap();

        // tag, mask, u16 buttons
        assert_eq!(out, vec![0, 0b0000_0010, 0x00, 0x01]);
    }

    #[test]
    fn test_reset_record_is_tag_only() {
        let mut out = Vec::new();
        write_record(&mut out, &InputRecord::Reset).unwrap();
        assert_eq!(out, vec![2]);
    }

    #[test]
    fn test_oversized_motion_report_refused() {
        let mut out = Vec::new();
        let err = write_record(
            &mut out,
            &InputRecord::Motion {
                index: 0,
                report: MotionReport::new(vec![1u8; usize::from(u16::MAX) + 1]),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let mut out = Vec::new();
        write_record(
            &mut out,
            &InputRecord::Motion {
                index: 0,
                report: MotionReport::new(vec![1u8; usize::from(u16::MAX)]),
            },
        )
        .unwrap();
        assert_eq!(out.len(), 1 + 1 + 2 + usize::from(u16::MAX));
    }

    #[test]
    fn test_empty_uncompressed_size() {
        let mut buffer = Vec::new();
        BinaryWriter::new(&mut buffer, false)
            .write_document(&MovieDocument::new())
            .unwrap();

        // header (8) + two empty maps (4 + 4) + frame group count (8)
        assert_eq!(buffer.len(), 24);
    }
}
