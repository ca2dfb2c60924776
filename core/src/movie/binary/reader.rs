//! Binary movie profile reader

use byteorder::{LittleEndian, ReadBytesExt};
use lz4_flex::decompress_size_prepended;
use std::collections::BTreeMap;
use std::io::Read;

use super::{BinaryFlags, MAGIC, VERSION};
use crate::error::MovieError;
use crate::movie::codec::{FieldMask, PadFields};
use crate::movie::types::{InputRecord, MovieDocument, RecordKind};
use crate::pad::{MotionReport, PadButtons};

/// Longest string accepted in a metadata map
const MAX_STRING_LEN: usize = 1 << 20;

/// Reader for the binary movie profile
pub struct BinaryReader<R: Read> {
    reader: R,
}

impl<R: Read> BinaryReader<R> {
    /// Create a new binary reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read a complete document from the input
    pub fn read_document(&mut self) -> Result<MovieDocument, MovieError> {
        let mut magic = [0u8; 4];
        self.reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(MovieError::format("bad magic"));
        }

        let version = self.reader.read_u8()?;
        if version != VERSION {
            return Err(MovieError::format(format!(
                "unsupported binary version {version}"
            )));
        }
        let flags = BinaryFlags::from_bits_truncate(self.reader.read_u8()?);
        let mut reserved = [0u8; 2];
        self.reader.read_exact(&mut reserved)?;

        let mut raw = Vec::new();
        self.reader.read_to_end(&mut raw)?;
        let body = if flags.contains(BinaryFlags::COMPRESSED) {
            decompress_size_prepended(&raw).map_err(|e| MovieError::format(e.to_string()))?
        } else {
            raw
        };

        let mut body = body.as_slice();
        let mut doc = MovieDocument {
            info: read_map(&mut body)?,
            settings: read_map(&mut body)?,
            inputs: BTreeMap::new(),
        };
        read_inputs(&mut body, &mut doc)?;

        if !body.is_empty() {
            return Err(MovieError::format(format!(
                "{} trailing bytes after inputs",
                body.len()
            )));
        }

        Ok(doc)
    }
}

fn read_str(input: &mut &[u8]) -> Result<String, MovieError> {
    let len = input.read_u32::<LittleEndian>()? as usize;
    if len > MAX_STRING_LEN || len > input.len() {
        return Err(MovieError::format("string length out of range"));
    }
    let mut bytes = vec![0u8; len];
    input.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| MovieError::format(e.to_string()))
}

fn read_map(input: &mut &[u8]) -> Result<BTreeMap<String, String>, MovieError> {
    let count = input.read_u32::<LittleEndian>()?;
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let key = read_str(input)?;
        let value = read_str(input)?;
        map.insert(key, value);
    }
    Ok(map)
}

fn read_inputs(input: &mut &[u8], doc: &mut MovieDocument) -> Result<(), MovieError> {
    let groups = input.read_u64::<LittleEndian>()?;
    let mut previous: Option<u64> = None;

    for _ in 0..groups {
        let frame = input.read_u64::<LittleEndian>()?;
        if previous.is_some_and(|p| frame <= p) {
            return Err(MovieError::format(format!(
                "frame {frame} out of order"
            )));
        }
        previous = Some(frame);

        let count = input.read_u16::<LittleEndian>()?;
        for _ in 0..count {
            doc.put(frame, read_record(input)?);
        }
    }
    Ok(())
}

fn read_record(input: &mut &[u8]) -> Result<InputRecord, MovieError> {
    let tag = input.read_u8()?;
    let kind =
        RecordKind::from_u8(tag).ok_or_else(|| MovieError::format(format!("unknown record tag {tag}")))?;

    match kind {
        RecordKind::Pad => {
            let mask = FieldMask::from_bits_retain(input.read_u8()?);
            let mut fields = PadFields::default();
            if mask.contains(FieldMask::INDEX) {
                fields.index = Some(input.read_u8()?);
            }
            if mask.contains(FieldMask::BUTTONS) {
                fields.buttons = Some(PadButtons::from_bits_retain(
                    input.read_u16::<LittleEndian>()?,
                ));
            }
            for (slot, bit) in fields.axes.iter_mut().zip(FieldMask::AXES) {
                if mask.contains(bit) {
                    *slot = Some(input.read_u8()?);
                }
            }
            let (index, status) = fields.resolve(mask).map_err(MovieError::format)?;
            Ok(InputRecord::Pad { index, status })
        }
        RecordKind::Motion => {
            let mask = FieldMask::from_bits_retain(input.read_u8()?);
            let index = if mask.contains(FieldMask::INDEX) {
                input.read_u8()?
            } else {
                0
            };
            let report = if mask.contains(FieldMask::BUTTONS) {
                let len = input.read_u16::<LittleEndian>()? as usize;
                let mut bytes = vec![0u8; len];
                input.read_exact(&mut bytes)?;
                MotionReport(bytes)
            } else {
                MotionReport::default()
            };
            Ok(InputRecord::Motion { index, report })
        }
        RecordKind::Reset => Ok(InputRecord::Reset),
    }
}
