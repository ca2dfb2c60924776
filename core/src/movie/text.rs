//! Text movie profile
//!
//! A tab-indented JSON document that stays readable in a diff:
//!
//! ```text
//! {
//!     "info": { "author": "..", "frames": "120", .. },
//!     "settings": { "peripherals": "1" },
//!     "inputs": {
//!         "0": [ { "type": "pad", "mask": "00000010", "buttons": "A" } ]
//!     }
//! }
//! ```
//!
//! Records carry the same presence mask as the binary profile, written as
//! eight binary digits. Fields whose bit is clear are omitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::error::MovieError;
use crate::movie::codec::{FieldMask, PadFields};
use crate::movie::types::{InputRecord, MovieDocument};
use crate::pad::{MotionReport, PadButtons};

#[derive(Debug, Serialize, Deserialize)]
struct TextDocument {
    #[serde(default)]
    info: BTreeMap<String, String>,
    #[serde(default)]
    settings: BTreeMap<String, String>,
    #[serde(default)]
    inputs: BTreeMap<u64, Vec<TextRecord>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TextKind {
    Pad,
    Motion,
    Reset,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextRecord {
    #[serde(rename = "type")]
    kind: TextKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mask: Option<String>,
    #[serde(rename = "padNumber", default, skip_serializing_if = "Option::is_none")]
    pad_number: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    buttons: Option<String>,
    #[serde(rename = "analogX", default, skip_serializing_if = "Option::is_none")]
    analog_x: Option<u8>,
    #[serde(rename = "analogY", default, skip_serializing_if = "Option::is_none")]
    analog_y: Option<u8>,
    #[serde(rename = "cstickX", default, skip_serializing_if = "Option::is_none")]
    cstick_x: Option<u8>,
    #[serde(rename = "cstickY", default, skip_serializing_if = "Option::is_none")]
    cstick_y: Option<u8>,
    #[serde(rename = "triggerL", default, skip_serializing_if = "Option::is_none")]
    trigger_l: Option<u8>,
    #[serde(rename = "triggerR", default, skip_serializing_if = "Option::is_none")]
    trigger_r: Option<u8>,
    /// Motion report bytes, hex encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    report: Option<String>,
}

impl TextRecord {
    fn empty(kind: TextKind) -> Self {
        Self {
            kind,
            mask: None,
            pad_number: None,
            buttons: None,
            analog_x: None,
            analog_y: None,
            cstick_x: None,
            cstick_y: None,
            trigger_l: None,
            trigger_r: None,
            report: None,
        }
    }

    fn from_record(record: &InputRecord) -> Self {
        match record {
            InputRecord::Pad { index, status } => {
                let mask = FieldMask::for_pad(*index, status);
                let fields = PadFields::present(mask, *index, status);
                let [analog_x, analog_y, cstick_x, cstick_y, trigger_l, trigger_r] = fields.axes;
                Self {
                    mask: Some(mask.to_bit_string()),
                    pad_number: fields.index,
                    buttons: fields.buttons.map(PadButtons::to_names),
                    analog_x,
                    analog_y,
                    cstick_x,
                    cstick_y,
                    trigger_l,
                    trigger_r,
                    ..Self::empty(TextKind::Pad)
                }
            }
            InputRecord::Motion { index, report } => {
                let mask = FieldMask::for_motion(*index, report);
                Self {
                    mask: Some(mask.to_bit_string()),
                    pad_number: mask.contains(FieldMask::INDEX).then_some(*index),
                    report: mask
                        .contains(FieldMask::BUTTONS)
                        .then(|| hex::encode(report.as_bytes())),
                    ..Self::empty(TextKind::Motion)
                }
            }
            InputRecord::Reset => Self::empty(TextKind::Reset),
        }
    }

    fn has_fields(&self) -> bool {
        self.pad_number.is_some()
            || self.buttons.is_some()
            || self.report.is_some()
            || [
                self.analog_x,
                self.analog_y,
                self.cstick_x,
                self.cstick_y,
                self.trigger_l,
                self.trigger_r,
            ]
            .iter()
            .any(Option::is_some)
    }

    fn mask(&self) -> Result<FieldMask, MovieError> {
        match &self.mask {
            Some(bits) => FieldMask::from_bit_string(bits)
                .ok_or_else(|| MovieError::format(format!("invalid mask \"{bits}\""))),
            None if self.has_fields() => Err(MovieError::format("record has fields but no mask")),
            None => Ok(FieldMask::empty()),
        }
    }

    fn into_record(self) -> Result<InputRecord, MovieError> {
        let mask = self.mask()?;
        match self.kind {
            TextKind::Pad => {
                let fields = PadFields {
                    index: self.pad_number,
                    buttons: self.buttons.as_deref().map(PadButtons::from_names),
                    axes: [
                        self.analog_x,
                        self.analog_y,
                        self.cstick_x,
                        self.cstick_y,
                        self.trigger_l,
                        self.trigger_r,
                    ],
                };
                let (index, status) = fields.resolve(mask).map_err(MovieError::format)?;
                Ok(InputRecord::Pad { index, status })
            }
            TextKind::Motion => {
                let index = if mask.contains(FieldMask::INDEX) {
                    self.pad_number
                        .ok_or_else(|| MovieError::format("mask declares padNumber but it is missing"))?
                } else {
                    0
                };
                let report = if mask.contains(FieldMask::BUTTONS) {
                    let encoded = self
                        .report
                        .ok_or_else(|| MovieError::format("mask declares report but it is missing"))?;
                    MotionReport(hex::decode(encoded).map_err(|e| MovieError::format(e.to_string()))?)
                } else {
                    MotionReport::default()
                };
                Ok(InputRecord::Motion { index, report })
            }
            TextKind::Reset => Ok(InputRecord::Reset),
        }
    }
}

/// Serialize a document as tab-indented JSON
pub fn write_text<W: Write>(writer: W, doc: &MovieDocument) -> Result<(), MovieError> {
    let text = TextDocument {
        info: doc.info.clone(),
        settings: doc.settings.clone(),
        inputs: doc
            .inputs
            .iter()
            .map(|(frame, records)| (*frame, records.iter().map(TextRecord::from_record).collect()))
            .collect(),
    };

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    text.serialize(&mut serializer)
        .map_err(|e| MovieError::format(e.to_string()))
}

/// Parse a text document
pub fn read_text<R: Read>(reader: R) -> Result<MovieDocument, MovieError> {
    let text: TextDocument =
        serde_json::from_reader(reader).map_err(|e| MovieError::format(e.to_string()))?;

    let mut doc = MovieDocument {
        info: text.info,
        settings: text.settings,
        inputs: BTreeMap::new(),
    };
    for (frame, records) in text.inputs {
        for record in records {
            let record = record
                .into_record()
                .map_err(|e| MovieError::format(format!("frame {frame}: {e}")))?;
            // Neutral records from hand-edited files are dropped here.
            doc.put(frame, record);
        }
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pad::PadStatus;

    fn to_string(doc: &MovieDocument) -> String {
        let mut out = Vec::new();
        write_text(&mut out, doc).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_write_sparse_fields() {
        let mut doc = MovieDocument::new();
        doc.put(
            4,
            InputRecord::Pad {
                index: 0,
                status: PadStatus {
                    buttons: PadButtons::A | PadButtons::B,
                    stick_x: 0xFF,
                    ..PadStatus::NEUTRAL
                },
            },
        );

        let text = to_string(&doc);
        assert!(text.contains("\"mask\": \"00000110\""));
        assert!(text.contains("\"buttons\": \"A B\""));
        assert!(text.contains("\"analogX\": 255"));
        assert!(!text.contains("analogY"));
        assert!(!text.contains("padNumber"));
        assert!(text.contains("\n\t\"inputs\""));
    }

    #[test]
    fn test_roundtrip() {
        let mut doc = MovieDocument::new();
        doc.info.insert("author".into(), "someone".into());
        doc.put(
            1,
            InputRecord::Pad {
                index: 2,
                status: PadStatus {
                    trigger_l: 40,
                    c_stick_y: 0,
                    ..PadStatus::NEUTRAL
                },
            },
        );
        doc.put(
            1,
            InputRecord::Motion {
                index: 0,
                report: MotionReport::new(vec![0xAB, 0x00, 0x10]),
            },
        );
        doc.put(12, InputRecord::Reset);

        let parsed = read_text(to_string(&doc).as_bytes()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_absent_fields_read_neutral() {
        let json = r#"{ "inputs": { "3": [ { "type": "pad", "mask": "00000000" } ] } }"#;
        let doc = read_text(json.as_bytes()).unwrap();
        assert_eq!(doc.pad(3, 0), None);
        assert!(doc.inputs.is_empty());
        assert!(doc.info.is_empty());
    }

    #[test]
    fn test_declared_field_missing() {
        let json = r#"{ "inputs": { "0": [ { "type": "pad", "mask": "00000100" } ] } }"#;
        assert!(matches!(
            read_text(json.as_bytes()),
            Err(MovieError::Format(_))
        ));
    }

    #[test]
    fn test_fields_without_mask() {
        let json = r#"{ "inputs": { "0": [ { "type": "pad", "buttons": "A", "triggerL": 200 } ] } }"#;
        assert!(matches!(
            read_text(json.as_bytes()),
            Err(MovieError::Format(_))
        ));

        let json = r#"{ "inputs": { "0": [ { "type": "motion", "report": "0102" } ] } }"#;
        assert!(read_text(json.as_bytes()).is_err());

        // A bare record without fields still reads as neutral
        let json = r#"{ "inputs": { "0": [ { "type": "pad" }, { "type": "reset" } ] } }"#;
        let doc = read_text(json.as_bytes()).unwrap();
        assert!(doc.has_reset(0));
        assert_eq!(doc.pad(0, 0), None);
    }

    #[test]
    fn test_bad_mask_string() {
        let json = r#"{ "inputs": { "0": [ { "type": "pad", "mask": "2" } ] } }"#;
        assert!(read_text(json.as_bytes()).is_err());
    }

    #[test]
    fn test_bad_report_hex() {
        let json =
            r#"{ "inputs": { "0": [ { "type": "motion", "mask": "00000010", "report": "zz" } ] } }"#;
        assert!(read_text(json.as_bytes()).is_err());
    }
}
