//! Field-presence mask shared by both serialization profiles
//!
//! Each record is written as its tag, an 8-bit presence mask and then only
//! the fields whose bit is set. Decoding starts from the neutral state and
//! overlays the present fields.

use crate::pad::{MotionReport, PadButtons, PadStatus};

bitflags::bitflags! {
    /// Which fields of a record differ from rest
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldMask: u8 {
        /// Peripheral index is not zero
        const INDEX = 1 << 0;
        /// Pad buttons pressed, or motion report non-empty
        const BUTTONS = 1 << 1;
        const STICK_X = 1 << 2;
        const STICK_Y = 1 << 3;
        const C_STICK_X = 1 << 4;
        const C_STICK_Y = 1 << 5;
        const TRIGGER_L = 1 << 6;
        const TRIGGER_R = 1 << 7;
    }
}

impl FieldMask {
    /// Mask bits of the six axes, in [`PadStatus::axes`] order
    pub const AXES: [FieldMask; 6] = [
        FieldMask::STICK_X,
        FieldMask::STICK_Y,
        FieldMask::C_STICK_X,
        FieldMask::C_STICK_Y,
        FieldMask::TRIGGER_L,
        FieldMask::TRIGGER_R,
    ];

    /// Mask for a pad record
    pub fn for_pad(index: u8, status: &PadStatus) -> Self {
        let mut mask = FieldMask::empty();
        if index != 0 {
            mask |= FieldMask::INDEX;
        }
        if status.buttons != PadStatus::NEUTRAL.buttons {
            mask |= FieldMask::BUTTONS;
        }
        let neutral = PadStatus::NEUTRAL.axes();
        for ((value, rest), bit) in status.axes().iter().zip(neutral).zip(Self::AXES) {
            if *value != rest {
                mask |= bit;
            }
        }
        mask
    }

    /// Mask for a motion record
    pub fn for_motion(index: u8, report: &MotionReport) -> Self {
        let mut mask = FieldMask::empty();
        if index != 0 {
            mask |= FieldMask::INDEX;
        }
        if !report.as_bytes().is_empty() {
            mask |= FieldMask::BUTTONS;
        }
        mask
    }

    /// Text-profile form: eight binary digits, most significant bit first
    pub fn to_bit_string(self) -> String {
        format!("{:08b}", self.bits())
    }

    pub fn from_bit_string(s: &str) -> Option<Self> {
        if s.len() != 8 {
            return None;
        }
        u8::from_str_radix(s, 2).ok().map(Self::from_bits_retain)
    }
}

/// Pad fields as read from a stream; `None` means "not present"
#[derive(Debug, Clone, Copy, Default)]
pub struct PadFields {
    pub index: Option<u8>,
    pub buttons: Option<PadButtons>,
    pub axes: [Option<u8>; 6],
}

impl PadFields {
    /// Collect the fields a mask says must be emitted
    pub fn present(mask: FieldMask, index: u8, status: &PadStatus) -> Self {
        let mut fields = PadFields::default();
        if mask.contains(FieldMask::INDEX) {
            fields.index = Some(index);
        }
        if mask.contains(FieldMask::BUTTONS) {
            fields.buttons = Some(status.buttons);
        }
        for ((slot, value), bit) in fields.axes.iter_mut().zip(status.axes()).zip(FieldMask::AXES)
        {
            if mask.contains(bit) {
                *slot = Some(value);
            }
        }
        fields
    }

    /// Rebuild the record: neutral defaults first, then every field the mask
    /// declares. A declared field that is missing is an error.
    pub fn resolve(&self, mask: FieldMask) -> Result<(u8, PadStatus), &'static str> {
        let index = if mask.contains(FieldMask::INDEX) {
            self.index.ok_or("mask declares padNumber but it is missing")?
        } else {
            0
        };

        let mut status = PadStatus::NEUTRAL;
        if mask.contains(FieldMask::BUTTONS) {
            status.buttons = self.buttons.ok_or("mask declares buttons but they are missing")?;
        }
        for ((slot, value), bit) in status
            .axes_mut()
            .into_iter()
            .zip(self.axes)
            .zip(FieldMask::AXES)
        {
            if mask.contains(bit) {
                *slot = value.ok_or("mask declares an axis that is missing")?;
            }
        }
        Ok((index, status))
    }
}
