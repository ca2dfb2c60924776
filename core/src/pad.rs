//! Peripheral state types
//!
//! Plain values that travel between the host's input path, the movie
//! backends and the scripting bridge. Every consumer compares against the
//! same [`PadStatus::NEUTRAL`] table.

use serde::{Deserialize, Serialize};

/// Number of primary controller slots
pub const MAX_PADS: usize = 4;

/// Number of motion controller slots
pub const MAX_MOTION: usize = 4;

/// Rest value of every analog stick axis
pub const STICK_CENTER: u8 = 0x80;

/// Rest value of both analog triggers
pub const TRIGGER_REST: u8 = 0;

/// Ordered button-name table, indexed by bit position
pub const BUTTON_NAMES: [&str; 16] = [
    "LEFT", "RIGHT", "DOWN", "UP", "Z", "R", "L", "UNK1", "A", "B", "X", "Y", "START", "UNK2",
    "UNK3", "UNK4",
];

bitflags::bitflags! {
    /// Digital button state of a primary controller
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PadButtons: u16 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const DOWN = 1 << 2;
        const UP = 1 << 3;
        const Z = 1 << 4;
        const R = 1 << 5;
        const L = 1 << 6;
        const A = 1 << 8;
        const B = 1 << 9;
        const X = 1 << 10;
        const Y = 1 << 11;
        const START = 1 << 12;

        // Bits 7 and 13-15 are not wired to anything but still round-trip.
        const _ = !0;
    }
}

impl PadButtons {
    /// Space-separated symbolic names for the set bits, in table order
    pub fn to_names(self) -> String {
        let mut out = String::new();
        for (bit, name) in BUTTON_NAMES.iter().enumerate() {
            if self.bits() & (1 << bit) != 0 {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(name);
            }
        }
        out
    }

    /// Parse a space-separated name list; unknown names are ignored
    pub fn from_names(names: &str) -> Self {
        let mut bits = 0u16;
        for token in names.split_whitespace() {
            if let Some(bit) = BUTTON_NAMES.iter().position(|name| *name == token) {
                bits |= 1 << bit;
            }
        }
        Self::from_bits_retain(bits)
    }
}

impl Serialize for PadButtons {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PadButtons {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(PadButtons::from_bits_retain(u16::deserialize(deserializer)?))
    }
}

/// State of one primary controller for one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PadStatus {
    /// Button bitmask
    pub buttons: PadButtons,
    /// Main stick X (0-255, rest at [`STICK_CENTER`])
    pub stick_x: u8,
    /// Main stick Y (0-255, rest at [`STICK_CENTER`])
    pub stick_y: u8,
    /// C-stick X (0-255, rest at [`STICK_CENTER`])
    pub c_stick_x: u8,
    /// C-stick Y (0-255, rest at [`STICK_CENTER`])
    pub c_stick_y: u8,
    /// Left trigger pressure (0-255)
    pub trigger_l: u8,
    /// Right trigger pressure (0-255)
    pub trigger_r: u8,
}

impl PadStatus {
    /// The rest state: nothing pressed, sticks centered, triggers released
    pub const NEUTRAL: PadStatus = PadStatus {
        buttons: PadButtons::empty(),
        stick_x: STICK_CENTER,
        stick_y: STICK_CENTER,
        c_stick_x: STICK_CENTER,
        c_stick_y: STICK_CENTER,
        trigger_l: TRIGGER_REST,
        trigger_r: TRIGGER_REST,
    };

    /// Whether this state equals the rest state
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// Neutral state with the given buttons pressed
    pub fn with_buttons(buttons: PadButtons) -> Self {
        Self {
            buttons,
            ..Self::NEUTRAL
        }
    }

    /// Analog axes in codec order: stick X/Y, C-stick X/Y, trigger L/R
    pub fn axes(&self) -> [u8; 6] {
        [
            self.stick_x,
            self.stick_y,
            self.c_stick_x,
            self.c_stick_y,
            self.trigger_l,
            self.trigger_r,
        ]
    }

    /// Mutable access to the axes in codec order
    pub fn axes_mut(&mut self) -> [&mut u8; 6] {
        [
            &mut self.stick_x,
            &mut self.stick_y,
            &mut self.c_stick_x,
            &mut self.c_stick_y,
            &mut self.trigger_l,
            &mut self.trigger_r,
        ]
    }
}

impl Default for PadStatus {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Raw report of a motion controller
///
/// The layout is owned by the emulated device; the movie layer only stores
/// and compares bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MotionReport(pub Vec<u8>);

impl MotionReport {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Empty and all-zero reports carry no input
    pub fn is_neutral(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

bitflags::bitflags! {
    /// Enabled peripheral slots: bits 0-3 primary pads, bits 4-7 motion controllers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PeripheralMask: u8 {
        const PAD_1 = 1 << 0;
        const PAD_2 = 1 << 1;
        const PAD_3 = 1 << 2;
        const PAD_4 = 1 << 3;
        const MOTION_1 = 1 << 4;
        const MOTION_2 = 1 << 5;
        const MOTION_3 = 1 << 6;
        const MOTION_4 = 1 << 7;

        const PADS = 0x0F;
        const MOTION = 0xF0;
    }
}

impl PeripheralMask {
    /// Mask bit for a primary pad slot
    pub fn pad(index: usize) -> Self {
        if index < MAX_PADS {
            Self::from_bits_truncate(1 << index)
        } else {
            Self::empty()
        }
    }

    /// Mask bit for a motion controller slot
    pub fn motion(index: usize) -> Self {
        if index < MAX_MOTION {
            Self::from_bits_truncate(1 << (index + MAX_PADS))
        } else {
            Self::empty()
        }
    }

    pub fn uses_pad(self, index: usize) -> bool {
        let bit = Self::pad(index);
        !bit.is_empty() && self.contains(bit)
    }

    pub fn uses_motion(self, index: usize) -> bool {
        let bit = Self::motion(index);
        !bit.is_empty() && self.contains(bit)
    }
}

/// Peripheral class of a wired slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralSlot {
    /// Primary controller port
    Pad(usize),
    /// Motion controller port
    Motion(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_is_default() {
        let pad = PadStatus::default();
        assert!(pad.is_neutral());
        assert_eq!(pad.stick_x, 0x80);
        assert_eq!(pad.c_stick_y, 0x80);
        assert_eq!(pad.trigger_l, 0);
    }

    #[test]
    fn test_any_axis_breaks_neutral() {
        for axis in 0..6 {
            let mut pad = PadStatus::NEUTRAL;
            *pad.axes_mut()[axis] = 1;
            assert!(!pad.is_neutral(), "axis {axis} should break neutrality");
        }
    }

    #[test]
    fn test_button_names() {
        let buttons = PadButtons::A | PadButtons::LEFT | PadButtons::START;
        assert_eq!(buttons.to_names(), "LEFT A START");
        assert_eq!(PadButtons::from_names("LEFT A START"), buttons);
        assert_eq!(PadButtons::from_names(""), PadButtons::empty());
    }

    #[test]
    fn test_unknown_bits_survive_names() {
        let buttons = PadButtons::from_bits_retain(0x8080);
        assert_eq!(buttons.to_names(), "UNK1 UNK4");
        assert_eq!(PadButtons::from_names("UNK1 UNK4").bits(), 0x8080);
    }

    #[test]
    fn test_names_ignore_garbage() {
        assert_eq!(PadButtons::from_names("A  FOO   B"), PadButtons::A | PadButtons::B);
    }

    #[test]
    fn test_motion_neutral() {
        assert!(MotionReport::default().is_neutral());
        assert!(MotionReport::new(vec![0, 0, 0]).is_neutral());
        assert!(!MotionReport::new(vec![0, 4]).is_neutral());
    }

    #[test]
    fn test_peripheral_mask_slots() {
        let mask = PeripheralMask::PAD_1 | PeripheralMask::MOTION_2;
        assert!(mask.uses_pad(0));
        assert!(!mask.uses_pad(1));
        assert!(mask.uses_motion(1));
        assert!(!mask.uses_motion(0));
        assert!(!mask.uses_pad(9));
        assert_eq!(PeripheralMask::motion(3), PeripheralMask::MOTION_4);
    }
}
