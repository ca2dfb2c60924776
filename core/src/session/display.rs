//! Human-readable input display
//!
//! One line per enabled peripheral, e.g. `P1: A START R ANA:LEFT,200`.

use crate::pad::{MAX_MOTION, MAX_PADS, PadButtons, PadStatus, PeripheralMask, STICK_CENTER};

/// Button order used on screen
const DISPLAY_BUTTONS: [(PadButtons, &str); 10] = [
    (PadButtons::A, "A"),
    (PadButtons::B, "B"),
    (PadButtons::X, "X"),
    (PadButtons::Y, "Y"),
    (PadButtons::Z, "Z"),
    (PadButtons::START, "START"),
    (PadButtons::UP, "UP"),
    (PadButtons::DOWN, "DOWN"),
    (PadButtons::LEFT, "LEFT"),
    (PadButtons::RIGHT, "RIGHT"),
];

fn axis_value(value: u8, lowest: &str, highest: &str) -> String {
    match value {
        0 | 1 => lowest.to_string(),
        255 => highest.to_string(),
        v => v.to_string(),
    }
}

/// Two-axis control: named extremes, raw value otherwise, omitted at rest
fn analog_2d(x: u8, y: u8, prefix: &str) -> String {
    if x == STICK_CENTER && y == STICK_CENTER {
        return String::new();
    }
    let mut out = format!("{prefix}:");
    if x != STICK_CENTER {
        out.push_str(&axis_value(x, "LEFT", "RIGHT"));
    }
    if x != STICK_CENTER && y != STICK_CENTER {
        out.push(',');
    }
    if y != STICK_CENTER {
        out.push_str(&axis_value(y, "DOWN", "UP"));
    }
    out
}

/// Pressure control: bare name when fully pressed, omitted at rest
fn analog_1d(value: u8, prefix: &str) -> String {
    match value {
        0 => String::new(),
        255 => prefix.to_string(),
        v => format!("{prefix}:{v}"),
    }
}

/// Display line of one primary pad
pub fn pad_line(index: usize, status: &PadStatus) -> String {
    let mut line = format!("P{}:", index + 1);
    for (button, name) in DISPLAY_BUTTONS {
        if status.buttons.contains(button) {
            line.push(' ');
            line.push_str(name);
        }
    }
    for part in [
        analog_1d(status.trigger_l, "L"),
        analog_1d(status.trigger_r, "R"),
        analog_2d(status.stick_x, status.stick_y, "ANA"),
        analog_2d(status.c_stick_x, status.c_stick_y, "C"),
    ] {
        if !part.is_empty() {
            line.push(' ');
            line.push_str(&part);
        }
    }
    line
}

/// Display line of one motion controller
pub fn motion_line(index: usize, report: &[u8]) -> String {
    let mut line = format!("R{}:", index + 1);
    if !report.iter().all(|&b| b == 0) {
        line.push(' ');
        line.push_str(&hex::encode(report));
    }
    line
}

/// Last polled state of every slot, rendered on demand
#[derive(Debug, Clone, Default)]
pub struct InputDisplay {
    lines: [String; MAX_PADS + MAX_MOTION],
}

impl InputDisplay {
    pub fn clear(&mut self) {
        self.lines = Default::default();
    }

    pub fn set_pad(&mut self, index: usize, status: &PadStatus) {
        if index < MAX_PADS {
            self.lines[index] = pad_line(index, status);
        }
    }

    pub fn set_motion(&mut self, index: usize, report: &[u8]) {
        if index < MAX_MOTION {
            self.lines[MAX_PADS + index] = motion_line(index, report);
        }
    }

    /// Lines of the slots in `mask`, newline-terminated
    pub fn render(&self, mask: PeripheralMask) -> String {
        let mut out = String::new();
        for (slot, line) in self.lines.iter().enumerate() {
            if mask.bits() & (1 << slot) != 0 && !line.is_empty() {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_line() {
        assert_eq!(pad_line(0, &PadStatus::NEUTRAL), "P1:");
    }

    #[test]
    fn test_buttons_and_axes() {
        let status = PadStatus {
            buttons: PadButtons::START | PadButtons::A | PadButtons::LEFT,
            stick_x: 0,
            stick_y: 200,
            trigger_r: 255,
            trigger_l: 30,
            c_stick_y: 255,
            ..PadStatus::NEUTRAL
        };
        assert_eq!(
            pad_line(1, &status),
            "P2: A START LEFT L:30 R ANA:LEFT,200 C:UP"
        );
    }

    #[test]
    fn test_near_extremes() {
        assert_eq!(analog_2d(1, STICK_CENTER, "ANA"), "ANA:LEFT");
        assert_eq!(analog_2d(2, STICK_CENTER, "ANA"), "ANA:2");
        assert_eq!(analog_2d(STICK_CENTER, 0, "C"), "C:DOWN");
    }

    #[test]
    fn test_render_respects_mask() {
        let mut display = InputDisplay::default();
        display.set_pad(0, &PadStatus::with_buttons(PadButtons::B));
        display.set_pad(1, &PadStatus::NEUTRAL);
        display.set_motion(0, &[0, 0x12]);

        assert_eq!(display.render(PeripheralMask::PAD_1), "P1: B\n");
        assert_eq!(
            display.render(PeripheralMask::PADS | PeripheralMask::MOTION_1),
            "P1: B\nP2:\nR1: 0012\n"
        );
    }
}
