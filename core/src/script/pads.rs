//! Two-layer controller buffers driven by scripts
//!
//! `pressed` lasts for one poll; `held` lasts until released. Each poll
//! merges the two and clears `pressed`.

use crate::pad::{MAX_PADS, PadButtons, PadStatus, STICK_CENTER};

/// Convert a signed script offset to an axis value around the rest center
pub fn axis_from_offset(offset: i64) -> u8 {
    (i64::from(STICK_CENTER) + offset.clamp(-128, 127)) as u8
}

/// Clamp a script trigger pressure to the valid range
pub fn trigger_from_pressure(pressure: i64) -> u8 {
    pressure.clamp(0, 255) as u8
}

/// Which buffer a script write targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Pressed,
    Held,
}

/// Buffers of one scripted pad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptPad {
    pub pressed: PadStatus,
    pub held: PadStatus,
}

impl Default for ScriptPad {
    fn default() -> Self {
        Self {
            pressed: PadStatus::NEUTRAL,
            held: PadStatus::NEUTRAL,
        }
    }
}

impl ScriptPad {
    fn layer_mut(&mut self, layer: Layer) -> &mut PadStatus {
        match layer {
            Layer::Pressed => &mut self.pressed,
            Layer::Held => &mut self.held,
        }
    }

    pub fn press(&mut self, buttons: PadButtons) {
        self.pressed.buttons |= buttons;
    }

    pub fn hold(&mut self, buttons: PadButtons) {
        self.held.buttons |= buttons;
    }

    /// Release from both layers
    pub fn release(&mut self, buttons: PadButtons) {
        self.pressed.buttons.remove(buttons);
        self.held.buttons.remove(buttons);
    }

    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    /// Pressed on the next poll, by either layer
    pub fn is_pressed(&self, buttons: PadButtons) -> bool {
        (self.pressed.buttons | self.held.buttons).contains(buttons)
    }

    pub fn is_held(&self, buttons: PadButtons) -> bool {
        self.held.buttons.contains(buttons)
    }

    pub fn set_stick(&mut self, layer: Layer, x: i64, y: i64) {
        let status = self.layer_mut(layer);
        status.stick_x = axis_from_offset(x);
        status.stick_y = axis_from_offset(y);
    }

    pub fn set_c_stick(&mut self, layer: Layer, x: i64, y: i64) {
        let status = self.layer_mut(layer);
        status.c_stick_x = axis_from_offset(x);
        status.c_stick_y = axis_from_offset(y);
    }

    pub fn set_triggers(&mut self, layer: Layer, left: i64, right: i64) {
        let status = self.layer_mut(layer);
        status.trigger_l = trigger_from_pressure(left);
        status.trigger_r = trigger_from_pressure(right);
    }

    /// State delivered to the poll; clears the pressed layer.
    ///
    /// Buttons are the union of both layers. An axis takes the held value
    /// when the held layer moved it off rest.
    pub fn take_frame(&mut self) -> PadStatus {
        let mut merged = self.pressed;
        merged.buttons |= self.held.buttons;

        let rest = PadStatus::NEUTRAL.axes();
        for ((slot, held), rest) in merged.axes_mut().into_iter().zip(self.held.axes()).zip(rest) {
            if held != rest {
                *slot = held;
            }
        }

        self.pressed = PadStatus::NEUTRAL;
        merged
    }
}

/// Buffers for every pad slot
pub type ScriptPads = [ScriptPad; MAX_PADS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_lasts_one_poll() {
        let mut pad = ScriptPad::default();
        pad.press(PadButtons::A);
        assert_eq!(pad.take_frame().buttons, PadButtons::A);
        assert!(pad.take_frame().is_neutral());
    }

    #[test]
    fn test_hold_persists_until_release() {
        let mut pad = ScriptPad::default();
        pad.hold(PadButtons::B);
        pad.press(PadButtons::X);

        assert_eq!(pad.take_frame().buttons, PadButtons::B | PadButtons::X);
        assert_eq!(pad.take_frame().buttons, PadButtons::B);
        assert!(pad.is_held(PadButtons::B));

        pad.release(PadButtons::B);
        assert!(pad.take_frame().is_neutral());
    }

    #[test]
    fn test_held_axis_wins() {
        let mut pad = ScriptPad::default();
        pad.set_stick(Layer::Held, -128, 0);
        pad.set_stick(Layer::Pressed, 10, 20);

        let frame = pad.take_frame();
        assert_eq!(frame.stick_x, 0);
        assert_eq!(frame.stick_y, 0x80 + 20);

        let frame = pad.take_frame();
        assert_eq!(frame.stick_x, 0);
        assert_eq!(frame.stick_y, 0x80);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(axis_from_offset(1000), 0xFF);
        assert_eq!(axis_from_offset(-1000), 0x00);
        assert_eq!(axis_from_offset(0), 0x80);
        assert_eq!(trigger_from_pressure(-5), 0);
        assert_eq!(trigger_from_pressure(300), 255);
    }

    #[test]
    fn test_release_all() {
        let mut pad = ScriptPad::default();
        pad.hold(PadButtons::A);
        pad.set_triggers(Layer::Held, 255, 40);
        pad.press(PadButtons::START);
        pad.release_all();
        assert!(pad.take_frame().is_neutral());
    }
}
