//! DualShock 4 table (Linux `hid-playstation` ordering)

use super::driver::{AxisLayout, AxisSlot, DPadSource, PadDriver, PadLayout};
use crate::error::JoystickError;
use crate::state::{ControllerButtonPressedState, ControllerState, DualShock4Button};

pub type DualShock4Driver = PadDriver<DualShock4Button>;

pub static LINUX: PadLayout<DualShock4Button> = PadLayout {
    axes: AxisLayout {
        left_x: AxisSlot::direct(0),
        left_y: AxisSlot::direct(1),
        right_x: AxisSlot::direct(3),
        right_y: AxisSlot::direct(4),
        left_trigger: AxisSlot::direct(2),
        right_trigger: AxisSlot::direct(5),
    },
    buttons: &[
        (0, DualShock4Button::Cross),
        (1, DualShock4Button::Circle),
        (2, DualShock4Button::Triangle),
        (3, DualShock4Button::Square),
        (4, DualShock4Button::L1),
        (5, DualShock4Button::R1),
        (6, DualShock4Button::L2),
        (7, DualShock4Button::R2),
        (8, DualShock4Button::Share),
        (9, DualShock4Button::Options),
        (10, DualShock4Button::Ps),
        (11, DualShock4Button::L3),
        (12, DualShock4Button::R3),
    ],
    d_pad: DPadSource::Hat(0),
};

impl PadDriver<DualShock4Button> {
    pub fn get_state(&self) -> Result<ControllerState, JoystickError> {
        let (axes, buttons, d_pad) = self.poll()?;
        Ok(ControllerState::new(
            axes,
            ControllerButtonPressedState::DualShock4(buttons),
            d_pad,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::driver::{decode, DriverSettings};
    use crate::port::RawFrame;

    #[test]
    fn digital_l2_counts_without_analog_travel() {
        let mut buttons = vec![false; 13];
        buttons[2] = true;
        buttons[6] = true;
        let frame = RawFrame::new(vec![0.0, 0.0, -1.0, 0.0, 0.0, -1.0], buttons, vec![(0, 1)]);
        let (_, pressed, d_pad) = decode(&LINUX, &frame, 0, &DriverSettings::default()).unwrap();

        let names: Vec<_> = pressed.pressed().map(|b| b.as_str()).collect();
        assert_eq!(names, vec!["triangle", "l2", "d_pad_up"]);
        assert_eq!(d_pad.vertical_up, 1);
    }
}
