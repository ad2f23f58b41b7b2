//! Xbox wireless controller tables
//!
//! The same pad enumerates differently per host driver stack:
//!
//! | platform | axes                         | d-pad        |
//! |----------|------------------------------|--------------|
//! | Windows  | LX LY RX RY LT RT            | hat 0        |
//! | Linux    | LX LY LT RX RY RT            | hat 0        |
//! | macOS    | LX LY RX RY LT RT (Y up)     | buttons 11-14|

use super::driver::{AxisLayout, AxisSlot, DPadSource, PadDriver, PadLayout};
use crate::error::JoystickError;
use crate::state::{ControllerButtonPressedState, ControllerState, XboxButton};

pub type XboxDriver = PadDriver<XboxButton>;

pub static WINDOWS: PadLayout<XboxButton> = PadLayout {
    axes: AxisLayout {
        left_x: AxisSlot::direct(0),
        left_y: AxisSlot::direct(1),
        right_x: AxisSlot::direct(2),
        right_y: AxisSlot::direct(3),
        left_trigger: AxisSlot::direct(4),
        right_trigger: AxisSlot::direct(5),
    },
    // XInput does not expose the guide button
    buttons: &[
        (0, XboxButton::A),
        (1, XboxButton::B),
        (2, XboxButton::X),
        (3, XboxButton::Y),
        (4, XboxButton::LeftBumper),
        (5, XboxButton::RightBumper),
        (6, XboxButton::View),
        (7, XboxButton::Menu),
        (8, XboxButton::LeftStick),
        (9, XboxButton::RightStick),
    ],
    d_pad: DPadSource::Hat(0),
};

pub static LINUX: PadLayout<XboxButton> = PadLayout {
    axes: AxisLayout {
        left_x: AxisSlot::direct(0),
        left_y: AxisSlot::direct(1),
        right_x: AxisSlot::direct(3),
        right_y: AxisSlot::direct(4),
        left_trigger: AxisSlot::direct(2),
        right_trigger: AxisSlot::direct(5),
    },
    buttons: &[
        (0, XboxButton::A),
        (1, XboxButton::B),
        (2, XboxButton::X),
        (3, XboxButton::Y),
        (4, XboxButton::LeftBumper),
        (5, XboxButton::RightBumper),
        (6, XboxButton::View),
        (7, XboxButton::Menu),
        (8, XboxButton::Guide),
        (9, XboxButton::LeftStick),
        (10, XboxButton::RightStick),
    ],
    d_pad: DPadSource::Hat(0),
};

pub static MACOS: PadLayout<XboxButton> = PadLayout {
    axes: AxisLayout {
        left_x: AxisSlot::direct(0),
        left_y: AxisSlot::inverted(1),
        right_x: AxisSlot::direct(2),
        right_y: AxisSlot::inverted(3),
        left_trigger: AxisSlot::direct(4),
        right_trigger: AxisSlot::direct(5),
    },
    buttons: &[
        (0, XboxButton::A),
        (1, XboxButton::B),
        (2, XboxButton::X),
        (3, XboxButton::Y),
        (4, XboxButton::View),
        (5, XboxButton::Guide),
        (6, XboxButton::Menu),
        (7, XboxButton::LeftStick),
        (8, XboxButton::RightStick),
        (9, XboxButton::LeftBumper),
        (10, XboxButton::RightBumper),
    ],
    d_pad: DPadSource::Buttons {
        up: 11,
        down: 12,
        left: 13,
        right: 14,
    },
};

impl PadDriver<XboxButton> {
    pub fn get_state(&self) -> Result<ControllerState, JoystickError> {
        let (axes, buttons, d_pad) = self.poll()?;
        Ok(ControllerState::new(
            axes,
            ControllerButtonPressedState::Xbox(buttons),
            d_pad,
        )?)
    }
}
