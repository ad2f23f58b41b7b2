//! Canonical controller state model
//!
//! A [`ControllerState`] is the validated, platform-independent snapshot of one
//! controller's input. It is rebuilt on every poll and never mutated afterwards.
//!
//! ```text
//! ControllerState
//!   ├── axes:    ControllerAxesState   (floats, always within [-1.0, 1.0])
//!   ├── buttons: ControllerButtonPressedState (vocabulary per controller model)
//!   └── d_pad:   ControllerDPadState   (small signed integers)
//! ```

pub mod buttons;

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub use buttons::{
    ControllerButtonPressedState, DualShock4Button, PadButton, PressedButtons, XboxButton,
};

/// Lower bound of every analog axis
pub const AXIS_MIN_VAL: f32 = -1.0;
/// Upper bound of every analog axis
pub const AXIS_MAX_VAL: f32 = 1.0;

/// An axis value was outside `[AXIS_MIN_VAL, AXIS_MAX_VAL]` or not finite.
///
/// This always points at a faulty input backend or mapping table, so it is
/// reported instead of clamped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("value {value} for '{path}' is not in the range [{min}, {max}]")]
pub struct AxisRangeError {
    pub path: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

/// Position of one analog stick
///
/// Positive values mean right / down, negative values left / up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StickState {
    pub horizontal_right: f32,
    pub vertical_down: f32,
}

impl StickState {
    pub fn new(horizontal_right: f32, vertical_down: f32) -> Self {
        Self {
            horizontal_right,
            vertical_down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControllerAxesState {
    pub left_stick: StickState,
    pub right_stick: StickState,
    pub left_analog_trigger: f32,
    pub right_analog_trigger: f32,
}

impl Default for ControllerAxesState {
    /// Sticks centered, triggers released
    fn default() -> Self {
        Self {
            left_stick: StickState::default(),
            right_stick: StickState::default(),
            left_analog_trigger: AXIS_MIN_VAL,
            right_analog_trigger: AXIS_MIN_VAL,
        }
    }
}

impl ControllerAxesState {
    /// Every float field paired with its flattened path
    pub fn fields(&self) -> [(&'static str, f32); 6] {
        [
            (
                "axes.left_stick.horizontal_right",
                self.left_stick.horizontal_right,
            ),
            ("axes.left_stick.vertical_down", self.left_stick.vertical_down),
            (
                "axes.right_stick.horizontal_right",
                self.right_stick.horizontal_right,
            ),
            (
                "axes.right_stick.vertical_down",
                self.right_stick.vertical_down,
            ),
            ("axes.left_analog_trigger", self.left_analog_trigger),
            ("axes.right_analog_trigger", self.right_analog_trigger),
        ]
    }

    fn validate(&self) -> Result<(), AxisRangeError> {
        for (path, value) in self.fields() {
            validate_direction(path, value)?;
        }
        Ok(())
    }
}

/// Directional pad reading
///
/// `horizontal_right` is positive when pressed right, negative when pressed
/// left. `vertical_up` is positive when pressed up, negative when pressed down.
/// Zero means not pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ControllerDPadState {
    pub horizontal_right: i8,
    pub vertical_up: i8,
}

impl ControllerDPadState {
    pub fn new(horizontal_right: i8, vertical_up: i8) -> Self {
        Self {
            horizontal_right,
            vertical_up,
        }
    }

    /// Names of the D-pad axes that are currently engaged
    pub fn active(&self) -> Vec<&'static str> {
        let mut active = Vec::new();
        if self.horizontal_right != 0 {
            active.push("horizontal_right");
        }
        if self.vertical_up != 0 {
            active.push("vertical_up");
        }
        active
    }
}

/// One value of [`ControllerState::to_flat_map`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlatValue {
    Axis(f32),
    Direction(i8),
    Pressed(bool),
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatValue::Axis(v) => write!(f, "{:.4}", v),
            FlatValue::Direction(v) => write!(f, "{}", v),
            FlatValue::Pressed(v) => write!(f, "{}", v),
        }
    }
}

/// Validated snapshot of a single controller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerState {
    axes: ControllerAxesState,
    buttons: ControllerButtonPressedState,
    d_pad: ControllerDPadState,
}

impl ControllerState {
    /// Builds a snapshot, rejecting any axis outside `[-1.0, 1.0]`
    pub fn new(
        axes: ControllerAxesState,
        buttons: ControllerButtonPressedState,
        d_pad: ControllerDPadState,
    ) -> Result<Self, AxisRangeError> {
        axes.validate()?;
        Ok(Self {
            axes,
            buttons,
            d_pad,
        })
    }

    pub fn axes(&self) -> &ControllerAxesState {
        &self.axes
    }

    pub fn buttons(&self) -> &ControllerButtonPressedState {
        &self.buttons
    }

    pub fn d_pad(&self) -> &ControllerDPadState {
        &self.d_pad
    }

    /// Flattens the snapshot into dotted paths, e.g. `axes.left_stick.horizontal_right`.
    ///
    /// Every button of the controller's vocabulary is listed, pressed or not.
    pub fn to_flat_map(&self) -> BTreeMap<String, FlatValue> {
        let mut flat = BTreeMap::new();
        for (path, value) in self.axes.fields() {
            flat.insert(path.to_string(), FlatValue::Axis(value));
        }
        flat.insert(
            "d_pad.horizontal_right".to_string(),
            FlatValue::Direction(self.d_pad.horizontal_right),
        );
        flat.insert(
            "d_pad.vertical_up".to_string(),
            FlatValue::Direction(self.d_pad.vertical_up),
        );
        for (name, pressed) in self.buttons.states() {
            flat.insert(format!("buttons.{}", name), FlatValue::Pressed(pressed));
        }
        flat
    }

    /// One `path=value` pair per field, space separated, in path order
    pub fn to_flat_line(&self) -> String {
        self.to_flat_map()
            .iter()
            .map(|(path, value)| format!("{}={}", path, value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn validate_direction(path: &'static str, value: f32) -> Result<(), AxisRangeError> {
    if value.is_finite() && (AXIS_MIN_VAL..=AXIS_MAX_VAL).contains(&value) {
        Ok(())
    } else {
        Err(AxisRangeError {
            path,
            value,
            min: AXIS_MIN_VAL,
            max: AXIS_MAX_VAL,
        })
    }
}

impl Serialize for ControllerButtonPressedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let states = self.states();
        let mut map = serializer.serialize_map(Some(states.len()))?;
        for (name, pressed) in states {
            map.serialize_entry(name, &pressed)?;
        }
        map.end()
    }
}
