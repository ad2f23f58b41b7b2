//! Button vocabularies of the supported controller models
//!
//! The catalog of controller models is small and closed, so the pressed-button
//! state is a tagged variant instead of an open trait object.

use std::collections::BTreeSet;
use std::fmt;

/// Defines a button enum together with its wire names and the full vocabulary.
macro_rules! button_vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

button_vocabulary! {
    /// Xbox layout, including the triggers and the D-pad as buttons
    XboxButton {
        A => "a",
        B => "b",
        X => "x",
        Y => "y",
        LeftBumper => "left_bumper",
        RightBumper => "right_bumper",
        LeftTrigger => "left_trigger",
        RightTrigger => "right_trigger",
        LeftStick => "left_stick",
        RightStick => "right_stick",
        DPadUp => "d_pad_up",
        DPadDown => "d_pad_down",
        DPadLeft => "d_pad_left",
        DPadRight => "d_pad_right",
        View => "view",
        Menu => "menu",
        Guide => "guide",
    }
}

button_vocabulary! {
    /// DualShock 4 layout
    DualShock4Button {
        Cross => "cross",
        Circle => "circle",
        Square => "square",
        Triangle => "triangle",
        L1 => "l1",
        R1 => "r1",
        L2 => "l2",
        R2 => "r2",
        L3 => "l3",
        R3 => "r3",
        DPadUp => "d_pad_up",
        DPadDown => "d_pad_down",
        DPadLeft => "d_pad_left",
        DPadRight => "d_pad_right",
        Share => "share",
        Options => "options",
        Ps => "ps",
    }
}

/// Buttons every supported layout derives from analog or directional input
/// rather than reading them from a raw button slot.
pub trait PadButton: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    const LEFT_TRIGGER: Self;
    const RIGHT_TRIGGER: Self;
    const D_PAD_UP: Self;
    const D_PAD_DOWN: Self;
    const D_PAD_LEFT: Self;
    const D_PAD_RIGHT: Self;

    fn vocabulary() -> &'static [Self];
    fn name(self) -> &'static str;
}

impl PadButton for XboxButton {
    const LEFT_TRIGGER: Self = XboxButton::LeftTrigger;
    const RIGHT_TRIGGER: Self = XboxButton::RightTrigger;
    const D_PAD_UP: Self = XboxButton::DPadUp;
    const D_PAD_DOWN: Self = XboxButton::DPadDown;
    const D_PAD_LEFT: Self = XboxButton::DPadLeft;
    const D_PAD_RIGHT: Self = XboxButton::DPadRight;

    fn vocabulary() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

impl PadButton for DualShock4Button {
    const LEFT_TRIGGER: Self = DualShock4Button::L2;
    const RIGHT_TRIGGER: Self = DualShock4Button::R2;
    const D_PAD_UP: Self = DualShock4Button::DPadUp;
    const D_PAD_DOWN: Self = DualShock4Button::DPadDown;
    const D_PAD_LEFT: Self = DualShock4Button::DPadLeft;
    const D_PAD_RIGHT: Self = DualShock4Button::DPadRight;

    fn vocabulary() -> &'static [Self] {
        Self::ALL
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

/// Set of pressed buttons of one vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressedButtons<B: PadButton> {
    pressed: BTreeSet<B>,
}

impl<B: PadButton> Default for PressedButtons<B> {
    fn default() -> Self {
        Self {
            pressed: BTreeSet::new(),
        }
    }
}

impl<B: PadButton> PressedButtons<B> {
    pub fn press(&mut self, button: B) {
        self.pressed.insert(button);
    }

    pub fn is_pressed(&self, button: B) -> bool {
        self.pressed.contains(&button)
    }

    pub fn pressed(&self) -> impl Iterator<Item = B> + '_ {
        self.pressed.iter().copied()
    }

    /// Every button of the vocabulary with its pressed flag, in vocabulary order
    pub fn states(&self) -> Vec<(&'static str, bool)> {
        B::vocabulary()
            .iter()
            .map(|button| (button.name(), self.is_pressed(*button)))
            .collect()
    }
}

impl<B: PadButton> FromIterator<B> for PressedButtons<B> {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self {
            pressed: iter.into_iter().collect(),
        }
    }
}

/// Pressed-button state, tagged by controller model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerButtonPressedState {
    Xbox(PressedButtons<XboxButton>),
    DualShock4(PressedButtons<DualShock4Button>),
}

impl ControllerButtonPressedState {
    /// Names of the buttons that are currently held, in vocabulary order
    pub fn pressed_buttons(&self) -> Vec<&'static str> {
        self.states()
            .into_iter()
            .filter_map(|(name, pressed)| pressed.then_some(name))
            .collect()
    }

    pub fn states(&self) -> Vec<(&'static str, bool)> {
        match self {
            ControllerButtonPressedState::Xbox(buttons) => buttons.states(),
            ControllerButtonPressedState::DualShock4(buttons) => buttons.states(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_buttons_follow_vocabulary_order() {
        let buttons: PressedButtons<XboxButton> =
            [XboxButton::Guide, XboxButton::B, XboxButton::DPadUp]
                .into_iter()
                .collect();
        let state = ControllerButtonPressedState::Xbox(buttons);
        assert_eq!(state.pressed_buttons(), vec!["b", "d_pad_up", "guide"]);
    }

    #[test]
    fn vocabularies_have_unique_names() {
        let mut xbox: Vec<_> = XboxButton::ALL.iter().map(|b| b.as_str()).collect();
        xbox.sort_unstable();
        xbox.dedup();
        assert_eq!(xbox.len(), XboxButton::ALL.len());

        let mut ds4: Vec<_> = DualShock4Button::ALL.iter().map(|b| b.as_str()).collect();
        ds4.sort_unstable();
        ds4.dedup();
        assert_eq!(ds4.len(), DualShock4Button::ALL.len());
    }

    #[test]
    fn empty_state_lists_nothing() {
        let state = ControllerButtonPressedState::DualShock4(PressedButtons::default());
        assert!(state.pressed_buttons().is_empty());
        assert_eq!(state.states().len(), DualShock4Button::ALL.len());
    }
}
