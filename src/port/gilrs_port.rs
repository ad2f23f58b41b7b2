//! `gilrs` backed input port
//!
//! gilrs already normalises gamepads to a common button/axis vocabulary. This
//! port re-encodes that vocabulary into the host's native joystick order so the
//! host platform's driver table decodes it, the same way it would decode a raw
//! joystick reading.
//!
//! Device indices are gilrs gamepad ids.

use super::{DeviceDescriptor, DeviceHandle, InputKind, PortError, RawInputPort};
use gilrs::{Axis, Button, GamepadId, Gilrs};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

const SONY_VENDOR_ID: u16 = 0x054c;

/// Where one native axis slot takes its value from
#[derive(Debug, Clone, Copy)]
enum AxisSource {
    /// Stick axis scaled by a sign; gilrs reports sticks up-positive
    Stick(Axis, f32),
    /// Analog trigger reported by gilrs in `[0, 1]`, re-encoded to `[-1, 1]`
    Trigger(Button),
}

#[derive(Debug)]
struct NativeLayout {
    axes: &'static [AxisSource],
    buttons: &'static [Button],
    /// Whether the D-pad is reported as one hat (otherwise it only appears as buttons)
    d_pad_hat: bool,
}

#[cfg(target_os = "windows")]
static XBOX_LAYOUT: NativeLayout = NativeLayout {
    axes: &[
        AxisSource::Stick(Axis::LeftStickX, 1.0),
        AxisSource::Stick(Axis::LeftStickY, -1.0),
        AxisSource::Stick(Axis::RightStickX, 1.0),
        AxisSource::Stick(Axis::RightStickY, -1.0),
        AxisSource::Trigger(Button::LeftTrigger2),
        AxisSource::Trigger(Button::RightTrigger2),
    ],
    buttons: &[
        Button::South,
        Button::East,
        Button::West,
        Button::North,
        Button::LeftTrigger,
        Button::RightTrigger,
        Button::Select,
        Button::Start,
        Button::LeftThumb,
        Button::RightThumb,
    ],
    d_pad_hat: true,
};

#[cfg(target_os = "macos")]
static XBOX_LAYOUT: NativeLayout = NativeLayout {
    axes: &[
        AxisSource::Stick(Axis::LeftStickX, 1.0),
        AxisSource::Stick(Axis::LeftStickY, 1.0),
        AxisSource::Stick(Axis::RightStickX, 1.0),
        AxisSource::Stick(Axis::RightStickY, 1.0),
        AxisSource::Trigger(Button::LeftTrigger2),
        AxisSource::Trigger(Button::RightTrigger2),
    ],
    buttons: &[
        Button::South,
        Button::East,
        Button::West,
        Button::North,
        Button::Select,
        Button::Mode,
        Button::Start,
        Button::LeftThumb,
        Button::RightThumb,
        Button::LeftTrigger,
        Button::RightTrigger,
        Button::DPadUp,
        Button::DPadDown,
        Button::DPadLeft,
        Button::DPadRight,
    ],
    d_pad_hat: false,
};

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
static XBOX_LAYOUT: NativeLayout = NativeLayout {
    axes: &[
        AxisSource::Stick(Axis::LeftStickX, 1.0),
        AxisSource::Stick(Axis::LeftStickY, -1.0),
        AxisSource::Trigger(Button::LeftTrigger2),
        AxisSource::Stick(Axis::RightStickX, 1.0),
        AxisSource::Stick(Axis::RightStickY, -1.0),
        AxisSource::Trigger(Button::RightTrigger2),
    ],
    buttons: &[
        Button::South,
        Button::East,
        Button::West,
        Button::North,
        Button::LeftTrigger,
        Button::RightTrigger,
        Button::Select,
        Button::Start,
        Button::Mode,
        Button::LeftThumb,
        Button::RightThumb,
    ],
    d_pad_hat: true,
};

// hid-playstation ordering, used on Linux hosts only
static DUALSHOCK4_LAYOUT: NativeLayout = NativeLayout {
    axes: &[
        AxisSource::Stick(Axis::LeftStickX, 1.0),
        AxisSource::Stick(Axis::LeftStickY, -1.0),
        AxisSource::Trigger(Button::LeftTrigger2),
        AxisSource::Stick(Axis::RightStickX, 1.0),
        AxisSource::Stick(Axis::RightStickY, -1.0),
        AxisSource::Trigger(Button::RightTrigger2),
    ],
    buttons: &[
        Button::South,
        Button::East,
        Button::North,
        Button::West,
        Button::LeftTrigger,
        Button::RightTrigger,
        Button::LeftTrigger2,
        Button::RightTrigger2,
        Button::Select,
        Button::Start,
        Button::Mode,
        Button::LeftThumb,
        Button::RightThumb,
    ],
    d_pad_hat: true,
};

#[derive(Debug, Clone, Copy)]
struct OpenGamepad {
    id: GamepadId,
    layout: &'static NativeLayout,
}

struct GilrsState {
    gilrs: Gilrs,
    open: HashMap<DeviceHandle, OpenGamepad>,
    next_serial: u64,
}

impl GilrsState {
    fn find(&self, index: usize) -> Option<GamepadId> {
        self.gilrs
            .gamepads()
            .find(|(id, gamepad)| usize::from(*id) == index && gamepad.is_connected())
            .map(|(id, _)| id)
    }

    fn opened(&self, handle: DeviceHandle) -> Result<(gilrs::Gamepad<'_>, OpenGamepad), PortError> {
        let open = *self
            .open
            .get(&handle)
            .ok_or(PortError::HandleClosed(handle))?;
        let gamepad = self
            .gilrs
            .connected_gamepad(open.id)
            .ok_or(PortError::Disconnected(handle.index()))?;
        Ok((gamepad, open))
    }
}

/// Production input port over every gamepad gilrs can see
pub struct GilrsInputPort {
    state: Mutex<GilrsState>,
}

impl GilrsInputPort {
    pub fn new() -> Result<Self, PortError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(PortError::Backend(e.to_string()));
            }
        };
        Ok(Self {
            state: Mutex::new(GilrsState {
                gilrs,
                open: HashMap::new(),
                next_serial: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, GilrsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Sony pads get their own ordering only where a DualShock 4 table exists.
/// Elsewhere they are re-encoded like any other pad.
fn native_layout(vendor_id: Option<u16>) -> &'static NativeLayout {
    if cfg!(target_os = "linux") && vendor_id == Some(SONY_VENDOR_ID) {
        &DUALSHOCK4_LAYOUT
    } else {
        &XBOX_LAYOUT
    }
}

fn layout_for(gamepad: &gilrs::Gamepad<'_>) -> &'static NativeLayout {
    native_layout(gamepad.vendor_id())
}

fn describe(index: usize, gamepad: &gilrs::Gamepad<'_>) -> DeviceDescriptor {
    let layout = layout_for(gamepad);
    DeviceDescriptor {
        index,
        name: gamepad.name().to_string(),
        num_axes: layout.axes.len(),
        num_buttons: layout.buttons.len(),
        num_hats: usize::from(layout.d_pad_hat),
        num_balls: 0,
    }
}

fn pressed(gamepad: &gilrs::Gamepad<'_>, button: Button) -> i8 {
    i8::from(gamepad.is_pressed(button))
}

impl RawInputPort for GilrsInputPort {
    fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, PortError> {
        let state = self.lock();
        let devices: Vec<DeviceDescriptor> = state
            .gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| describe(usize::from(id), &gamepad))
            .collect();
        debug!("gilrs reports {} connected gamepads", devices.len());
        Ok(devices)
    }

    fn open(&self, index: usize) -> Result<DeviceHandle, PortError> {
        let mut state = self.lock();
        let id = state.find(index).ok_or(PortError::NoSuchDevice(index))?;
        let layout = match state.gilrs.connected_gamepad(id) {
            Some(gamepad) => {
                info!("Opening gamepad {} ({})", gamepad.name(), id);
                layout_for(&gamepad)
            }
            None => return Err(PortError::NoSuchDevice(index)),
        };
        state.next_serial += 1;
        let handle = DeviceHandle::new(index, state.next_serial);
        state.open.insert(handle, OpenGamepad { id, layout });
        Ok(handle)
    }

    fn pump_events(&self) {
        let mut state = self.lock();
        // next_event folds every pending event into gilrs' cached gamepad state
        while let Some(event) = state.gilrs.next_event() {
            match event.event {
                gilrs::EventType::Disconnected => {
                    warn!("Gamepad {} disconnected", event.id)
                }
                gilrs::EventType::Connected => info!("Gamepad {} connected", event.id),
                _ => {}
            }
        }
    }

    fn describe(&self, handle: DeviceHandle) -> Result<DeviceDescriptor, PortError> {
        let state = self.lock();
        let (gamepad, _) = state.opened(handle)?;
        Ok(describe(handle.index(), &gamepad))
    }

    fn read_axis(&self, handle: DeviceHandle, axis: usize) -> Result<f32, PortError> {
        let state = self.lock();
        let (gamepad, open) = state.opened(handle)?;
        let source = open.layout.axes.get(axis).ok_or(PortError::InputOutOfRange {
            device: handle.index(),
            kind: InputKind::Axis,
            index: axis,
        })?;
        let value = match *source {
            AxisSource::Stick(axis, sign) => gamepad.value(axis) * sign,
            AxisSource::Trigger(button) => {
                let travel = gamepad.button_data(button).map_or(0.0, |data| data.value());
                travel * 2.0 - 1.0
            }
        };
        Ok(value)
    }

    fn read_button(&self, handle: DeviceHandle, button: usize) -> Result<bool, PortError> {
        let state = self.lock();
        let (gamepad, open) = state.opened(handle)?;
        let button = open
            .layout
            .buttons
            .get(button)
            .ok_or(PortError::InputOutOfRange {
                device: handle.index(),
                kind: InputKind::Button,
                index: button,
            })?;
        Ok(gamepad.is_pressed(*button))
    }

    fn read_hat(&self, handle: DeviceHandle, hat: usize) -> Result<(i8, i8), PortError> {
        let state = self.lock();
        let (gamepad, open) = state.opened(handle)?;
        if !open.layout.d_pad_hat || hat != 0 {
            return Err(PortError::InputOutOfRange {
                device: handle.index(),
                kind: InputKind::Hat,
                index: hat,
            });
        }
        let x = pressed(&gamepad, Button::DPadRight) - pressed(&gamepad, Button::DPadLeft);
        let y = pressed(&gamepad, Button::DPadUp) - pressed(&gamepad, Button::DPadDown);
        Ok((x, y))
    }

    fn close(&self, handle: DeviceHandle) {
        let mut state = self.lock();
        if let Some(open) = state.open.remove(&handle) {
            info!("Released gamepad {} (handle {})", open.id, handle);
        }
    }
}
