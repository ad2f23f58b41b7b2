//! Platform joystick drivers
//!
//! A driver binds one open device handle to a static mapping table. The table
//! is chosen once, when the driver is created, and every poll decodes the raw
//! frame through it:
//!
//! ```text
//! RawInputPort ──pump + read_frame──► RawFrame ──PadLayout──► ControllerState
//! ```

use super::dualshock::DualShock4Driver;
use super::platform::SystemPlatform;
use super::selector::ControllerType;
use super::xbox::XboxDriver;
use crate::error::JoystickError;
use crate::port::{DeviceHandle, InputKind, PortError, RawFrame, RawInputPort};
use crate::state::{
    ControllerAxesState, ControllerDPadState, ControllerState, PadButton, PressedButtons,
    StickState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Tuning shared by every driver
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct DriverSettings {
    /// Analog trigger value above which the trigger also counts as a pressed button
    pub trigger_press_threshold: f32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            trigger_press_threshold: 0.0, // half travel
        }
    }
}

/// One raw axis slot and whether its sign must be flipped to reach the
/// right/down-positive convention
#[derive(Debug, Clone, Copy)]
pub struct AxisSlot {
    pub index: usize,
    pub invert: bool,
}

impl AxisSlot {
    pub const fn direct(index: usize) -> Self {
        Self {
            index,
            invert: false,
        }
    }

    pub const fn inverted(index: usize) -> Self {
        Self {
            index,
            invert: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AxisLayout {
    pub left_x: AxisSlot,
    pub left_y: AxisSlot,
    pub right_x: AxisSlot,
    pub right_y: AxisSlot,
    pub left_trigger: AxisSlot,
    pub right_trigger: AxisSlot,
}

/// How a platform reports the directional pad
#[derive(Debug, Clone, Copy)]
pub enum DPadSource {
    Hat(usize),
    Buttons {
        up: usize,
        down: usize,
        left: usize,
        right: usize,
    },
}

/// Complete raw-to-canonical mapping table for one controller model on one platform
#[derive(Debug)]
pub struct PadLayout<B: 'static> {
    pub axes: AxisLayout,
    pub buttons: &'static [(usize, B)],
    pub d_pad: DPadSource,
}

/// Owns one open device handle and releases it exactly once
pub struct DeviceBinding {
    port: Arc<dyn RawInputPort>,
    index: usize,
    handle: Option<DeviceHandle>,
}

impl DeviceBinding {
    pub fn open(port: Arc<dyn RawInputPort>, index: usize) -> Result<Self, JoystickError> {
        let handle = port
            .open(index)
            .map_err(|source| JoystickError::DeviceUnavailable {
                device: index,
                source,
            })?;
        info!("Opened device {} with handle {}", index, handle);
        Ok(Self {
            port,
            index,
            handle: Some(handle),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Pumps pending events and reads a fresh frame
    pub fn frame(&self) -> Result<RawFrame, JoystickError> {
        let handle = self.handle.ok_or(JoystickError::DeviceUnavailable {
            device: self.index,
            source: PortError::NotOpen(self.index),
        })?;
        self.port.pump_events();
        self.port
            .read_frame(handle)
            .map_err(|source| JoystickError::DeviceUnavailable {
                device: self.index,
                source,
            })
    }

    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.port.close(handle);
            info!("Released device {} (handle {})", self.index, handle);
        } else {
            debug!("Device {} already released", self.index);
        }
    }
}

impl Drop for DeviceBinding {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.dispose();
        }
    }
}

/// Generic table-driven decoder used by every controller model
pub struct PadDriver<B: PadButton> {
    layout: &'static PadLayout<B>,
    binding: DeviceBinding,
    settings: DriverSettings,
}

impl<B: PadButton> PadDriver<B> {
    pub fn new(
        layout: &'static PadLayout<B>,
        binding: DeviceBinding,
        settings: DriverSettings,
    ) -> Self {
        Self {
            layout,
            binding,
            settings,
        }
    }

    pub fn binding(&self) -> &DeviceBinding {
        &self.binding
    }

    /// Reads a frame and decodes it into unvalidated parts
    pub fn poll(
        &self,
    ) -> Result<(ControllerAxesState, PressedButtons<B>, ControllerDPadState), JoystickError> {
        let frame = self.binding.frame()?;
        decode(self.layout, &frame, self.binding.index(), &self.settings)
    }

    pub fn dispose(&mut self) {
        self.binding.dispose();
    }
}

pub(crate) fn decode<B: PadButton>(
    layout: &PadLayout<B>,
    frame: &RawFrame,
    device: usize,
    settings: &DriverSettings,
) -> Result<(ControllerAxesState, PressedButtons<B>, ControllerDPadState), JoystickError> {
    let axes = decode_axes(&layout.axes, frame, device)?;
    let d_pad = decode_d_pad(layout.d_pad, frame, device)?;

    let mut buttons = PressedButtons::default();
    for (index, button) in layout.buttons {
        if read_button(frame, *index, device)? {
            buttons.press(*button);
        }
    }
    if axes.left_analog_trigger > settings.trigger_press_threshold {
        buttons.press(B::LEFT_TRIGGER);
    }
    if axes.right_analog_trigger > settings.trigger_press_threshold {
        buttons.press(B::RIGHT_TRIGGER);
    }
    if d_pad.vertical_up > 0 {
        buttons.press(B::D_PAD_UP);
    }
    if d_pad.vertical_up < 0 {
        buttons.press(B::D_PAD_DOWN);
    }
    if d_pad.horizontal_right < 0 {
        buttons.press(B::D_PAD_LEFT);
    }
    if d_pad.horizontal_right > 0 {
        buttons.press(B::D_PAD_RIGHT);
    }

    Ok((axes, buttons, d_pad))
}

fn missing(device: usize, kind: InputKind, index: usize) -> JoystickError {
    JoystickError::MissingInput {
        device,
        kind,
        index,
    }
}

fn read_axis(frame: &RawFrame, slot: AxisSlot, device: usize) -> Result<f32, JoystickError> {
    let value = frame
        .axes
        .get(slot.index)
        .copied()
        .ok_or_else(|| missing(device, InputKind::Axis, slot.index))?;
    Ok(if slot.invert { -value } else { value })
}

fn read_button(frame: &RawFrame, index: usize, device: usize) -> Result<bool, JoystickError> {
    frame
        .buttons
        .get(index)
        .copied()
        .ok_or_else(|| missing(device, InputKind::Button, index))
}

fn decode_axes(
    layout: &AxisLayout,
    frame: &RawFrame,
    device: usize,
) -> Result<ControllerAxesState, JoystickError> {
    Ok(ControllerAxesState {
        left_stick: StickState::new(
            read_axis(frame, layout.left_x, device)?,
            read_axis(frame, layout.left_y, device)?,
        ),
        right_stick: StickState::new(
            read_axis(frame, layout.right_x, device)?,
            read_axis(frame, layout.right_y, device)?,
        ),
        left_analog_trigger: read_axis(frame, layout.left_trigger, device)?,
        right_analog_trigger: read_axis(frame, layout.right_trigger, device)?,
    })
}

fn decode_d_pad(
    source: DPadSource,
    frame: &RawFrame,
    device: usize,
) -> Result<ControllerDPadState, JoystickError> {
    match source {
        DPadSource::Hat(index) => {
            let (x, y) = frame
                .hats
                .get(index)
                .copied()
                .ok_or_else(|| missing(device, InputKind::Hat, index))?;
            Ok(ControllerDPadState::new(x, y))
        }
        DPadSource::Buttons {
            up,
            down,
            left,
            right,
        } => {
            let held = |index| read_button(frame, index, device).map(i8::from);
            Ok(ControllerDPadState::new(
                held(right)? - held(left)?,
                held(up)? - held(down)?,
            ))
        }
    }
}

/// Live driver, tagged by controller model and platform
///
/// The variant is fixed at creation; polling never re-dispatches on a
/// platform string.
pub enum PlatformJoystickDriver {
    XboxWindows(XboxDriver),
    XboxLinux(XboxDriver),
    XboxMacOs(XboxDriver),
    DualShock4Linux(DualShock4Driver),
}

impl PlatformJoystickDriver {
    pub fn controller_type(&self) -> ControllerType {
        match self {
            PlatformJoystickDriver::XboxWindows(_)
            | PlatformJoystickDriver::XboxLinux(_)
            | PlatformJoystickDriver::XboxMacOs(_) => ControllerType::XboxController,
            PlatformJoystickDriver::DualShock4Linux(_) => ControllerType::DualShock4,
        }
    }

    pub fn platform(&self) -> SystemPlatform {
        match self {
            PlatformJoystickDriver::XboxWindows(_) => SystemPlatform::Windows,
            PlatformJoystickDriver::XboxLinux(_) | PlatformJoystickDriver::DualShock4Linux(_) => {
                SystemPlatform::Linux
            }
            PlatformJoystickDriver::XboxMacOs(_) => SystemPlatform::MacOs,
        }
    }

    fn binding(&self) -> &DeviceBinding {
        match self {
            PlatformJoystickDriver::XboxWindows(driver)
            | PlatformJoystickDriver::XboxLinux(driver)
            | PlatformJoystickDriver::XboxMacOs(driver) => driver.binding(),
            PlatformJoystickDriver::DualShock4Linux(driver) => driver.binding(),
        }
    }

    pub fn device_index(&self) -> usize {
        self.binding().index()
    }

    pub fn is_disposed(&self) -> bool {
        !self.binding().is_open()
    }

    /// Pumps input events and returns a freshly validated snapshot
    pub fn get_state(&self) -> Result<ControllerState, JoystickError> {
        match self {
            PlatformJoystickDriver::XboxWindows(driver)
            | PlatformJoystickDriver::XboxLinux(driver)
            | PlatformJoystickDriver::XboxMacOs(driver) => driver.get_state(),
            PlatformJoystickDriver::DualShock4Linux(driver) => driver.get_state(),
        }
    }

    /// Releases the device handle; calling it again is a no-op
    pub fn dispose(&mut self) {
        match self {
            PlatformJoystickDriver::XboxWindows(driver)
            | PlatformJoystickDriver::XboxLinux(driver)
            | PlatformJoystickDriver::XboxMacOs(driver) => driver.dispose(),
            PlatformJoystickDriver::DualShock4Linux(driver) => driver.dispose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::select;
    use crate::port::MemoryInputPort;

    fn xbox_linux_pad() -> (Arc<MemoryInputPort>, PlatformJoystickDriver) {
        let port = Arc::new(MemoryInputPort::new());
        let index = port.attach(
            "pad",
            RawFrame::new(vec![0.0, 0.0, -1.0, 0.0, 0.0, -1.0], vec![false; 11], vec![(0, 0)]),
        );
        let driver = select(
            "xbox_controller",
            Some("linux"),
            port.clone(),
            index,
            DriverSettings::default(),
        )
        .unwrap();
        (port, driver)
    }

    #[test]
    fn dispose_is_idempotent() {
        let (port, mut driver) = xbox_linux_pad();
        assert!(!driver.is_disposed());
        assert_eq!(driver.device_index(), 0);

        driver.dispose();
        driver.dispose();
        assert!(driver.is_disposed());
        assert_eq!(port.close_count(), 1);
        assert_eq!(port.open_handle_count(), 0);
    }

    #[test]
    fn get_state_after_dispose_is_unavailable() {
        let (port, mut driver) = xbox_linux_pad();
        assert!(driver.get_state().is_ok());
        let pumps = port.pump_count();

        driver.dispose();
        match driver.get_state() {
            Err(JoystickError::DeviceUnavailable { device, source }) => {
                assert_eq!(device, 0);
                assert_eq!(source, PortError::NotOpen(0));
            }
            other => panic!("expected DeviceUnavailable, got {:?}", other.map(|_| ())),
        }
        // a disposed driver never touches the port
        assert_eq!(port.pump_count(), pumps);
    }

    #[test]
    fn drop_releases_exactly_once() {
        let (port, mut driver) = xbox_linux_pad();
        driver.dispose();
        drop(driver);
        assert_eq!(port.close_count(), 1);

        let (port, driver) = xbox_linux_pad();
        drop(driver);
        assert_eq!(port.close_count(), 1);
        assert_eq!(port.open_handle_count(), 0);
    }

    #[test]
    fn driver_reports_its_model_and_platform() {
        let (_, driver) = xbox_linux_pad();
        assert_eq!(driver.controller_type(), ControllerType::XboxController);
        assert_eq!(driver.platform(), SystemPlatform::Linux);
    }
}
