//! Boundary over the physical device polling library
//!
//! Drivers never talk to a backend directly. They hold a shared
//! [`RawInputPort`] and one [`DeviceHandle`] obtained from it.
//!
//! ```text
//! enumerate_devices ──► open(index) ──► pump_events / read_* ──► close(handle)
//! ```
//!
//! Two ports are provided:
//! - [`gilrs_port::GilrsInputPort`] reads real gamepads through `gilrs`
//! - [`memory::MemoryInputPort`] holds virtual devices for tests and simulation

pub mod gilrs_port;
pub mod memory;

use serde::Serialize;
use std::fmt;

pub use gilrs_port::GilrsInputPort;
pub use memory::MemoryInputPort;

/// Which kind of raw input an index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Axis,
    Button,
    Hat,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Axis => write!(f, "axis"),
            InputKind::Button => write!(f, "button"),
            InputKind::Hat => write!(f, "hat"),
        }
    }
}

/// Opaque token for an opened device
///
/// Each `open` call produces a fresh serial, so a handle that was closed can
/// never alias a later handle for the same device index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    index: usize,
    serial: u64,
}

impl DeviceHandle {
    pub fn new(index: usize, serial: u64) -> Self {
        Self { index, serial }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.serial)
    }
}

/// Static description of a visible device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub index: usize,
    pub name: String,
    pub num_axes: usize,
    pub num_buttons: usize,
    pub num_hats: usize,
    pub num_balls: usize,
}

/// Every raw value of a device at one instant, in native index order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawFrame {
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
    /// `(x, y)` with `y` positive when pressed up
    pub hats: Vec<(i8, i8)>,
}

impl RawFrame {
    pub fn new(axes: Vec<f32>, buttons: Vec<bool>, hats: Vec<(i8, i8)>) -> Self {
        Self {
            axes,
            buttons,
            hats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("no device connected at index {0}")]
    NoSuchDevice(usize),

    #[error("device handle {0} is closed")]
    HandleClosed(DeviceHandle),

    #[error("device {0} is not open")]
    NotOpen(usize),

    #[error("device {0} was disconnected")]
    Disconnected(usize),

    #[error("{kind} {index} is not exposed by device {device}")]
    InputOutOfRange {
        device: usize,
        kind: InputKind,
        index: usize,
    },

    #[error("input backend error: {0}")]
    Backend(String),
}

/// Capability interface over a device polling library
///
/// Implementations synchronise internally; every method takes `&self` so one
/// port can be shared by all drivers.
pub trait RawInputPort: Send + Sync {
    fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, PortError>;

    fn open(&self, index: usize) -> Result<DeviceHandle, PortError>;

    /// Processes pending backend events. Must run before reading fresh values.
    fn pump_events(&self);

    fn describe(&self, handle: DeviceHandle) -> Result<DeviceDescriptor, PortError>;

    fn read_axis(&self, handle: DeviceHandle, axis: usize) -> Result<f32, PortError>;

    fn read_button(&self, handle: DeviceHandle, button: usize) -> Result<bool, PortError>;

    fn read_hat(&self, handle: DeviceHandle, hat: usize) -> Result<(i8, i8), PortError>;

    /// Releases the handle. Closing an unknown or closed handle does nothing.
    fn close(&self, handle: DeviceHandle);

    /// Reads every axis, button and hat the device exposes
    fn read_frame(&self, handle: DeviceHandle) -> Result<RawFrame, PortError> {
        let descriptor = self.describe(handle)?;
        let axes = (0..descriptor.num_axes)
            .map(|axis| self.read_axis(handle, axis))
            .collect::<Result<Vec<_>, _>>()?;
        let buttons = (0..descriptor.num_buttons)
            .map(|button| self.read_button(handle, button))
            .collect::<Result<Vec<_>, _>>()?;
        let hats = (0..descriptor.num_hats)
            .map(|hat| self.read_hat(handle, hat))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawFrame::new(axes, buttons, hats))
    }
}
