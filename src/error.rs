//! Error taxonomy of the joystick core

use crate::controller::SystemPlatform;
use crate::port::{InputKind, PortError};
use crate::state::AxisRangeError;
use thiserror::Error;

/// Caller-chosen logical joystick id; it doubles as the device index on the port
pub type JoystickId = u32;

/// Errors returned by the registry, the selector and the drivers
///
/// Nothing in the core recovers from these locally. The service boundary
/// decides how to present them.
#[derive(Debug, Error)]
pub enum JoystickError {
    /// Operation on an id that was never created or was already removed
    #[error("Joystick {id} not initialized")]
    UnknownId { id: JoystickId },

    /// Create on an id that is already active
    #[error("Joystick {id} is already initialized")]
    DuplicateId { id: JoystickId },

    #[error("Controller {controller_type} not supported")]
    UnsupportedControllerType { controller_type: String },

    #[error("Unknown platform {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("Controller {controller_type} has no implementation for platform {platform}")]
    UnsupportedPlatformForController {
        controller_type: String,
        platform: SystemPlatform,
    },

    /// The device handle is disposed, revoked or the device is gone
    #[error("Device {device} unavailable: {source}")]
    DeviceUnavailable {
        device: usize,
        #[source]
        source: PortError,
    },

    /// The input backend could not be queried at all
    #[error("Input backend error: {0}")]
    InputBackend(#[source] PortError),

    /// A decoded axis broke the state model's range invariant
    #[error("Invalid axis value: {0}")]
    InvalidAxisValue(#[from] AxisRangeError),

    /// The mapping table references an input the device does not expose
    #[error("Device {device} has no {kind} {index} required by its mapping")]
    MissingInput {
        device: usize,
        kind: InputKind,
        index: usize,
    },

    /// A blocking worker running a registry call failed
    #[error("Worker error: {0}")]
    Worker(String),
}
