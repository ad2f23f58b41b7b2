//! Game controller normalization and lifecycle layer
//!
//! Reads raw controller input through a [`port::RawInputPort`], decodes it with
//! a per-platform driver table and hands out validated
//! [`state::ControllerState`] snapshots. A [`registry::JoystickRegistry`] keeps
//! track of which device is bound to which logical joystick id.
//!
//! ```text
//! JoystickRegistry ──► PlatformJoystickDriver ──► RawInputPort
//!        │                      │
//!        └──── ControllerState ◄┘
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod port;
pub mod registry;
pub mod state;

pub use controller::{ControllerType, DriverSettings, PlatformJoystickDriver, SystemPlatform};
pub use error::{JoystickError, JoystickId};
pub use registry::{JoystickDetails, JoystickRegistry, JoystickService};
pub use state::ControllerState;
