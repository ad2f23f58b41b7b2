//! Controller subsystem: platform drivers and their selection
//!
//! 1. [`platform`] - host platform detection
//! 2. [`selector`] - `(controller type, platform)` → driver resolution
//! 3. [`driver`] - device binding and table-driven decoding
//! 4. [`xbox`], [`dualshock`] - per-model mapping tables
//!
//! # Architecture
//!
//! ```text
//! controller type + platform ──► Selector ──► PlatformJoystickDriver ──► ControllerState
//!                                              (owns one DeviceHandle)
//! ```

pub mod driver;
pub mod dualshock;
pub mod platform;
pub mod selector;
pub mod xbox;

pub use driver::{DriverSettings, PlatformJoystickDriver};
pub use platform::SystemPlatform;
pub use selector::{compatible_types, resolve, select, ControllerType, DriverKind};
