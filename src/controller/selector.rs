//! Controller driver selection
//!
//! Resolves a `(controller type, platform)` pair against a static driver table.
//! Adding a controller model means adding rows here; the registry never changes.

use super::driver::{DeviceBinding, DriverSettings, PadDriver, PlatformJoystickDriver};
use super::platform::SystemPlatform;
use super::{dualshock, xbox};
use crate::error::JoystickError;
use crate::port::RawInputPort;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Controller models with at least one driver table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControllerType {
    XboxController,
    DualShock4,
}

impl ControllerType {
    pub const ALL: [ControllerType; 2] = [ControllerType::XboxController, ControllerType::DualShock4];

    pub fn name(self) -> &'static str {
        match self {
            ControllerType::XboxController => "xbox_controller",
            ControllerType::DualShock4 => "dualshock4",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|controller| controller.name().eq_ignore_ascii_case(name))
    }

    /// Platforms that have a driver table for this model
    pub fn supported_platforms(self) -> Vec<SystemPlatform> {
        DRIVER_TABLE
            .iter()
            .filter(|(controller, _, _)| *controller == self)
            .map(|(_, platform, _)| *platform)
            .collect()
    }
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved driver implementation, not yet bound to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    XboxWindows,
    XboxLinux,
    XboxMacOs,
    DualShock4Linux,
}

static DRIVER_TABLE: &[(ControllerType, SystemPlatform, DriverKind)] = &[
    (
        ControllerType::XboxController,
        SystemPlatform::Windows,
        DriverKind::XboxWindows,
    ),
    (
        ControllerType::XboxController,
        SystemPlatform::Linux,
        DriverKind::XboxLinux,
    ),
    (
        ControllerType::XboxController,
        SystemPlatform::MacOs,
        DriverKind::XboxMacOs,
    ),
    (
        ControllerType::DualShock4,
        SystemPlatform::Linux,
        DriverKind::DualShock4Linux,
    ),
];

impl DriverKind {
    pub fn lookup(controller: ControllerType, platform: SystemPlatform) -> Option<Self> {
        DRIVER_TABLE
            .iter()
            .find(|(c, p, _)| *c == controller && *p == platform)
            .map(|(_, _, kind)| *kind)
    }

    /// Opens the device and binds it to this driver's table
    pub fn open(
        self,
        port: Arc<dyn RawInputPort>,
        index: usize,
        settings: DriverSettings,
    ) -> Result<PlatformJoystickDriver, JoystickError> {
        let binding = DeviceBinding::open(port, index)?;
        let driver = match self {
            DriverKind::XboxWindows => {
                PlatformJoystickDriver::XboxWindows(PadDriver::new(&xbox::WINDOWS, binding, settings))
            }
            DriverKind::XboxLinux => {
                PlatformJoystickDriver::XboxLinux(PadDriver::new(&xbox::LINUX, binding, settings))
            }
            DriverKind::XboxMacOs => {
                PlatformJoystickDriver::XboxMacOs(PadDriver::new(&xbox::MACOS, binding, settings))
            }
            DriverKind::DualShock4Linux => PlatformJoystickDriver::DualShock4Linux(PadDriver::new(
                &dualshock::LINUX,
                binding,
                settings,
            )),
        };
        Ok(driver)
    }
}

/// Picks the driver implementation for a controller type.
///
/// An explicit `platform` wins over host detection.
pub fn resolve(controller_type: &str, platform: Option<&str>) -> Result<DriverKind, JoystickError> {
    let platform = match platform {
        Some(identifier) => SystemPlatform::from_identifier(identifier)?,
        None => SystemPlatform::detect()?,
    };
    let controller = ControllerType::from_name(controller_type).ok_or_else(|| {
        JoystickError::UnsupportedControllerType {
            controller_type: controller_type.to_string(),
        }
    })?;
    let kind = DriverKind::lookup(controller, platform).ok_or_else(|| {
        JoystickError::UnsupportedPlatformForController {
            controller_type: controller.name().to_string(),
            platform,
        }
    })?;
    debug!(
        "Resolved {} on {} to driver {:?}",
        controller, platform, kind
    );
    Ok(kind)
}

/// Resolves a driver and opens the device at `index` with it
pub fn select(
    controller_type: &str,
    platform: Option<&str>,
    port: Arc<dyn RawInputPort>,
    index: usize,
    settings: DriverSettings,
) -> Result<PlatformJoystickDriver, JoystickError> {
    let kind = resolve(controller_type, platform)?;
    let driver = kind.open(port, index, settings)?;
    info!(
        "Selected {} driver for {} on device {}",
        driver.platform(),
        driver.controller_type(),
        index
    );
    Ok(driver)
}

/// Catalog of controller type names and the platforms they support
pub fn compatible_types() -> BTreeMap<String, Vec<String>> {
    ControllerType::ALL
        .into_iter()
        .map(|controller| {
            let platforms = controller
                .supported_platforms()
                .into_iter()
                .map(|platform| platform.identifier().to_string())
                .collect();
            (controller.name().to_string(), platforms)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MemoryInputPort, RawFrame};

    #[test]
    fn resolution_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                resolve("xbox_controller", Some("darwin")).unwrap(),
                DriverKind::XboxMacOs
            );
        }
        assert_eq!(
            resolve("xbox_controller", Some("linux")).unwrap(),
            DriverKind::XboxLinux
        );
        assert_eq!(
            resolve("xbox_controller", Some("win32")).unwrap(),
            DriverKind::XboxWindows
        );
        assert_eq!(
            resolve("dualshock4", Some("linux")).unwrap(),
            DriverKind::DualShock4Linux
        );
    }

    #[test]
    fn unknown_platform_fails() {
        match resolve("xbox_controller", Some("plan9")) {
            Err(JoystickError::UnsupportedPlatform { platform }) => assert_eq!(platform, "plan9"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_controller_fails() {
        match resolve("steering_wheel", Some("linux")) {
            Err(JoystickError::UnsupportedControllerType { controller_type }) => {
                assert_eq!(controller_type, "steering_wheel")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_platform_table_fails() {
        match resolve("dualshock4", Some("darwin")) {
            Err(JoystickError::UnsupportedPlatformForController {
                controller_type,
                platform,
            }) => {
                assert_eq!(controller_type, "dualshock4");
                assert_eq!(platform, SystemPlatform::MacOs);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn catalog_lists_every_table() {
        let catalog = compatible_types();
        assert_eq!(catalog["xbox_controller"], vec!["win", "linux", "darwin"]);
        assert_eq!(catalog["dualshock4"], vec!["linux"]);
    }

    #[test]
    fn select_binds_the_requested_variant() {
        let port = Arc::new(MemoryInputPort::new());
        let index = port.attach("pad", RawFrame::default());
        let driver = select(
            "xbox_controller",
            Some("darwin"),
            port.clone(),
            index,
            DriverSettings::default(),
        )
        .unwrap();
        assert!(matches!(driver, PlatformJoystickDriver::XboxMacOs(_)));
        assert_eq!(driver.platform(), SystemPlatform::MacOs);
        assert_eq!(port.open_handle_count(), 1);
    }

    #[test]
    fn failed_resolution_opens_nothing() {
        let port = Arc::new(MemoryInputPort::new());
        let index = port.attach("pad", RawFrame::default());
        assert!(select(
            "xbox_controller",
            Some("plan9"),
            port.clone(),
            index,
            DriverSettings::default()
        )
        .is_err());
        assert_eq!(port.open_handle_count(), 0);
    }
}
