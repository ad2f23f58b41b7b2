//! # Joystick Registry
//!
//! Stateful table mapping joystick ids to live platform drivers.
//!
//! ## Lifecycle per id
//!
//! ```text
//! Absent ──create──► Active ──remove──► Disposed (terminal, id is Absent again)
//! ```
//!
//! ## Locking
//!
//! One mutex guards the whole table and is held for the full duration of every
//! operation, including the hardware poll in `get_state` and the disposal in
//! `remove`. A reader therefore sees either a live driver or no entry at all,
//! never a disposed handle. Polls are bounded, so the lock is never held long.
//!
//! The registry is an owned object: whoever constructs it holds the only
//! table, and dropping it disposes every remaining driver.

pub mod service;

use crate::controller::{compatible_types, select, DriverSettings, PlatformJoystickDriver};
use crate::error::{JoystickError, JoystickId};
use crate::port::{DeviceDescriptor, RawInputPort};
use crate::state::ControllerState;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

pub use service::JoystickService;

/// Information about a joystick or game controller visible on the port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoystickDetails {
    pub id: usize,
    pub name: String,
    pub num_axes: usize,
    pub num_buttons: usize,
    pub num_hats: usize,
    pub num_balls: usize,
}

impl From<DeviceDescriptor> for JoystickDetails {
    fn from(device: DeviceDescriptor) -> Self {
        Self {
            id: device.index,
            name: device.name,
            num_axes: device.num_axes,
            num_buttons: device.num_buttons,
            num_hats: device.num_hats,
            num_balls: device.num_balls,
        }
    }
}

pub struct JoystickRegistry {
    port: Arc<dyn RawInputPort>,
    settings: DriverSettings,
    joysticks: Mutex<HashMap<JoystickId, PlatformJoystickDriver>>,
}

impl JoystickRegistry {
    pub fn new(port: Arc<dyn RawInputPort>, settings: DriverSettings) -> Self {
        info!("Creating joystick registry with settings: {:?}", settings);
        Self {
            port,
            settings,
            joysticks: Mutex::new(HashMap::new()),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<JoystickId, PlatformJoystickDriver>> {
        // Entries are only inserted or removed after their driver call
        // succeeded, so a poisoned table is still consistent
        self.joysticks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Every device currently visible on the port, registered or not
    pub fn list_details(&self) -> Result<Vec<JoystickDetails>, JoystickError> {
        let devices = self
            .port
            .enumerate_devices()
            .map_err(JoystickError::InputBackend)?;
        debug!("Found {} connected devices", devices.len());
        Ok(devices.into_iter().map(JoystickDetails::from).collect())
    }

    /// Controller type names and the platforms each one supports
    pub fn list_compatible_types(&self) -> BTreeMap<String, Vec<String>> {
        let catalog = compatible_types();
        info!("Available joysticks: {:?}", catalog);
        catalog
    }

    /// Binds `id` to the device with the same index using the selected driver.
    ///
    /// An active id is rejected before any device is opened, leaving the
    /// existing driver untouched.
    pub fn create(
        &self,
        id: JoystickId,
        controller_type: &str,
        platform: Option<&str>,
    ) -> Result<(), JoystickError> {
        let mut joysticks = self.table();
        if joysticks.contains_key(&id) {
            warn!("Joystick {} is already initialized", id);
            return Err(JoystickError::DuplicateId { id });
        }

        let driver = select(
            controller_type,
            platform,
            self.port.clone(),
            id as usize,
            self.settings,
        )?;
        info!(
            "Joystick {} created as {} on {} (device {})",
            id,
            driver.controller_type(),
            driver.platform(),
            driver.device_index()
        );
        joysticks.insert(id, driver);
        Ok(())
    }

    pub fn get_state(&self, id: JoystickId) -> Result<ControllerState, JoystickError> {
        let joysticks = self.table();
        let driver = joysticks.get(&id).ok_or(JoystickError::UnknownId { id })?;
        driver.get_state()
    }

    /// Disposes the driver, then drops the entry; the id can be created again
    pub fn remove(&self, id: JoystickId) -> Result<(), JoystickError> {
        let mut joysticks = self.table();
        let driver = joysticks
            .get_mut(&id)
            .ok_or(JoystickError::UnknownId { id })?;
        driver.dispose();
        joysticks.remove(&id);
        info!("Joystick {} removed", id);
        Ok(())
    }

    /// Ids currently active, in ascending order
    pub fn active_ids(&self) -> Vec<JoystickId> {
        let mut ids: Vec<_> = self.table().keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Drop for JoystickRegistry {
    fn drop(&mut self) {
        let joysticks = self
            .joysticks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (id, driver) in joysticks.iter_mut().filter(|(_, d)| !d.is_disposed()) {
            debug!("Disposing joystick {} on registry shutdown", id);
            driver.dispose();
        }
        joysticks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MemoryInputPort, RawFrame};

    fn registry_with_pad() -> (Arc<MemoryInputPort>, JoystickRegistry) {
        let port = Arc::new(MemoryInputPort::new());
        port.attach(
            "Xbox Wireless Controller",
            RawFrame::new(vec![0.0, 0.0, -1.0, 0.0, 0.0, -1.0], vec![false; 11], vec![(0, 0)]),
        );
        let registry = JoystickRegistry::new(port.clone(), DriverSettings::default());
        (port, registry)
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let (_, registry) = registry_with_pad();
        assert!(matches!(
            registry.get_state(4),
            Err(JoystickError::UnknownId { id: 4 })
        ));
        assert!(matches!(
            registry.remove(4),
            Err(JoystickError::UnknownId { id: 4 })
        ));
    }

    #[test]
    fn duplicate_create_keeps_the_first_driver() {
        let (port, registry) = registry_with_pad();
        registry.create(0, "xbox_controller", Some("linux")).unwrap();
        assert!(matches!(
            registry.create(0, "xbox_controller", Some("win")),
            Err(JoystickError::DuplicateId { id: 0 })
        ));
        assert_eq!(port.open_handle_count(), 1);
        assert_eq!(port.close_count(), 0);
        assert!(registry.get_state(0).is_ok());
    }

    #[test]
    fn failed_create_leaves_id_absent() {
        let (port, registry) = registry_with_pad();
        assert!(matches!(
            registry.create(1, "xbox_controller", Some("linux")),
            Err(JoystickError::DeviceUnavailable { device: 1, .. })
        ));
        assert!(registry.active_ids().is_empty());
        assert_eq!(port.open_handle_count(), 0);
    }

    #[test]
    fn remove_releases_the_handle_and_frees_the_id() {
        let (port, registry) = registry_with_pad();
        registry.create(0, "xbox_controller", Some("linux")).unwrap();
        registry.remove(0).unwrap();
        assert_eq!(port.open_handle_count(), 0);
        assert_eq!(port.close_count(), 1);

        registry.create(0, "xbox_controller", Some("darwin")).unwrap();
        assert_eq!(registry.active_ids(), vec![0]);
    }

    #[test]
    fn dropping_the_registry_disposes_drivers() {
        let (port, registry) = registry_with_pad();
        registry.create(0, "xbox_controller", Some("linux")).unwrap();
        drop(registry);
        assert_eq!(port.open_handle_count(), 0);
        assert_eq!(port.close_count(), 1);
    }
}
