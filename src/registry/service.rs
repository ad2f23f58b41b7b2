//! Async service boundary over the registry
//!
//! Registry calls poll hardware synchronously, so each one runs on tokio's
//! blocking pool instead of an async worker thread.

use super::{JoystickDetails, JoystickRegistry};
use crate::error::{JoystickError, JoystickId};
use crate::state::ControllerState;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Cloneable handle owning the process' single registry
#[derive(Clone)]
pub struct JoystickService {
    registry: Arc<JoystickRegistry>,
}

impl JoystickService {
    pub fn new(registry: JoystickRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &JoystickRegistry {
        &self.registry
    }

    async fn run_blocking<T, F>(&self, task: &'static str, f: F) -> Result<T, JoystickError>
    where
        T: Send + 'static,
        F: FnOnce(&JoystickRegistry) -> Result<T, JoystickError> + Send + 'static,
    {
        let registry = self.registry.clone();
        debug!("Dispatching {} to blocking pool", task);
        match tokio::task::spawn_blocking(move || f(&registry)).await {
            Ok(result) => result,
            Err(e) => {
                error!("Blocking {} task failed: {}", task, e);
                Err(JoystickError::Worker(e.to_string()))
            }
        }
    }

    pub async fn list_connected(&self) -> Result<Vec<JoystickDetails>, JoystickError> {
        self.run_blocking("list_connected", |registry| registry.list_details())
            .await
    }

    pub fn list_compatible(&self) -> BTreeMap<String, Vec<String>> {
        self.registry.list_compatible_types()
    }

    pub async fn create(
        &self,
        id: JoystickId,
        controller_type: String,
        platform: Option<String>,
    ) -> Result<(), JoystickError> {
        self.run_blocking("create", move |registry| {
            registry.create(id, &controller_type, platform.as_deref())
        })
        .await
    }

    pub async fn get_state(&self, id: JoystickId) -> Result<ControllerState, JoystickError> {
        self.run_blocking("get_state", move |registry| registry.get_state(id))
            .await
    }

    pub async fn remove(&self, id: JoystickId) -> Result<(), JoystickError> {
        self.run_blocking("remove", move |registry| registry.remove(id))
            .await
    }
}
