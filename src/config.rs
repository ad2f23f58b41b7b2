//! Service configuration
//!
//! Every section has defaults, so a missing config file never prevents
//! startup. A file that exists but does not parse or validate is an error.

use crate::controller::{DriverSettings, SystemPlatform};
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "gamepad-state";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub controller: ControllerDefaults,
    pub driver: DriverSettings,
    pub watch: WatchConfig,
}

/// Defaults for joysticks created without explicit arguments
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerDefaults {
    pub controller_type: String,
    /// Platform override; host detection is used when unset
    pub platform: Option<String>,
}

impl Default for ControllerDefaults {
    fn default() -> Self {
        Self {
            controller_type: "xbox_controller".to_string(),
            platform: None,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
        }
    }
}

impl ServiceConfig {
    /// `<config dir>/gamepad-state/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads an explicit path, or the default path when it exists, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    info!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path)
            .wrap_err_with(|| format!("Unable to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.driver.trigger_press_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(eyre!(
                "trigger_press_threshold {} is not in the range [-1, 1]",
                threshold
            ));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(eyre!("poll_interval_ms must be greater than zero"));
        }
        if let Some(platform) = &self.controller.platform {
            SystemPlatform::from_identifier(platform)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(ServiceConfig::from_toml_str("").unwrap(), ServiceConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [controller]
            platform = "darwin"

            [driver]
            trigger_press_threshold = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.controller.controller_type, "xbox_controller");
        assert_eq!(config.controller.platform.as_deref(), Some("darwin"));
        assert_eq!(config.driver.trigger_press_threshold, 0.5);
        assert_eq!(config.watch.poll_interval_ms, 100);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ServiceConfig::from_toml_str("[driver]\ntrigger_press_threshold = 2.0").is_err());
        assert!(ServiceConfig::from_toml_str("[watch]\npoll_interval_ms = 0").is_err());
        assert!(ServiceConfig::from_toml_str("[controller]\nplatform = \"plan9\"").is_err());
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut config = ServiceConfig::default();
        config.controller.platform = Some("linux".to_string());
        let text = config.to_toml_string().unwrap();
        assert_eq!(ServiceConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("gamepad-state-does-not-exist.toml");
        assert!(ServiceConfig::load(Some(&path)).is_err());
    }
}
