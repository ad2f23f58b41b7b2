//! Host platform detection
//!
//! Platform identifiers follow the `darwin` / `linux` / `win32` convention.
//! Matching is prefix based, so `linux2` and `win64` resolve as well.

use crate::error::JoystickError;
use std::fmt;
use tracing::debug;

/// Operating systems with their own raw joystick layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemPlatform {
    Windows,
    Linux,
    MacOs,
}

impl SystemPlatform {
    pub const ALL: [SystemPlatform; 3] = [
        SystemPlatform::Windows,
        SystemPlatform::Linux,
        SystemPlatform::MacOs,
    ];

    /// Canonical identifier, accepted back by [`SystemPlatform::from_identifier`]
    pub fn identifier(self) -> &'static str {
        match self {
            SystemPlatform::Windows => "win",
            SystemPlatform::Linux => "linux",
            SystemPlatform::MacOs => "darwin",
        }
    }

    /// Maps a platform identifier such as `darwin`, `linux2` or `win32`.
    pub fn from_identifier(identifier: &str) -> Result<Self, JoystickError> {
        let normalized = identifier.trim().to_ascii_lowercase();
        if normalized.contains("darwin") {
            Ok(SystemPlatform::MacOs)
        } else if normalized.starts_with("linux") {
            Ok(SystemPlatform::Linux)
        } else if normalized.starts_with("win") {
            Ok(SystemPlatform::Windows)
        } else {
            Err(JoystickError::UnsupportedPlatform {
                platform: identifier.to_string(),
            })
        }
    }

    /// Platform of the running host
    pub fn detect() -> Result<Self, JoystickError> {
        let identifier = host_identifier();
        debug!("Detecting platform from host identifier '{}'", identifier);
        Self::from_identifier(identifier)
    }
}

/// Host identifier in the `darwin` / `linux` / `win32` convention
pub fn host_identifier() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

impl fmt::Display for SystemPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_rules() {
        assert_eq!(SystemPlatform::from_identifier("darwin").unwrap(), SystemPlatform::MacOs);
        assert_eq!(
            SystemPlatform::from_identifier("x86_64-apple-darwin").unwrap(),
            SystemPlatform::MacOs
        );
        assert_eq!(SystemPlatform::from_identifier("linux").unwrap(), SystemPlatform::Linux);
        assert_eq!(SystemPlatform::from_identifier("linux2").unwrap(), SystemPlatform::Linux);
        assert_eq!(SystemPlatform::from_identifier("win32").unwrap(), SystemPlatform::Windows);
        assert_eq!(SystemPlatform::from_identifier(" WIN ").unwrap(), SystemPlatform::Windows);
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        for identifier in ["plan9", "freebsd", "", "gnu/linux"] {
            match SystemPlatform::from_identifier(identifier) {
                Err(JoystickError::UnsupportedPlatform { platform }) => {
                    assert_eq!(platform, identifier)
                }
                other => panic!("unexpected result for {identifier:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn identifiers_round_trip() {
        for platform in SystemPlatform::ALL {
            assert_eq!(SystemPlatform::from_identifier(platform.identifier()).unwrap(), platform);
        }
    }

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn host_is_detected() {
        assert!(SystemPlatform::detect().is_ok());
    }
}
