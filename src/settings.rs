//! Operator configuration
//!
//! One immutable settings struct covers the whole storage subsystem. It is
//! built once at startup (from a YAML file or CLI/env flags), validated, and
//! passed by value to every component that needs it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Access modes a workspace claim may request
pub const KNOWN_ACCESS_MODES: [&str; 4] = [
    "ReadWriteOnce",
    "ReadOnlyMany",
    "ReadWriteMany",
    "ReadWriteOncePod",
];

/// Binary suffixes accepted in a claim size request
const QUANTITY_SUFFIXES: [&str; 13] = [
    "", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei", "k", "M", "G", "T", "P", "E",
];

// =============================================================================
// Storage Settings
// =============================================================================

/// Configuration of the workspace storage subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Whether workspace storage is provisioned at all
    pub enabled: bool,
    /// Base claim name; strategies derive per-workspace names from it
    pub claim_name: String,
    /// Requested claim capacity as a Kubernetes quantity, e.g. "10Gi"
    pub size_request: String,
    /// Access mode requested for the claim
    pub access_mode: String,
    /// Path the claim is mounted at inside workspace-agent containers
    pub mount_path: String,
    /// Configured claim strategy name, resolved at startup
    pub strategy: String,
    /// Project shared by all workspaces; `None` when every workspace runs in
    /// its own isolated project
    pub isolated_project: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            claim_name: "claim-workspace".to_string(),
            size_request: "10Gi".to_string(),
            access_mode: "ReadWriteOnce".to_string(),
            mount_path: "/projects".to_string(),
            strategy: "onePerWorkspace".to_string(),
            isolated_project: None,
        }
    }
}

impl StorageSettings {
    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let settings = serde_yaml::from_str(&raw)?;
        Ok(settings)
    }

    /// Validate the settings at startup.
    ///
    /// A disabled subsystem validates trivially; nothing else is consulted.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if !is_valid_claim_name(&self.claim_name) {
            return Err(Error::Configuration(format!(
                "Invalid claim name '{}': must be a lowercase DNS label",
                self.claim_name
            )));
        }

        if !is_valid_quantity(&self.size_request) {
            return Err(Error::Configuration(format!(
                "Invalid claim size request '{}'",
                self.size_request
            )));
        }

        if !KNOWN_ACCESS_MODES.contains(&self.access_mode.as_str()) {
            return Err(Error::Configuration(format!(
                "Unknown access mode '{}', expected one of {:?}",
                self.access_mode, KNOWN_ACCESS_MODES
            )));
        }

        if !self.mount_path.starts_with('/') {
            return Err(Error::Configuration(format!(
                "Mount path '{}' must be absolute",
                self.mount_path
            )));
        }

        if let Some(project) = &self.isolated_project {
            if project.is_empty() {
                return Err(Error::Configuration(
                    "Isolated project name must not be empty when set".to_string(),
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Validation Helpers
// =============================================================================

/// Lowercase DNS label: alphanumeric and '-', starting and ending alphanumeric.
///
/// Capped at 63 characters minus headroom for the workspace-id suffix appended
/// under the per-workspace strategy.
fn is_valid_claim_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 40
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}

/// Digits followed by a known binary/decimal suffix
fn is_valid_quantity(quantity: &str) -> bool {
    let digits: &str = quantity.trim_end_matches(|c: char| !c.is_ascii_digit());
    let suffix = &quantity[digits.len()..];
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && QUANTITY_SUFFIXES.contains(&suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = StorageSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.enabled);
        assert_eq!(settings.claim_name, "claim-workspace");
        assert!(settings.isolated_project.is_none());
    }

    #[test]
    fn test_disabled_settings_validate_trivially() {
        let settings = StorageSettings {
            enabled: false,
            claim_name: "NOT A VALID NAME".to_string(),
            size_request: "lots".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_claim_name() {
        for bad in ["", "Claim", "claim_ws", "-claim", "claim-"] {
            let settings = StorageSettings {
                claim_name: bad.to_string(),
                ..Default::default()
            };
            assert_matches!(settings.validate(), Err(Error::Configuration(_)), "{}", bad);
        }
    }

    #[test]
    fn test_rejects_bad_size_request() {
        for bad in ["", "Gi", "10Qi", "ten", "10 Gi"] {
            let settings = StorageSettings {
                size_request: bad.to_string(),
                ..Default::default()
            };
            assert_matches!(settings.validate(), Err(Error::Configuration(_)), "{}", bad);
        }
        for good in ["10Gi", "500Mi", "1", "2T"] {
            let settings = StorageSettings {
                size_request: good.to_string(),
                ..Default::default()
            };
            assert!(settings.validate().is_ok(), "{}", good);
        }
    }

    #[test]
    fn test_rejects_unknown_access_mode() {
        let settings = StorageSettings {
            access_mode: "ReadSometimes".to_string(),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("ReadSometimes"));
    }

    #[test]
    fn test_rejects_relative_mount_path() {
        let settings = StorageSettings {
            mount_path: "projects".to_string(),
            ..Default::default()
        };
        assert_matches!(settings.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_rejects_empty_isolated_project() {
        let settings = StorageSettings {
            isolated_project: Some(String::new()),
            ..Default::default()
        };
        assert_matches!(settings.validate(), Err(Error::Configuration(_)));
    }

    #[test]
    fn test_from_file_round_trip() {
        let settings = StorageSettings {
            claim_name: "data".to_string(),
            isolated_project: Some("dev-cluster".to_string()),
            strategy: "onePerProject".to_string(),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&settings).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let loaded = StorageSettings::from_file(file.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_from_file_applies_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"claimName: cache\nstrategy: onePerProject\n")
            .unwrap();

        let loaded = StorageSettings::from_file(file.path()).unwrap();
        assert_eq!(loaded.claim_name, "cache");
        assert_eq!(loaded.strategy, "onePerProject");
        assert_eq!(loaded.size_request, "10Gi");
        assert!(loaded.enabled);
    }

    #[test]
    fn test_from_file_missing_file_is_io_error() {
        let err = StorageSettings::from_file("/nonexistent/storage.yaml").unwrap_err();
        assert_matches!(err, Error::Io(_));
    }
}
