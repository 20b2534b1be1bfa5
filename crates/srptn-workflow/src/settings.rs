//! Process-wide settings.
//!
//! Read from the `SRPTN_CONFIG` environment variable, which holds a JSON
//! object such as `{"workdir": "/data/analyses"}`. An unset variable gives
//! the defaults.

use std::env::VarError;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{WorkflowError, WorkflowResult};

/// Environment variable holding the settings JSON.
pub const SETTINGS_ENV: &str = "SRPTN_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Base directory that relative analysis paths resolve against.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
        }
    }
}

impl Settings {
    /// Load from `SRPTN_CONFIG`.
    pub fn from_env() -> WorkflowResult<Self> {
        match std::env::var(SETTINGS_ENV) {
            Ok(raw) => Self::from_json(&raw),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(_)) => Err(WorkflowError::Settings {
                reason: format!("{SETTINGS_ENV} is not valid unicode"),
            }),
        }
    }

    /// Parse the settings JSON.
    pub fn from_json(raw: &str) -> WorkflowResult<Self> {
        serde_json::from_str(raw).map_err(|e| WorkflowError::Settings {
            reason: format!("{SETTINGS_ENV}: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_workdir() {
        let settings = Settings::from_json(r#"{"workdir": "/data/analyses"}"#).unwrap();
        assert_eq!(settings.workdir, PathBuf::from("/data/analyses"));
    }

    #[test]
    fn missing_workdir_defaults_to_current_dir() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn malformed_json_is_a_settings_error() {
        let err = Settings::from_json("{workdir").unwrap_err();
        assert!(matches!(err, WorkflowError::Settings { .. }));
        assert!(err.to_string().contains(SETTINGS_ENV));
    }
}
