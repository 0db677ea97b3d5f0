//! Runtime configuration for the bridge: which module to import, where to
//! find it, and which deployment profile to bind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::profile::Profile;

/// Environment variable naming a JSON config file to load at startup.
pub const CONFIG_ENV_VAR: &str = "ADVBRIDGE_CONFIG";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Module imported from the embedded interpreter.
    pub module: String,
    /// Directory appended to the interpreter's module search path before
    /// the import. Defaults to the current working directory.
    #[serde(default = "default_search_path")]
    pub search_path: PathBuf,
    /// Which callables to resolve and bind.
    pub profile: Profile,
}

fn default_search_path() -> PathBuf {
    PathBuf::from(".")
}

impl BridgeConfig {
    pub fn new(module: impl Into<String>, profile: Profile) -> Self {
        Self {
            module: module.into(),
            search_path: default_search_path(),
            profile,
        }
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_path = path.into();
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the file named by `ADVBRIDGE_CONFIG`, if the variable is set
    /// and non-empty.
    pub fn discover() -> Result<Option<Self>, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(raw) if !raw.trim().is_empty() => Self::from_json_file(raw.trim()).map(Some),
            Ok(_) => Ok(None),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(ConfigError::Env(err)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to read ADVBRIDGE_CONFIG: {0}")]
    Env(std::env::VarError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DataUpdateNaming;

    #[test]
    fn search_path_defaults_to_the_working_directory() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"module": "perturber", "profile": "perturber"}"#).unwrap();
        assert_eq!(config.module, "perturber");
        assert_eq!(config.search_path, PathBuf::from("."));
        assert_eq!(config.profile, Profile::Perturber);
    }

    #[test]
    fn full_config_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        fs::write(
            &path,
            r#"{
                "module": "dataloader",
                "search_path": "/srv/workers",
                "profile": {"dataloader": {"naming": "unified"}}
            }"#,
        )
        .unwrap();

        let config = BridgeConfig::from_json_file(&path).unwrap();
        assert_eq!(config.module, "dataloader");
        assert_eq!(config.search_path, PathBuf::from("/srv/workers"));
        assert_eq!(
            config.profile,
            Profile::Dataloader {
                naming: DataUpdateNaming::Unified
            }
        );
    }

    #[test]
    fn parse_failures_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        let err = BridgeConfig::from_json_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn builder_overrides_the_search_path() {
        let config = BridgeConfig::new("generator", Profile::Generator)
            .with_search_path("/opt/attack-workers");
        assert_eq!(config.search_path, PathBuf::from("/opt/attack-workers"));
    }
}
