//! Actions configuration loader
//!
//! Each environment has its own actions file, `config.<env>.yaml`, inside the
//! configuration directory.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::action::ActionRecord;
use crate::error::RegistryError;
use crate::handler::HandlerCatalog;
use crate::registry::Actions;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "JBI_CONFIG_DIR";

/// Environment variable naming the deployment environment
pub const ENV_NAME_ENV: &str = "ENV";

pub const DEFAULT_CONFIG_DIR: &str = "config";

pub const DEFAULT_ENV: &str = "nonprod";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionsConfigLoader {
    config_dir: PathBuf,
    env: String,
}

impl ActionsConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>, env: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
            env: env.into(),
        }
    }

    /// Create loader from `JBI_CONFIG_DIR` and `ENV`, defaulting to
    /// `config` and `nonprod`
    pub fn from_env() -> Self {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string());
        let env = std::env::var(ENV_NAME_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENV.to_string());
        Self::new(config_dir, env)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    /// Path of the actions file for this environment
    pub fn path(&self) -> PathBuf {
        self.config_dir.join(format!("config.{}.yaml", self.env))
    }

    /// Load and validate this environment's actions
    pub fn load(&self, catalog: &HandlerCatalog) -> Result<Actions, RegistryError> {
        load_actions_file(self.path(), catalog)
    }
}

/// Read raw records from a YAML file without validating them
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<ActionRecord>, RegistryError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| RegistryError::Parse {
        path: Some(path.to_path_buf()),
        source,
    })
}

/// Load and validate an actions file
pub fn load_actions_file(
    path: impl AsRef<Path>,
    catalog: &HandlerCatalog,
) -> Result<Actions, RegistryError> {
    let path = path.as_ref();
    info!("Loading actions configuration from {}", path.display());
    let records = load_records(path)?;
    Actions::from_records(records, catalog)
}
