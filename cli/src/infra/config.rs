//! Infrastructure implementation of the `ConfigStore` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::ConfigStore;
use crate::domain::SkiffConfig;

/// Production implementation of `ConfigStore` that reads a YAML file on disk.
#[derive(Default)]
pub struct YamlConfigStore {
    path: Option<PathBuf>,
}

impl YamlConfigStore {
    /// Use `$SKIFF_CONFIG`, falling back to `~/.skiff/config.yaml`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an explicit file (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<SkiffConfig> {
        let path = self.path()?;
        if !path.exists() {
            return Ok(SkiffConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Ok(val) = std::env::var("SKIFF_CONFIG") {
            return Ok(PathBuf::from(val));
        }
        Ok(skiff_dir()?.join("config.yaml"))
    }
}

/// `~/.skiff`, the home of config and catalog files.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn skiff_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.join(".skiff"))
}
