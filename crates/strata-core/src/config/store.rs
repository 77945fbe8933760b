//! Config store for loading and saving strata.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{StrataConfig, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store at the default location (`<config_dir>/strata/strata.toml`).
    pub fn from_default_path() -> anyhow::Result<Self> {
        Ok(Self::new(super::default_config_path()?))
    }

    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration; a missing file is an empty configuration.
    pub fn load(&self) -> anyhow::Result<StrataConfig> {
        if !self.config_path.exists() {
            return Ok(StrataConfig::new());
        }
        parser::parse_strata_toml(&self.config_path)
    }

    pub fn save(&self, config: &StrataConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config).context("Failed to serialize config to TOML")?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}
