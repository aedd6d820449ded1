//! Persistent, TOML-backed repository configuration.
//!
//! A `PersistentConfig` trait gives any `Serialize + Deserialize + Default`
//! struct `read_from_file`/`write_to_file`, falling back to defaults when
//! the file is absent. Carries only local identity and repo-layout
//! settings -- no remote/server fields, since there is nothing to point a
//! remote config at without network replication.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default name of the repository metadata directory.
pub const DEFAULT_REPO_DIR: &str = ".caf";

pub trait PersistentConfig: Serialize + for<'de> Deserialize<'de> + Default {
    fn read_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&data)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    fn write_to_file(&self, path: &Path) -> Result<()> {
        let data = toml::to_string(self).context("failed to serialize config to TOML")?;
        fs::write(path, data)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default = "default_repo_dir")]
    pub repo_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: UserConfig::default(),
            repo_dir: default_repo_dir(),
        }
    }
}

fn default_repo_dir() -> String {
    DEFAULT_REPO_DIR.to_string()
}

impl PersistentConfig for Config {}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Config {
    /// The "Name <email>" string used as the default author identity.
    pub fn author(&self) -> String {
        if self.user.email.is_empty() {
            self.user.name.clone()
        } else {
            format!("{} <{}>", self.user.name, self.user.email)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::read_from_file(&path).unwrap();
        assert_eq!(config.repo_dir, DEFAULT_REPO_DIR);
    }

    #[test]
    fn roundtrips_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.user.name = "Ada".into();
        config.user.email = "ada@example.com".into();
        config.write_to_file(&path).unwrap();

        let loaded = Config::read_from_file(&path).unwrap();
        assert_eq!(loaded.author(), "Ada <ada@example.com>");
    }
}
