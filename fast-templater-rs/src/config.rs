//! CLI configuration file.
//!
//! Read from `$XDG_CONFIG_HOME/fast-templater/config.toml`:
//!
//! ```toml
//! vault = "~/Notes"
//! settings_path = "/elsewhere/data.json"
//! templater_command = "templater-cli --strict"
//! ```
//!
//! Every key is optional and command-line flags take precedence.

use crate::error::{Result, TemplaterError};
use crate::settings::JsonFileStorage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_DIR_NAME: &str = "fast-templater";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default vault root.
    pub vault: Option<PathBuf>,
    /// Where the settings blob lives, if not in the vault's plugin folder.
    pub settings_path: Option<PathBuf>,
    /// External macro-expansion program.
    pub templater_command: Option<String>,
}

impl Config {
    /// Location of the config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the config file from its default location. A missing file gives
    /// the defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&text)?;
        config.vault = config.vault.map(|p| expand_home(&p));
        config.settings_path = config.settings_path.map(|p| expand_home(&p));
        Ok(config)
    }

    /// The vault to operate on: the command-line value, else the configured
    /// one, else the current directory.
    pub fn resolve_vault_path(&self, cli_vault: Option<&Path>) -> Result<PathBuf> {
        let path = match (cli_vault, &self.vault) {
            (Some(path), _) => expand_home(path),
            (None, Some(path)) => path.clone(),
            (None, None) => std::env::current_dir()?,
        };
        if !path.is_dir() {
            return Err(TemplaterError::VaultNotFound(path));
        }
        Ok(path)
    }

    /// Settings storage for `vault`, honoring an explicit override.
    pub fn settings_storage(&self, vault: &Path, cli_settings: Option<&Path>) -> JsonFileStorage {
        match cli_settings.or(self.settings_path.as_deref()) {
            Some(path) => JsonFileStorage::new(expand_home(path)),
            None => JsonFileStorage::in_vault(vault),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
