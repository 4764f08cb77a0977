//! A vault on disk, acting as the host for the template engine.

use crate::config::Config;
use crate::error::{Result, TemplaterError};
use crate::expander::{CommandExpander, Disabled, MacroExpander};
use crate::library::TemplateLibrary;
use crate::preset::PresetStore;
use crate::settings::{JsonFileStorage, SettingsManager};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A vault root with its persisted plugin settings.
#[derive(Debug)]
pub struct Vault {
    /// Root path of the vault.
    pub root: PathBuf,
    config: Config,
    settings: SettingsManager<JsonFileStorage>,
}

impl Vault {
    /// Open a vault and load its settings. `settings_path` overrides the
    /// settings location from `config`.
    pub fn open(root: impl Into<PathBuf>, config: Config, settings_path: Option<&Path>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(TemplaterError::VaultNotFound(root));
        }
        let storage = config.settings_storage(&root, settings_path);
        debug!(settings = %storage.path().display(), "loading settings");
        let settings = SettingsManager::open(storage)?;
        Ok(Self {
            root,
            config,
            settings,
        })
    }

    pub fn settings(&self) -> &SettingsManager<JsonFileStorage> {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsManager<JsonFileStorage> {
        &mut self.settings
    }

    pub fn presets(&mut self) -> PresetStore<'_, JsonFileStorage> {
        PresetStore::new(&mut self.settings)
    }

    pub fn library(&self) -> Result<TemplateLibrary> {
        TemplateLibrary::from_settings(&self.root, self.settings.get())
    }

    /// The macro expander configured for this vault, or [`Disabled`].
    pub fn expander(&self, disabled: bool) -> Box<dyn MacroExpander> {
        if disabled {
            return Box::new(Disabled);
        }
        match self
            .config
            .templater_command
            .as_deref()
            .and_then(CommandExpander::from_command_line)
        {
            Some(expander) => Box::new(expander),
            None => Box::new(Disabled),
        }
    }

    /// Normalize a note path (add .md extension if needed).
    pub fn normalize_note_path(&self, path: &str) -> PathBuf {
        let path = path.trim();
        if path.ends_with(".md") {
            PathBuf::from(path)
        } else {
            PathBuf::from(format!("{}.md", path))
        }
    }

    /// Get the full path to a note.
    pub fn note_path(&self, relative_path: &Path) -> PathBuf {
        self.root.join(relative_path)
    }

    pub fn read_note(&self, relative_path: &Path) -> Result<String> {
        let path = self.note_path(relative_path);
        if !path.is_file() {
            return Err(TemplaterError::NoteNotFound(relative_path.to_path_buf()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    pub fn write_note(&self, relative_path: &Path, content: &str) -> Result<()> {
        let path = self.note_path(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetDraft;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> Vault {
        Vault::open(dir.path(), Config::default(), None).unwrap()
    }

    #[test]
    fn test_missing_vault() {
        let dir = TempDir::new().unwrap();
        let err = Vault::open(dir.path().join("nope"), Config::default(), None).unwrap_err();
        assert!(matches!(err, TemplaterError::VaultNotFound(_)));
    }

    #[test]
    fn test_presets_persist_in_vault() {
        let dir = TempDir::new().unwrap();
        open(&dir).presets().create(PresetDraft::new("Meeting")).unwrap();

        let data = dir.path().join(".obsidian/plugins/fast-templater/data.json");
        assert!(data.is_file());
        let reopened = open(&dir);
        assert!(reopened.settings().get().preset("meeting").is_some());
    }

    #[test]
    fn test_read_and_write_notes() {
        let dir = TempDir::new().unwrap();
        let vault = open(&dir);
        let path = vault.normalize_note_path("Folder/Note");
        assert_eq!(path, PathBuf::from("Folder/Note.md"));
        assert!(matches!(
            vault.read_note(&path),
            Err(TemplaterError::NoteNotFound(_))
        ));
        vault.write_note(&path, "hello").unwrap();
        assert_eq!(vault.read_note(&path).unwrap(), "hello");
    }

    #[test]
    fn test_expander_selection() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            templater_command: Some("definitely-not-installed-expander".into()),
            ..Config::default()
        };
        let vault = Vault::open(dir.path(), config, None).unwrap();
        assert!(!vault.expander(true).is_available());
        assert!(!vault.expander(false).is_available());
    }
}
