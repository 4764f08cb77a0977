//! Template discovery inside a vault.

use crate::error::{Result, TemplaterError};
use crate::parser::parse_frontmatter;
use crate::settings::Settings;
use crate::types::{Frontmatter, RESERVED_CONFIG_KEY, Template};
use glob::glob;
use serde::Serialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A template file, without its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    /// Vault-relative path with forward slashes.
    pub path: String,
}

/// The template folder of a vault.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    vault_root: PathBuf,
    folder: String,
}

impl TemplateLibrary {
    /// `folder` is relative to the vault root.
    pub fn new(vault_root: impl Into<PathBuf>, folder: impl Into<String>) -> Result<Self> {
        let vault_root = vault_root.into();
        if !vault_root.is_dir() {
            return Err(TemplaterError::VaultNotFound(vault_root));
        }
        Ok(Self {
            vault_root,
            folder: folder.into().trim_matches('/').to_string(),
        })
    }

    pub fn from_settings(vault_root: impl Into<PathBuf>, settings: &Settings) -> Result<Self> {
        Self::new(vault_root, settings.template_folder_path.clone())
    }

    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    fn folder_path(&self) -> PathBuf {
        if self.folder.is_empty() {
            self.vault_root.clone()
        } else {
            self.vault_root.join(&self.folder)
        }
    }

    /// All markdown files under the template folder, sorted by path.
    pub fn list(&self) -> Result<Vec<TemplateInfo>> {
        let folder = self.folder_path();
        if !folder.is_dir() {
            return Ok(Vec::new());
        }

        let pattern = folder.join("**/*.md");
        let mut templates = Vec::new();
        for entry in glob(&pattern.to_string_lossy())? {
            match entry {
                Ok(path) => {
                    let Ok(relative) = path.strip_prefix(&self.vault_root) else {
                        continue;
                    };
                    let hidden = relative
                        .components()
                        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
                    if !hidden {
                        templates.push(info_for(relative));
                    }
                }
                Err(e) => warn!(error = %e, "glob error while listing templates"),
            }
        }
        templates.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(templates)
    }

    /// Load a template by vault-relative path, path inside the template
    /// folder, or name.
    pub fn load(&self, reference: &str) -> Result<Template> {
        let info = self.resolve(reference)?;
        let content = std::fs::read_to_string(self.vault_root.join(&info.path))?;
        Ok(Template::new(info.path, content))
    }

    fn resolve(&self, reference: &str) -> Result<TemplateInfo> {
        let reference = reference.trim().trim_start_matches('/');
        let with_ext = if reference.ends_with(".md") {
            reference.to_string()
        } else {
            format!("{}.md", reference)
        };

        for candidate in [
            PathBuf::from(&with_ext),
            self.folder_path()
                .strip_prefix(&self.vault_root)
                .map(|folder| folder.join(&with_ext))
                .unwrap_or_else(|_| PathBuf::from(&with_ext)),
        ] {
            if self.vault_root.join(&candidate).is_file() {
                return Ok(info_for(&candidate));
            }
        }

        let name = reference.trim_end_matches(".md");
        self.list()?
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TemplaterError::TemplateNotFound(reference.to_string()))
    }

    /// Case-insensitive substring search on name and path. An empty query
    /// returns every template, with `recent` paths first in their given order.
    pub fn search(&self, query: &str, recent: &[String]) -> Result<Vec<TemplateInfo>> {
        let all = self.list()?;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            let mut ordered: Vec<TemplateInfo> = recent
                .iter()
                .filter_map(|path| all.iter().find(|t| &t.path == path).cloned())
                .collect();
            ordered.extend(all.into_iter().filter(|t| !recent.contains(&t.path)));
            return Ok(ordered);
        }
        Ok(all
            .into_iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&query) || t.path.to_lowercase().contains(&query)
            })
            .collect())
    }
}

fn info_for(relative: &Path) -> TemplateInfo {
    TemplateInfo {
        name: relative
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    }
}

/// Preset ids a template binds itself to through `fast-templater-config`.
///
/// Accepts a string (comma-separated ids), a list of strings, or a mapping
/// with a `presets` or `preset` entry.
pub fn bound_preset_ids(frontmatter: &Frontmatter) -> Vec<String> {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.extend(
                s.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
            ),
            Value::Sequence(items) => items.iter().for_each(|item| collect(item, out)),
            Value::Mapping(map) => {
                for key in ["presets", "preset"] {
                    if let Some(inner) = map.get(key) {
                        collect(inner, out);
                    }
                }
            }
            _ => {}
        }
    }

    let mut ids = Vec::new();
    if let Some(config) = frontmatter.get(RESERVED_CONFIG_KEY) {
        collect(config, &mut ids);
    }
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids
}

/// Preset ids bound by a template's own frontmatter.
pub fn template_bound_preset_ids(template: &Template) -> Vec<String> {
    bound_preset_ids(&parse_frontmatter(&template.content).frontmatter)
}
