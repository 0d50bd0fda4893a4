//! Per-project settings keyed by absolute project path.
//!
//! The store never holds an all-empty record: saving one deletes the key.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::{OpenerError, StoreError};
use crate::store::JsonStore;

pub const CUSTOM_ICON_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "icns"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectIde {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ide: Option<ProjectIde>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<i64>,
}

impl ProjectSettings {
    /// True when no field carries a meaningful value.
    pub fn is_empty(&self) -> bool {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().is_none_or(str::is_empty)
        }

        blank(&self.display_name)
            && blank(&self.icon)
            && blank(&self.custom_icon)
            && blank(&self.icon_color)
            && self.ide.is_none()
            && self.collections.as_ref().is_none_or(Vec::is_empty)
            && self.last_opened.is_none_or(|opened| opened == 0)
    }

    pub fn collection_ids(&self) -> &[String] {
        self.collections.as_deref().unwrap_or(&[])
    }
}

pub type SettingsMap = BTreeMap<String, ProjectSettings>;

/// Read-modify-write access to `project-settings.json`.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    store: JsonStore<SettingsMap>,
    custom_icons_dir: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>, custom_icons_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(path),
            custom_icons_dir: custom_icons_dir.into(),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.settings_file(), config.custom_icons_dir())
    }

    pub fn load_all(&self) -> SettingsMap {
        self.store.load_or_default()
    }

    pub fn get(&self, project_path: &str) -> ProjectSettings {
        self.load_all().remove(project_path).unwrap_or_default()
    }

    pub fn save(&self, project_path: &str, settings: ProjectSettings) -> Result<(), StoreError> {
        let mut all = self.load_all();
        if settings.is_empty() {
            all.remove(project_path);
        } else {
            all.insert(project_path.to_string(), settings);
        }
        self.store.save(&all)
    }

    /// Replace the whole document, dropping records that became empty.
    pub fn save_all(&self, mut all: SettingsMap) -> Result<(), StoreError> {
        all.retain(|_, settings| !settings.is_empty());
        self.store.save(&all)
    }

    pub fn delete(&self, project_path: &str) -> Result<(), StoreError> {
        let mut all = self.load_all();
        if all.remove(project_path).is_some() {
            self.store.save(&all)?;
        }
        Ok(())
    }

    pub fn clear_ide(&self, project_path: &str) -> Result<(), StoreError> {
        let mut settings = self.get(project_path);
        if settings.ide.take().is_none() {
            return Ok(());
        }
        self.save(project_path, settings)
    }

    /// Move a record to a new key, e.g. after the project folder was renamed.
    pub fn migrate(&self, old_path: &str, new_path: &str) -> Result<bool, StoreError> {
        let mut all = self.load_all();
        let Some(settings) = all.remove(old_path) else {
            return Ok(false);
        };
        all.insert(new_path.to_string(), settings);
        self.store.save(&all)?;
        Ok(true)
    }

    pub fn set_collections(
        &self,
        project_path: &str,
        collection_ids: Vec<String>,
    ) -> Result<(), StoreError> {
        let mut settings = self.get(project_path);
        settings.collections = Some(collection_ids);
        self.save(project_path, settings)
    }

    pub fn touch_last_opened(&self, project_path: &str, now_ms: i64) -> Result<(), StoreError> {
        let mut settings = self.get(project_path);
        settings.last_opened = Some(now_ms);
        self.save(project_path, settings)
    }

    /// Drop `collection_id` from every record; returns how many records changed.
    pub fn remove_collection_from_all(&self, collection_id: &str) -> Result<usize, StoreError> {
        let all = self.load_all();
        let mut modified = 0;
        let mut pruned = SettingsMap::new();

        for (path, mut settings) in all {
            if let Some(collections) = settings.collections.as_mut() {
                let before = collections.len();
                collections.retain(|id| id != collection_id);
                if collections.len() != before {
                    modified += 1;
                }
            }
            if !settings.is_empty() {
                pruned.insert(path, settings);
            }
        }

        if modified > 0 {
            self.store.save(&pruned)?;
            info!(collection_id, modified, "pruned collection from project settings");
        }
        Ok(modified)
    }

    /// Copy a user picked image into the icon directory under a path-derived name.
    pub fn copy_custom_icon(
        &self,
        project_path: &str,
        source: &Path,
    ) -> Result<PathBuf, OpenerError> {
        let extension = source
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if !CUSTOM_ICON_EXTENSIONS.contains(&extension.as_str()) {
            return Err(OpenerError::UnsupportedIconExtension(
                source.to_string_lossy().to_string(),
            ));
        }
        if !source.is_file() {
            return Err(OpenerError::MissingPath(source.to_path_buf()));
        }

        let digest = format!("{:x}", Sha256::digest(project_path.as_bytes()));
        let destination = self
            .custom_icons_dir
            .join(format!("{}.{extension}", &digest[..12]));

        fs::create_dir_all(&self.custom_icons_dir).map_err(|source_error| OpenerError::IconCopy {
            path: self.custom_icons_dir.clone(),
            source: source_error,
        })?;
        fs::copy(source, &destination).map_err(|source_error| OpenerError::IconCopy {
            path: source.to_path_buf(),
            source: source_error,
        })?;

        Ok(destination)
    }

    /// Remove a previously copied icon. Paths outside the icon directory are left alone.
    pub fn delete_custom_icon(&self, icon_path: &Path) {
        if !icon_path.starts_with(&self.custom_icons_dir) || !icon_path.exists() {
            return;
        }
        if let Err(error) = fs::remove_file(icon_path) {
            debug!(path = %icon_path.display(), %error, "failed to delete custom icon");
        }
    }
}
