//! The enriched project list: scan results joined with persisted settings,
//! language and git organization, plus "missing" entries for settings whose
//! folder is gone.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{RuntimeConfig, expand_path};
use crate::error::{OpenerError, StoreError};
use crate::git::extract_git_org;
use crate::icons::random_icon_color;
use crate::markers::{Language, detect_language, is_project};
use crate::migration::run_migration_if_needed;
use crate::scanner::{Project, compare_names};
use crate::settings::{ProjectSettings, SettingsMap, SettingsStore};
use crate::sources::{
    ManualProjectStore, SourceStore, find_projects_from_all_sources, merge_manual_projects,
    validate_directory,
};

/// A project plus everything the query engine looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedProject {
    pub name: String,
    pub path: PathBuf,
    pub relative_path: String,
    pub collections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_lang: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_org: Option<String>,
}

impl EnhancedProject {
    pub fn from_project(
        project: Project,
        default_collection: Option<String>,
        source_id: Option<String>,
    ) -> Self {
        Self {
            name: project.name,
            path: project.path,
            relative_path: project.relative_path,
            collections: default_collection.into_iter().collect(),
            last_opened: None,
            source_id,
            detected_lang: None,
            git_org: None,
        }
    }

    pub fn path_key(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    #[serde(flatten)]
    pub project: EnhancedProject,
    pub settings: ProjectSettings,
    pub missing: bool,
    /// A per-project IDE override points at something that no longer exists.
    pub invalid_ide: bool,
}

impl ProjectEntry {
    /// Display name when set, else the folder name.
    pub fn title(&self) -> &str {
        self.settings
            .display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.project.name)
    }
}

pub fn is_valid_ide(ide_path: &str) -> bool {
    !ide_path.is_empty() && Path::new(ide_path).exists()
}

/// Scan, enrich and order every known project.
///
/// Runs the legacy migration first. Projects seen for the first time get a
/// palette color persisted into their settings.
pub fn build_catalog(config: &RuntimeConfig, now: i64) -> Result<Vec<ProjectEntry>, StoreError> {
    run_migration_if_needed(config, now)?;

    let home = config.home.to_string_lossy();
    let sources = SourceStore::from_config(config).load();
    let mut projects = find_projects_from_all_sources(&sources, &home);
    merge_manual_projects(&mut projects, &ManualProjectStore::from_config(config).load(), &home);

    let settings_store = SettingsStore::from_config(config);
    let mut all_settings = settings_store.load_all();
    let colored = assign_missing_colors(&projects, &mut all_settings);
    if colored > 0 {
        if let Err(error) = settings_store.save_all(all_settings.clone()) {
            warn!(%error, "failed to persist project colors");
        }
    }

    Ok(enrich(projects, &all_settings))
}

fn assign_missing_colors(projects: &[EnhancedProject], all: &mut SettingsMap) -> usize {
    let mut colored = 0;
    for project in projects {
        let settings = all.entry(project.path_key()).or_default();
        if settings.icon_color.as_deref().is_none_or(str::is_empty) {
            settings.icon_color = Some(random_icon_color().to_string());
            colored += 1;
        }
    }
    if colored > 0 {
        debug!(colored, "assigned colors to newly discovered projects");
    }
    colored
}

/// Join discovered projects with their settings and append missing entries.
pub fn enrich(projects: Vec<EnhancedProject>, all_settings: &SettingsMap) -> Vec<ProjectEntry> {
    let discovered: HashSet<String> = projects.iter().map(EnhancedProject::path_key).collect();
    let mut entries = Vec::with_capacity(projects.len());

    for mut project in projects {
        let settings = all_settings.get(&project.path_key()).cloned().unwrap_or_default();
        if !settings.collection_ids().is_empty() {
            project.collections = settings.collection_ids().to_vec();
        }
        project.last_opened = settings.last_opened;
        project.detected_lang = detect_language(&project.path);
        project.git_org = extract_git_org(&project.path);

        entries.push(ProjectEntry {
            invalid_ide: has_invalid_ide(&settings),
            project,
            settings,
            missing: false,
        });
    }

    for (saved_path, settings) in all_settings {
        if discovered.contains(saved_path) {
            continue;
        }
        let name = saved_path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(saved_path.as_str())
            .to_string();
        entries.push(ProjectEntry {
            project: EnhancedProject {
                name,
                path: PathBuf::from(saved_path),
                relative_path: saved_path.clone(),
                collections: settings.collection_ids().to_vec(),
                last_opened: settings.last_opened,
                source_id: None,
                detected_lang: None,
                git_org: None,
            },
            invalid_ide: has_invalid_ide(settings),
            settings: settings.clone(),
            missing: true,
        });
    }

    entries.sort_by(|left, right| {
        left.missing
            .cmp(&right.missing)
            .then_with(|| compare_names(&left.project.name, &right.project.name))
    });
    entries
}

fn has_invalid_ide(settings: &ProjectSettings) -> bool {
    settings.ide.as_ref().is_some_and(|ide| !is_valid_ide(&ide.path))
}

/// Outcome of pointing a project's settings at a new folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    pub from: String,
    pub to: String,
    /// False when no settings were stored under `from`.
    pub moved: bool,
}

/// Move a missing project's settings to the folder it now lives in.
/// The target must be an existing project directory; nothing is written otherwise.
pub fn relocate_project(
    config: &RuntimeConfig,
    old_path: &str,
    new_path: &str,
) -> Result<Relocation, OpenerError> {
    let old_path = old_path.trim();
    if old_path.is_empty() {
        return Err(OpenerError::EmptyPath);
    }
    let home = config.home.to_string_lossy();
    let from = expand_path(old_path, &home);
    let to = validate_directory(new_path, &home)?;
    if !is_project(Path::new(&to)) {
        return Err(OpenerError::NotAProject(PathBuf::from(to)));
    }

    let moved = SettingsStore::from_config(config).migrate(&from, &to)?;
    if moved {
        info!(%from, %to, "relocated project settings");
    }
    Ok(Relocation { from, to, moved })
}
