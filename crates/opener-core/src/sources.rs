//! Scan sources and manually registered projects, and the aggregation that
//! turns them into one deduplicated project list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::EnhancedProject;
use crate::config::{RuntimeConfig, expand_path};
use crate::error::{OpenerError, StoreError};
use crate::icons::generate_id;
use crate::markers::is_project;
use crate::scanner::{Project, find_projects, sort_by_name};
use crate::settings::ProjectIde;
use crate::store::JsonStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDirectory {
    pub id: String,
    pub path: String,
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ide: Option<ProjectIde>,
}

/// Fields supplied when registering a source; the id is generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSource {
    pub path: String,
    pub depth: usize,
    pub default_collection: Option<String>,
    pub default_ide: Option<ProjectIde>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceUpdate {
    pub depth: Option<usize>,
    pub default_collection: Option<Option<String>>,
    pub default_ide: Option<Option<ProjectIde>>,
}

#[derive(Debug, Clone)]
pub struct SourceStore {
    store: JsonStore<Vec<SourceDirectory>>,
    home: String,
}

impl SourceStore {
    pub fn new(path: impl Into<PathBuf>, home: &Path) -> Self {
        Self {
            store: JsonStore::new(path),
            home: home.to_string_lossy().to_string(),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.sources_file(), &config.home)
    }

    pub fn load(&self) -> Vec<SourceDirectory> {
        self.store.load_or_default()
    }

    pub fn get(&self, id: &str) -> Option<SourceDirectory> {
        self.load().into_iter().find(|source| source.id == id)
    }

    /// Validate and register a source. Nothing is written unless every check passes.
    pub fn add(&self, new: NewSource, now_ms: i64) -> Result<SourceDirectory, OpenerError> {
        let expanded = validate_directory(&new.path, &self.home)?;

        let mut sources = self.load();
        if sources
            .iter()
            .any(|source| expand_path(&source.path, &self.home) == expanded)
        {
            return Err(OpenerError::DuplicateSource(PathBuf::from(expanded)));
        }
        if find_projects(&expanded, new.depth, &self.home).is_empty() {
            return Err(OpenerError::NoProjectsFound {
                path: PathBuf::from(expanded),
                depth: new.depth,
            });
        }

        let source = SourceDirectory {
            id: generate_id("src", now_ms),
            path: expanded,
            depth: new.depth,
            default_collection: new.default_collection,
            default_ide: new.default_ide,
        };
        sources.push(source.clone());
        self.store.save(&sources)?;
        info!(id = %source.id, path = %source.path, depth = source.depth, "added source");
        Ok(source)
    }

    /// Append without validation. Used by the legacy preference migration.
    pub fn insert_unchecked(
        &self,
        new: NewSource,
        now_ms: i64,
    ) -> Result<SourceDirectory, StoreError> {
        let source = SourceDirectory {
            id: generate_id("src", now_ms),
            path: new.path,
            depth: new.depth,
            default_collection: new.default_collection,
            default_ide: new.default_ide,
        };
        let mut sources = self.load();
        sources.push(source.clone());
        self.store.save(&sources)?;
        Ok(source)
    }

    pub fn update(&self, id: &str, update: SourceUpdate) -> Result<SourceDirectory, OpenerError> {
        let mut sources = self.load();
        let source = sources
            .iter_mut()
            .find(|source| source.id == id)
            .ok_or_else(|| OpenerError::UnknownSource(id.to_string()))?;

        if let Some(depth) = update.depth {
            source.depth = depth;
        }
        if let Some(default_collection) = update.default_collection {
            source.default_collection = default_collection;
        }
        if let Some(default_ide) = update.default_ide {
            source.default_ide = default_ide;
        }
        let updated = source.clone();

        self.store.save(&sources)?;
        Ok(updated)
    }

    /// Remove a source. Projects it found simply stop being discovered.
    pub fn delete(&self, id: &str) -> Result<(), OpenerError> {
        let sources = self.load();
        let remaining: Vec<SourceDirectory> = sources
            .iter()
            .filter(|source| source.id != id)
            .cloned()
            .collect();
        if remaining.len() == sources.len() {
            return Err(OpenerError::UnknownSource(id.to_string()));
        }
        self.store.save(&remaining)?;
        info!(id, "deleted source");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualProject {
    pub id: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ide: Option<ProjectIde>,
    pub added_at: i64,
}

#[derive(Debug, Clone)]
pub struct ManualProjectStore {
    store: JsonStore<Vec<ManualProject>>,
    home: String,
}

impl ManualProjectStore {
    pub fn new(path: impl Into<PathBuf>, home: &Path) -> Self {
        Self {
            store: JsonStore::new(path),
            home: home.to_string_lossy().to_string(),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.manual_projects_file(), &config.home)
    }

    pub fn load(&self) -> Vec<ManualProject> {
        self.store.load_or_default()
    }

    pub fn find_by_path(&self, path: &str) -> Option<ManualProject> {
        let wanted = expand_path(path, &self.home);
        self.load()
            .into_iter()
            .find(|project| expand_path(&project.path, &self.home) == wanted)
    }

    pub fn add(
        &self,
        path: &str,
        default_collection: Option<String>,
        default_ide: Option<ProjectIde>,
        now_ms: i64,
    ) -> Result<ManualProject, OpenerError> {
        let expanded = validate_directory(path, &self.home)?;
        if self.find_by_path(&expanded).is_some() {
            return Err(OpenerError::DuplicateProject(PathBuf::from(expanded)));
        }
        if !is_project(Path::new(&expanded)) {
            return Err(OpenerError::NotAProject(PathBuf::from(expanded)));
        }

        let project = ManualProject {
            id: generate_id("manual", now_ms),
            path: expanded,
            default_collection,
            default_ide,
            added_at: now_ms,
        };
        let mut projects = self.load();
        projects.push(project.clone());
        self.store.save(&projects)?;
        info!(id = %project.id, path = %project.path, "added manual project");
        Ok(project)
    }

    pub fn delete(&self, id: &str) -> Result<(), OpenerError> {
        let projects = self.load();
        let remaining: Vec<ManualProject> = projects
            .iter()
            .filter(|project| project.id != id)
            .cloned()
            .collect();
        if remaining.len() == projects.len() {
            return Err(OpenerError::UnknownManualProject(id.to_string()));
        }
        self.store.save(&remaining)?;
        Ok(())
    }
}

pub(crate) fn validate_directory(raw: &str, home: &str) -> Result<String, OpenerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(OpenerError::EmptyPath);
    }
    let expanded = expand_path(raw, home);
    let path = Path::new(&expanded);
    if !path.exists() {
        return Err(OpenerError::MissingPath(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(OpenerError::NotDirectory(path.to_path_buf()));
    }
    Ok(expanded)
}

/// Scan every source in stored order. The first source to report a path owns
/// it; later duplicates are dropped. Projects inherit the source's default
/// collection and are tagged with its id.
pub fn find_projects_from_all_sources(
    sources: &[SourceDirectory],
    home: &str,
) -> Vec<EnhancedProject> {
    let mut seen = HashSet::new();
    let mut projects = Vec::new();

    for source in sources {
        let found = find_projects(&source.path, source.depth, home);
        debug!(source = %source.id, found = found.len(), "scanned source");

        for project in found {
            let key = expand_path(&project.path.to_string_lossy(), home);
            if !seen.insert(key) {
                continue;
            }
            projects.push(EnhancedProject::from_project(
                project,
                source.default_collection.clone(),
                Some(source.id.clone()),
            ));
        }
    }

    sort_by_name(&mut projects, |project| project.name.as_str());
    projects
}

/// Append manual projects whose path no source already reported.
pub fn merge_manual_projects(
    projects: &mut Vec<EnhancedProject>,
    manual: &[ManualProject],
    home: &str,
) {
    let mut seen: HashSet<String> = projects
        .iter()
        .map(|project| expand_path(&project.path.to_string_lossy(), home))
        .collect();

    for entry in manual {
        let expanded = expand_path(&entry.path, home);
        if !seen.insert(expanded.clone()) {
            continue;
        }
        let path = PathBuf::from(&expanded);
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let Some(project) = Project::new(path, &root) else {
            continue;
        };
        projects.push(EnhancedProject::from_project(
            project,
            entry.default_collection.clone(),
            None,
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn new_source(path: &str, depth: usize) -> NewSource {
        NewSource {
            path: path.to_string(),
            depth,
            ..Default::default()
        }
    }

    const NOW: i64 = 1_750_000_000_000;

    fn make_project(root: &Path, relative: &str) -> PathBuf {
        let dir = root.join(relative);
        fs::create_dir_all(&dir).expect("create project dir");
        fs::write(dir.join("package.json"), "{}").expect("write marker");
        dir
    }

    fn source(id: &str, path: &Path, depth: usize, collection: Option<&str>) -> SourceDirectory {
        SourceDirectory {
            id: id.into(),
            path: path.to_string_lossy().to_string(),
            depth,
            default_collection: collection.map(str::to_string),
            default_ide: None,
        }
    }

    fn stores(data: &TempDir, home: &Path) -> (SourceStore, ManualProjectStore) {
        (
            SourceStore::new(data.path().join("sources.json"), home),
            ManualProjectStore::new(data.path().join("manual-projects.json"), home),
        )
    }

    #[test]
    fn overlapping_sources_keep_first_owner() {
        let tree = tempfile::tempdir().expect("tree");
        make_project(tree.path(), "work/alpha");
        make_project(tree.path(), "work/beta");

        let sources = vec![
            source("src_work", &tree.path().join("work"), 0, Some("coll_work")),
            source("src_all", tree.path(), 1, None),
        ];
        let projects = find_projects_from_all_sources(&sources, "/home/none");

        assert_eq!(projects.len(), 2);
        for project in &projects {
            assert_eq!(project.source_id.as_deref(), Some("src_work"));
            assert_eq!(project.collections, vec!["coll_work".to_string()]);
        }
        assert_eq!(projects[0].name, "alpha");
    }

    #[test]
    fn source_without_default_collection_yields_empty_list() {
        let tree = tempfile::tempdir().expect("tree");
        make_project(tree.path(), "solo");
        let projects = find_projects_from_all_sources(&[source("s", tree.path(), 0, None)], "/h");
        assert_eq!(projects.len(), 1);
        assert!(projects[0].collections.is_empty());
    }

    #[test]
    fn add_source_validates_before_writing() {
        let data = tempfile::tempdir().expect("data");
        let tree = tempfile::tempdir().expect("tree");
        let (sources, _) = stores(&data, tree.path());

        assert!(matches!(sources.add(NewSource::default(), NOW), Err(OpenerError::EmptyPath)));
        assert!(matches!(
            sources.add(new_source("~/absent", 1), NOW),
            Err(OpenerError::MissingPath(_))
        ));

        fs::create_dir_all(tree.path().join("empty")).expect("mkdir");
        assert!(matches!(
            sources.add(new_source("~/empty", 2), NOW),
            Err(OpenerError::NoProjectsFound { depth: 2, .. })
        ));
        assert!(
            !data.path().join("sources.json").exists(),
            "failed validation writes nothing"
        );

        make_project(tree.path(), "code/app");
        let added = sources
            .add(new_source("~/code", 0), NOW)
            .expect("add source");
        assert!(added.id.starts_with(&format!("src_{NOW}_")));
        assert_eq!(PathBuf::from(&added.path), tree.path().join("code"));

        let duplicate = sources.add(new_source(&added.path, 3), NOW);
        assert!(matches!(duplicate, Err(OpenerError::DuplicateSource(_))));
        assert_eq!(sources.load().len(), 1);
    }

    #[test]
    fn update_and_delete_source() {
        let data = tempfile::tempdir().expect("data");
        let tree = tempfile::tempdir().expect("tree");
        make_project(tree.path(), "app");
        let (sources, _) = stores(&data, tree.path());
        let added = sources
            .add(new_source("~", 0), NOW)
            .expect("add");

        let updated = sources
            .update(
                &added.id,
                SourceUpdate {
                    depth: Some(3),
                    default_collection: Some(Some("coll_x".into())),
                    ..Default::default()
                },
            )
            .expect("update");
        assert_eq!(updated.depth, 3);
        assert_eq!(sources.get(&added.id), Some(updated));

        sources.delete(&added.id).expect("delete");
        assert!(sources.load().is_empty());
        assert!(matches!(sources.delete(&added.id), Err(OpenerError::UnknownSource(_))));
    }

    #[test]
    fn manual_project_requires_markers_and_rejects_duplicates() {
        let data = tempfile::tempdir().expect("data");
        let tree = tempfile::tempdir().expect("tree");
        let (_, manual) = stores(&data, tree.path());

        fs::create_dir_all(tree.path().join("plain")).expect("mkdir");
        assert!(matches!(
            manual.add("~/plain", None, None, NOW),
            Err(OpenerError::NotAProject(_))
        ));

        make_project(tree.path(), "tool");
        let added = manual.add("~/tool", Some("coll_a".into()), None, NOW).expect("add");
        assert!(added.id.starts_with("manual_"));
        assert_eq!(added.added_at, NOW);
        assert!(matches!(
            manual.add(&added.path, None, None, NOW),
            Err(OpenerError::DuplicateProject(_))
        ));
        assert_eq!(manual.find_by_path("~/tool").map(|p| p.id), Some(added.id.clone()));

        manual.delete(&added.id).expect("delete");
        assert!(manual.load().is_empty());
    }

    #[test]
    fn manual_projects_join_after_sources_and_lose_to_them() {
        let tree = tempfile::tempdir().expect("tree");
        let shared = make_project(tree.path(), "src/shared");
        let extra = make_project(tree.path(), "elsewhere/extra");

        let mut projects =
            find_projects_from_all_sources(&[source("s", &tree.path().join("src"), 0, None)], "/h");
        let manual = vec![
            ManualProject {
                id: "manual_1".into(),
                path: shared.to_string_lossy().to_string(),
                default_collection: Some("coll_manual".into()),
                default_ide: None,
                added_at: NOW,
            },
            ManualProject {
                id: "manual_2".into(),
                path: extra.to_string_lossy().to_string(),
                default_collection: Some("coll_manual".into()),
                default_ide: None,
                added_at: NOW,
            },
        ];
        merge_manual_projects(&mut projects, &manual, "/h");

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].source_id.as_deref(), Some("s"));
        assert!(projects[0].collections.is_empty());
        assert_eq!(projects[1].name, "extra");
        assert_eq!(projects[1].collections, vec!["coll_manual".to_string()]);
    }
}
