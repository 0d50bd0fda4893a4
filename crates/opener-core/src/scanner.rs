use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::expand_path;
use crate::markers::is_project;

/// Directory names never walked into, at any depth.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "vendor",
    "target",
    ".next",
    ".venv",
    "venv",
    "__pycache__",
    ".cache",
    "coverage",
    ".turbo",
    ".output",
];

/// A project root observed on disk during the latest scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub relative_path: String,
}

impl Project {
    pub fn new(path: PathBuf, root: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_string();
        if name.is_empty() {
            return None;
        }

        let relative_path = path
            .strip_prefix(root)
            .map(|relative| relative.to_string_lossy().to_string())
            .unwrap_or_default();
        let relative_path = if relative_path.is_empty() {
            name.clone()
        } else {
            relative_path
        };

        Some(Self {
            name,
            path,
            relative_path,
        })
    }
}

/// Walk `root_dir` looking for project roots.
///
/// Depth 0 only inspects the root's immediate children; each extra level of
/// `max_depth` lets the walk descend one more non-project directory. A
/// directory that qualifies as a project is recorded and never descended into,
/// so nested packages inside a project are not reported. Unreadable
/// directories count as empty.
pub fn find_projects(root_dir: &str, max_depth: usize, home: &str) -> Vec<Project> {
    let root = PathBuf::from(expand_path(root_dir, home));
    let mut projects = Vec::new();

    // Children of a directory visited at scan depth `d` sit at walk depth `d + 1`.
    let mut walker = WalkDir::new(&root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth.saturating_add(1))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || is_walkable(entry));

    loop {
        let entry = match walker.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(error)) => {
                debug!(%error, "skipping unreadable entry during project scan");
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        if is_project(entry.path()) {
            if let Some(project) = Project::new(entry.path().to_path_buf(), &root) {
                projects.push(project);
            }
            walker.skip_current_dir();
        }
    }

    sort_by_name(&mut projects, |project| project.name.as_str());
    projects
}

fn is_walkable(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    !name.starts_with('.') && !EXCLUDED_DIRS.contains(&name.as_ref())
}

/// Case-folded comparison with a case-sensitive tiebreak, close to a
/// locale-aware collation for the ASCII-dominated names projects use.
pub fn compare_names(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

pub fn sort_by_name<T, F>(items: &mut [T], name: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|left, right| compare_names(name(left), name(right)));
}
