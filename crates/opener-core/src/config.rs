use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::settings::ProjectIde;

pub const DEFAULT_IDE_PATH: &str = "/Applications/Visual Studio Code.app";
pub const DEFAULT_IDE_NAME: &str = "Visual Studio Code";
pub const DEFAULT_PROJECTS_DIR: &str = "~/Projects";
pub const DEFAULT_SEARCH_DEPTH: usize = 2;
pub const DEFAULT_MAX_RESULTS: usize = 200;

const HOME_ENV: &str = "HOME";
const DATA_DIR_ENV: &str = "PROJECT_OPENER_DATA_DIR";
const ALFRED_WORKFLOW_DATA_ENV: &str = "alfred_workflow_data";
const IDE_PATH_ENV: &str = "PROJECT_OPENER_IDE_PATH";
const IDE_NAME_ENV: &str = "PROJECT_OPENER_IDE_NAME";
const PROJECTS_DIR_ENV: &str = "PROJECT_OPENER_PROJECTS_DIR";
const SEARCH_DEPTH_ENV: &str = "PROJECT_OPENER_SEARCH_DEPTH";
const SHOW_STALE_ENV: &str = "PROJECT_OPENER_SHOW_STALE";
const MAX_RESULTS_ENV: &str = "PROJECT_OPENER_MAX_RESULTS";

const PREFERENCES_FILE: &str = "preferences.toml";
const SOURCES_FILE: &str = "sources.json";
const COLLECTIONS_FILE: &str = "collections.json";
const SETTINGS_FILE: &str = "project-settings.json";
const MANUAL_PROJECTS_FILE: &str = "manual-projects.json";
const MIGRATION_MARKER_FILE: &str = "migration-v2-done";
const CUSTOM_ICONS_DIR: &str = "custom-icons";

/// Host preferences threaded through every scan, query and open call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub home: PathBuf,
    pub data_dir: PathBuf,
    pub ide: ProjectIde,
    /// Raw legacy "projects directory" preference, consumed once by migration.
    pub projects_directory: String,
    /// Raw legacy "search depth" preference; migration falls back to 2 when unparsable.
    pub search_depth: String,
    pub show_stale_indicator: bool,
    pub max_results: usize,
}

/// Optional `preferences.toml` in the data directory. Environment wins over it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PreferencesFile {
    ide_path: Option<String>,
    ide_name: Option<String>,
    projects_directory: Option<String>,
    search_depth: Option<usize>,
    show_stale_indicator: Option<bool>,
    max_results: Option<usize>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env_map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        let home = resolve_home(&env_map);
        let data_dir = resolve_data_dir(&env_map, &home);
        let prefs = load_preferences_file(&data_dir.join(PREFERENCES_FILE));

        let ide_path = non_empty(&env_map, IDE_PATH_ENV)
            .or(prefs.ide_path)
            .unwrap_or_else(|| DEFAULT_IDE_PATH.to_string());
        let ide_name = non_empty(&env_map, IDE_NAME_ENV)
            .or(prefs.ide_name)
            .unwrap_or_else(|| app_name_from_path(&ide_path));

        let projects_directory = non_empty(&env_map, PROJECTS_DIR_ENV)
            .or(prefs.projects_directory)
            .unwrap_or_else(|| DEFAULT_PROJECTS_DIR.to_string());
        let search_depth = non_empty(&env_map, SEARCH_DEPTH_ENV)
            .or_else(|| prefs.search_depth.map(|depth| depth.to_string()))
            .unwrap_or_default();

        let show_stale_indicator = match non_empty(&env_map, SHOW_STALE_ENV) {
            Some(raw) => parse_bool(&raw, SHOW_STALE_ENV)?,
            None => prefs.show_stale_indicator.unwrap_or(true),
        };
        let max_results = match non_empty(&env_map, MAX_RESULTS_ENV) {
            Some(raw) => parse_count(&raw, MAX_RESULTS_ENV)?,
            None => prefs.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        };

        Ok(Self {
            home,
            data_dir,
            ide: ProjectIde {
                path: ide_path,
                name: ide_name,
            },
            projects_directory,
            search_depth,
            show_stale_indicator,
            max_results,
        })
    }

    /// Expand a user supplied path against this config's home directory.
    pub fn expand(&self, raw: &str) -> PathBuf {
        PathBuf::from(expand_path(raw, &self.home.to_string_lossy()))
    }

    pub fn sources_file(&self) -> PathBuf {
        self.data_dir.join(SOURCES_FILE)
    }

    pub fn collections_file(&self) -> PathBuf {
        self.data_dir.join(COLLECTIONS_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn manual_projects_file(&self) -> PathBuf {
        self.data_dir.join(MANUAL_PROJECTS_FILE)
    }

    pub fn migration_marker(&self) -> PathBuf {
        self.data_dir.join(MIGRATION_MARKER_FILE)
    }

    pub fn custom_icons_dir(&self) -> PathBuf {
        self.data_dir.join(CUSTOM_ICONS_DIR)
    }
}

/// Replace a leading `~` with `home`; anything else passes through untouched.
///
/// Expanding an already expanded path is a no-op. No existence check.
pub fn expand_path(raw: &str, home: &str) -> String {
    let Some(rest) = raw.strip_prefix('~') else {
        return raw.to_string();
    };

    let home = home.trim_end_matches('/');
    if rest.is_empty() {
        home.to_string()
    } else if rest.starts_with('/') {
        format!("{home}{rest}")
    } else {
        format!("{home}/{rest}")
    }
}

/// `/Applications/Zed.app` -> `Zed`, `/usr/bin/code` -> `code`.
pub fn app_name_from_path(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    name.strip_suffix(".app").map(str::to_string).unwrap_or(name)
}

fn resolve_home(env_map: &HashMap<String, String>) -> PathBuf {
    non_empty(env_map, HOME_ENV)
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/"))
}

fn resolve_data_dir(env_map: &HashMap<String, String>, home: &Path) -> PathBuf {
    let home = home.to_string_lossy();
    non_empty(env_map, DATA_DIR_ENV)
        .or_else(|| non_empty(env_map, ALFRED_WORKFLOW_DATA_ENV))
        .map(|raw| PathBuf::from(expand_path(&raw, &home)))
        .unwrap_or_else(|| {
            PathBuf::from(home.as_ref())
                .join(".local")
                .join("share")
                .join("project-opener")
        })
}

fn load_preferences_file(path: &Path) -> PreferencesFile {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return PreferencesFile::default(),
    };

    match toml::from_str::<PreferencesFile>(&content) {
        Ok(prefs) => prefs,
        Err(error) => {
            warn!(path = %path.display(), %error, "ignoring malformed preferences file");
            PreferencesFile::default()
        }
    }
}

fn non_empty(env_map: &HashMap<String, String>, key: &str) -> Option<String> {
    env_map
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn parse_bool(raw: &str, field: &'static str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_count(raw: &str, field: &'static str) -> Result<usize, ConfigError> {
    raw.parse::<usize>()
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| ConfigError::InvalidCount {
            field,
            value: raw.to_string(),
        })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {field}: {value} (expected a positive integer)")]
    InvalidCount { field: &'static str, value: String },
    #[error("invalid {field}: {value} (expected true/false)")]
    InvalidBool { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn expand_path_replaces_leading_tilde_only() {
        assert_eq!(expand_path("~/projects", "/Users/tester"), "/Users/tester/projects");
        assert_eq!(expand_path("~", "/Users/tester"), "/Users/tester");
        assert_eq!(expand_path("/tmp/~/x", "/Users/tester"), "/tmp/~/x");
        assert_eq!(expand_path("relative/dir", "/Users/tester"), "relative/dir");
    }

    #[test]
    fn expand_path_is_idempotent() {
        let once = expand_path("~/code", "/home/dev");
        assert_eq!(expand_path(&once, "/home/dev"), once);
    }

    #[test]
    fn config_defaults_apply_when_values_missing() {
        let temp = tempfile::tempdir().expect("temp dir");
        let data_dir = temp.path().to_string_lossy().to_string();
        let config = RuntimeConfig::from_pairs(vec![
            (HOME_ENV, "/Users/tester"),
            (DATA_DIR_ENV, data_dir.as_str()),
        ])
        .expect("defaults should parse");

        assert_eq!(config.home, PathBuf::from("/Users/tester"));
        assert_eq!(config.ide.path, DEFAULT_IDE_PATH);
        assert_eq!(config.ide.name, DEFAULT_IDE_NAME);
        assert_eq!(config.projects_directory, DEFAULT_PROJECTS_DIR);
        assert_eq!(config.search_depth, "");
        assert!(config.show_stale_indicator);
        assert_eq!(config.max_results, DEFAULT_MAX_RESULTS);
    }

    #[test]
    fn config_data_dir_prefers_explicit_env_over_alfred_path() {
        let config = RuntimeConfig::from_pairs(vec![
            (HOME_ENV, "/Users/tester"),
            (ALFRED_WORKFLOW_DATA_ENV, "/tmp/alfred-data"),
            (DATA_DIR_ENV, "~/opener-data"),
        ])
        .expect("data dir should parse");
        assert_eq!(config.data_dir, PathBuf::from("/Users/tester/opener-data"));

        let fallback = RuntimeConfig::from_pairs(vec![(HOME_ENV, "/Users/tester")])
            .expect("fallback should parse");
        assert_eq!(
            fallback.data_dir,
            PathBuf::from("/Users/tester/.local/share/project-opener")
        );
    }

    #[test]
    fn preferences_file_fills_gaps_and_env_overrides_it() {
        let temp = tempfile::tempdir().expect("temp dir");
        fs::write(
            temp.path().join(PREFERENCES_FILE),
            concat!(
                "ide_path = \"/Applications/Zed.app\"\n",
                "search_depth = 3\n",
                "show_stale_indicator = false\n",
            ),
        )
        .expect("write preferences");
        let data_dir = temp.path().to_string_lossy().to_string();

        let config = RuntimeConfig::from_pairs(vec![
            (HOME_ENV, "/Users/tester"),
            (DATA_DIR_ENV, data_dir.as_str()),
            (SHOW_STALE_ENV, "yes"),
        ])
        .expect("preferences should parse");

        assert_eq!(config.ide.path, "/Applications/Zed.app");
        assert_eq!(config.ide.name, "Zed", "ide name derives from the app bundle");
        assert_eq!(config.search_depth, "3");
        assert!(config.show_stale_indicator, "env should override the file");
    }

    #[test]
    fn malformed_preferences_file_is_ignored() {
        let temp = tempfile::tempdir().expect("temp dir");
        fs::write(temp.path().join(PREFERENCES_FILE), "ide_path = [").expect("write");
        let data_dir = temp.path().to_string_lossy().to_string();

        let config = RuntimeConfig::from_pairs(vec![
            (HOME_ENV, "/Users/tester"),
            (DATA_DIR_ENV, data_dir.as_str()),
        ])
        .expect("malformed file should not fail config");
        assert_eq!(config.ide.path, DEFAULT_IDE_PATH);
    }

    #[test]
    fn config_rejects_invalid_numbers_and_bools() {
        let err = RuntimeConfig::from_pairs(vec![(HOME_ENV, "/x"), (MAX_RESULTS_ENV, "abc")])
            .expect_err("non-numeric max results should fail");
        assert_eq!(
            err,
            ConfigError::InvalidCount {
                field: MAX_RESULTS_ENV,
                value: "abc".to_string()
            }
        );

        let err = RuntimeConfig::from_pairs(vec![(HOME_ENV, "/x"), (SHOW_STALE_ENV, "maybe")])
            .expect_err("unknown bool should fail");
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }

    #[test]
    fn app_name_strips_bundle_suffix() {
        assert_eq!(app_name_from_path("/Applications/Cursor.app"), "Cursor");
        assert_eq!(app_name_from_path("/usr/local/bin/nvim"), "nvim");
    }
}
