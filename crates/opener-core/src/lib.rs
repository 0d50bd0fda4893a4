//! Project discovery, classification and search for the project opener.
//!
//! - `scanner` / `markers` / `git`: bounded directory walk, project markers,
//!   language detection and origin owner parsing.
//! - `sources`: scan sources, manual projects and multi-source aggregation.
//! - `catalog`: enrichment with persisted settings into `ProjectEntry` values.
//! - `query` / `matcher`: the search filter language and its evaluation.
//! - `collections` / `recency`: manual and rule-based collections, time windows.
//! - `grouping` / `feedback` / `suggest`: list sections and their payload.
//! - `settings` / `store` / `migration`: JSON persistence.
//! - `launcher`: handing a project to an editor.

pub mod catalog;
pub mod collections;
pub mod config;
pub mod error;
pub mod feedback;
pub mod git;
pub mod grouping;
pub mod icons;
pub mod launcher;
pub mod markers;
pub mod matcher;
pub mod migration;
pub mod output_contract;
pub mod query;
pub mod recency;
pub mod scanner;
pub mod settings;
pub mod sources;
pub mod store;
pub mod suggest;

pub use catalog::{
    EnhancedProject, ProjectEntry, Relocation, build_catalog, relocate_project,
};
pub use collections::{
    AutoCriteria, AutoKind, Collection, CollectionKind, CollectionRef, CollectionStore,
    CollectionUpdate, auto_collections, matches_auto_collection,
};
pub use config::{ConfigError, RuntimeConfig, expand_path};
pub use error::{OpenerError, StoreError};
pub use feedback::{ListItem, ListSection, RenderOptions, render_entries};
pub use git::extract_git_org;
pub use grouping::{GroupingMode, ProjectSection, group_entries};
pub use launcher::{CommandLauncher, Launcher, open_project, resolve_ide};
pub use markers::{Language, detect_language, is_project};
pub use matcher::{MatchContext, matches_search};
pub use query::{ParsedQuery, SearchFilters, parse_search_query};
pub use recency::{format_relative_time, is_recent_project, is_stale_project, now_ms};
pub use scanner::{Project, find_projects};
pub use settings::{ProjectIde, ProjectSettings, SettingsStore};
pub use sources::{
    ManualProjectStore, NewSource, SourceDirectory, SourceStore, find_projects_from_all_sources,
};
