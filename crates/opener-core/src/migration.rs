//! One-time conversion of the legacy single "projects directory + depth"
//! preference into a source record.

use chrono::Utc;
use tracing::info;

use crate::config::{DEFAULT_SEARCH_DEPTH, RuntimeConfig};
use crate::error::StoreError;
use crate::sources::{NewSource, SourceDirectory, SourceStore};
use crate::store::write_atomic;

pub fn needs_migration(config: &RuntimeConfig) -> bool {
    if config.migration_marker().exists() {
        return false;
    }
    SourceStore::from_config(config).load().is_empty()
}

/// Register the legacy directory as a source and drop the marker.
///
/// An unparsable depth falls back to 2. The directory is not validated.
pub fn migrate_legacy_preferences(
    config: &RuntimeConfig,
    projects_directory: &str,
    search_depth: &str,
    now_ms: i64,
) -> Result<SourceDirectory, StoreError> {
    let depth = parse_depth(search_depth);
    let source = SourceStore::from_config(config).insert_unchecked(
        NewSource {
            path: projects_directory.to_string(),
            depth,
            ..NewSource::default()
        },
        now_ms,
    )?;

    let marker = config.migration_marker();
    write_atomic(&marker, Utc::now().to_rfc3339().as_bytes())
        .map_err(|source| StoreError::from_io(marker.clone(), source))?;

    info!(path = %source.path, depth, "migrated legacy projects directory");
    Ok(source)
}

/// Returns the created source when a migration ran.
pub fn run_migration_if_needed(
    config: &RuntimeConfig,
    now_ms: i64,
) -> Result<Option<SourceDirectory>, StoreError> {
    if !needs_migration(config) {
        return Ok(None);
    }
    migrate_legacy_preferences(config, &config.projects_directory, &config.search_depth, now_ms)
        .map(Some)
}

fn parse_depth(raw: &str) -> usize {
    raw.trim().parse().unwrap_or(DEFAULT_SEARCH_DEPTH)
}
