use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use opener_core::collections::CollectionUpdate;
use opener_core::config::{DEFAULT_SEARCH_DEPTH, app_name_from_path};
use opener_core::icons::{ICON_COLORS, ICON_OPTIONS, icon_option};
use opener_core::migration::run_migration_if_needed;
use opener_core::output_contract::{
    OutputMode, build_error_envelope, build_success_envelope, select_output_mode,
};
use opener_core::sources::SourceUpdate;
use opener_core::suggest::suggest_filters;
use opener_core::{
    CollectionStore, CommandLauncher, GroupingMode, ListSection, ManualProjectStore, MatchContext,
    NewSource, OpenerError, ProjectEntry, ProjectIde, RenderOptions, RuntimeConfig, SettingsStore,
    SourceStore, StoreError, build_catalog, group_entries, matches_search, now_ms, open_project,
    parse_search_query, relocate_project, render_entries,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PROJECT_OPENER_LOG";

#[derive(Debug, Parser)]
#[command(author, version, about = "Find, organize and open local projects")]
struct Cli {
    /// Explicit output mode (`human`, `json`).
    #[arg(long, value_enum, global = true)]
    output: Option<OutputModeArg>,
    /// Shorthand for `--output json`.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan every source and list matching projects.
    Search {
        /// Free text plus `#collection`, `lang:`, `org:` and `in:` filters.
        #[arg(long, short, default_value = "")]
        query: String,
        #[arg(long, value_enum, default_value_t = GroupArg::Collection)]
        group: GroupArg,
    },
    /// Open a project in its resolved editor and record the visit.
    Open {
        #[arg(long)]
        path: String,
    },
    /// Manage scanned source directories.
    Source {
        #[command(subcommand)]
        command: SourceCommand,
    },
    /// Manage individually registered projects.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Manage manual collections.
    Collection {
        #[command(subcommand)]
        command: CollectionCommand,
    },
    /// Inspect or edit per-project settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Complete a partially typed filter token.
    Suggest {
        #[arg(long, short, default_value = "")]
        query: String,
    },
    /// Convert the legacy projects directory preference into a source.
    Migrate,
}

#[derive(Debug, Subcommand)]
enum SourceCommand {
    Add {
        #[arg(long)]
        path: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_DEPTH)]
        depth: usize,
        /// Collection id or name assigned to every project found here.
        #[arg(long)]
        collection: Option<String>,
        /// Editor application path used for projects from this source.
        #[arg(long)]
        ide: Option<String>,
    },
    List,
    /// Change depth or defaults of an existing source.
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        depth: Option<usize>,
        #[arg(long, conflicts_with = "clear_collection")]
        collection: Option<String>,
        #[arg(long)]
        clear_collection: bool,
        #[arg(long, conflicts_with = "clear_ide")]
        ide: Option<String>,
        #[arg(long)]
        clear_ide: bool,
    },
    Remove {
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    Add {
        #[arg(long)]
        path: String,
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        ide: Option<String>,
    },
    Remove {
        #[arg(long)]
        id: String,
    },
    /// Carry a moved project's settings over to its new folder.
    Relocate {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

#[derive(Debug, Subcommand)]
enum CollectionCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    Rename {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
    List,
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show {
        #[arg(long)]
        path: String,
    },
    Set {
        #[arg(long)]
        path: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        ide: Option<String>,
        /// Image file copied into the data directory and used as the icon.
        #[arg(long)]
        custom_icon: Option<PathBuf>,
    },
    Clear {
        #[arg(long)]
        path: String,
        /// Only drop the editor override.
        #[arg(long)]
        ide_only: bool,
    },
    Assign {
        #[arg(long)]
        path: String,
        /// Collection id or name; repeat for several. None clears the assignment.
        #[arg(long = "collection")]
        collections: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputModeArg {
    Human,
    Json,
}

impl From<OutputModeArg> for OutputMode {
    fn from(value: OutputModeArg) -> Self {
        match value {
            OutputModeArg::Human => OutputMode::Human,
            OutputModeArg::Json => OutputMode::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupArg {
    Collection,
    Recency,
    Flat,
}

impl From<GroupArg> for GroupingMode {
    fn from(value: GroupArg) -> Self {
        match value {
            GroupArg::Collection => GroupingMode::Collection,
            GroupArg::Recency => GroupingMode::Recency,
            GroupArg::Flat => GroupingMode::Flat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorKind {
    User,
    Runtime,
}

#[derive(Debug)]
struct AppError {
    kind: ErrorKind,
    code: &'static str,
    message: String,
}

impl AppError {
    fn user(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::User,
            code,
            message: message.into(),
        }
    }

    fn runtime(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            code,
            message: message.into(),
        }
    }

    fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::User => 2,
            ErrorKind::Runtime => 1,
        }
    }
}

const ERROR_CODE_USER_INVALID_PATH: &str = "user.invalid_path";
const ERROR_CODE_USER_DUPLICATE: &str = "user.duplicate";
const ERROR_CODE_USER_NO_PROJECTS: &str = "user.no_projects";
const ERROR_CODE_USER_NOT_FOUND: &str = "user.not_found";
const ERROR_CODE_USER_INVALID_INPUT: &str = "user.invalid_input";
const ERROR_CODE_USER_INVALID_CONFIG: &str = "user.invalid_config";
const ERROR_CODE_USER_OUTPUT_MODE_CONFLICT: &str = "user.output_mode_conflict";
const ERROR_CODE_RUNTIME_STORE_WRITE: &str = "runtime.store_write_failed";
const ERROR_CODE_RUNTIME_ICON_COPY: &str = "runtime.icon_copy_failed";
const ERROR_CODE_RUNTIME_LAUNCH: &str = "runtime.launch_failed";
const ERROR_CODE_RUNTIME_SERIALIZE: &str = "runtime.serialize_failed";

impl Cli {
    fn command_name(&self) -> &'static str {
        match &self.command {
            Commands::Search { .. } => "opener.search",
            Commands::Open { .. } => "opener.open",
            Commands::Source { command } => match command {
                SourceCommand::Add { .. } => "opener.source.add",
                SourceCommand::List => "opener.source.list",
                SourceCommand::Update { .. } => "opener.source.update",
                SourceCommand::Remove { .. } => "opener.source.remove",
            },
            Commands::Project { command } => match command {
                ProjectCommand::Add { .. } => "opener.project.add",
                ProjectCommand::Remove { .. } => "opener.project.remove",
                ProjectCommand::Relocate { .. } => "opener.project.relocate",
            },
            Commands::Collection { command } => match command {
                CollectionCommand::Create { .. } => "opener.collection.create",
                CollectionCommand::Rename { .. } => "opener.collection.rename",
                CollectionCommand::Delete { .. } => "opener.collection.delete",
                CollectionCommand::List => "opener.collection.list",
            },
            Commands::Settings { command } => match command {
                SettingsCommand::Show { .. } => "opener.settings.show",
                SettingsCommand::Set { .. } => "opener.settings.set",
                SettingsCommand::Clear { .. } => "opener.settings.clear",
                SettingsCommand::Assign { .. } => "opener.settings.assign",
            },
            Commands::Suggest { .. } => "opener.suggest",
            Commands::Migrate => "opener.migrate",
        }
    }

    fn output_mode_hint(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            self.output.map(Into::into).unwrap_or(OutputMode::Human)
        }
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let command = cli.command_name();
    let output_mode = cli.output_mode_hint();

    match run(cli) {
        Ok(stdout) => {
            println!("{stdout}");
        }
        Err(err) => {
            emit_error(command, output_mode, &err);
            std::process::exit(err.exit_code());
        }
    }
}

/// Logs go to stderr so stdout stays a clean payload.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<String, AppError> {
    let config = RuntimeConfig::from_env()
        .map_err(|error| AppError::user(ERROR_CODE_USER_INVALID_CONFIG, error.to_string()))?;
    run_with_config(cli, &config)
}

fn run_with_config(cli: Cli, config: &RuntimeConfig) -> Result<String, AppError> {
    let command_name = cli.command_name();
    let mode = select_output_mode(cli.output.map(Into::into), cli.json, OutputMode::Human)
        .map_err(|error| AppError::user(ERROR_CODE_USER_OUTPUT_MODE_CONFLICT, error.to_string()))?;
    let now = now_ms();
    debug!(command = command_name, mode = mode.as_str(), "dispatching command");

    match cli.command {
        Commands::Search { query, group } => {
            let sections = search(config, &query, group.into(), now)?;
            respond(mode, command_name, &sections, || render_sections_human(&sections))
        }
        Commands::Open { path } => {
            let (path, ide) =
                open_project(config, &CommandLauncher, &path, now).map_err(map_opener_error)?;
            let path = path.to_string_lossy().to_string();
            let human = format!("Opened {path} in {}", ide.name);
            respond(mode, command_name, &json!({ "path": path, "ide": ide }), || human)
        }
        Commands::Source { command } => run_source(config, command, mode, command_name, now),
        Commands::Project { command } => run_project(config, command, mode, command_name, now),
        Commands::Collection { command } => {
            run_collection(config, command, mode, command_name, now)
        }
        Commands::Settings { command } => run_settings(config, command, mode, command_name),
        Commands::Suggest { query } => {
            let catalog = build_catalog(config, now).map_err(map_store_error)?;
            let collections = CollectionStore::from_config(config).all();
            let suggestions = suggest_filters(&query, &catalog, &collections);
            respond(mode, command_name, &suggestions, || {
                suggestions
                    .iter()
                    .map(|suggestion| match &suggestion.subtitle {
                        Some(subtitle) => format!("{} | {subtitle}", suggestion.filter),
                        None => suggestion.filter.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Commands::Migrate => {
            let migrated = run_migration_if_needed(config, now).map_err(map_store_error)?;
            let human = match &migrated {
                Some(source) => format!(
                    "Migrated {} (depth {}) into {}",
                    source.path, source.depth, source.id
                ),
                None => "Nothing to migrate".to_string(),
            };
            respond(
                mode,
                command_name,
                &json!({ "migrated": migrated.is_some(), "source": migrated }),
                || human,
            )
        }
    }
}

fn search(
    config: &RuntimeConfig,
    query: &str,
    group: GroupingMode,
    now: i64,
) -> Result<Vec<ListSection>, AppError> {
    let catalog = build_catalog(config, now).map_err(map_store_error)?;
    let collections = CollectionStore::from_config(config).all();
    let parsed = parse_search_query(query);
    let home = config.home.to_string_lossy();
    let ctx = MatchContext {
        collections: &collections,
        home: &home,
        now,
    };

    let matched: Vec<ProjectEntry> = catalog
        .into_iter()
        .filter(|entry| matches_search(&entry.project, &parsed, &ctx))
        .take(config.max_results)
        .collect();
    let sections = group_entries(&matched, group, &collections, now);

    Ok(render_entries(
        &sections,
        &collections,
        RenderOptions {
            show_stale_indicator: config.show_stale_indicator,
            now,
        },
    ))
}

fn run_source(
    config: &RuntimeConfig,
    command: SourceCommand,
    mode: OutputMode,
    command_name: &str,
    now: i64,
) -> Result<String, AppError> {
    let store = SourceStore::from_config(config);
    match command {
        SourceCommand::Add {
            path,
            depth,
            collection,
            ide,
        } => {
            let default_collection = collection
                .map(|raw| resolve_manual_collection(config, &raw))
                .transpose()?;
            let source = store
                .add(
                    NewSource {
                        path,
                        depth,
                        default_collection,
                        default_ide: ide.as_deref().map(ide_from_path),
                    },
                    now,
                )
                .map_err(map_opener_error)?;
            let human = format!("Added source {} ({})", source.path, source.id);
            respond(mode, command_name, &source, || human)
        }
        SourceCommand::List => {
            let sources = store.load();
            respond(mode, command_name, &sources, || {
                if sources.is_empty() {
                    return "No sources configured".to_string();
                }
                sources
                    .iter()
                    .map(|source| {
                        format!("{} | {} | depth {}", source.id, source.path, source.depth)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        SourceCommand::Update {
            id,
            depth,
            collection,
            clear_collection,
            ide,
            clear_ide,
        } => {
            let default_collection = match collection {
                Some(raw) => Some(Some(resolve_manual_collection(config, &raw)?)),
                None if clear_collection => Some(None),
                None => None,
            };
            let default_ide = match ide {
                Some(raw) => Some(Some(ide_from_path(&raw))),
                None if clear_ide => Some(None),
                None => None,
            };
            let source = store
                .update(
                    &id,
                    SourceUpdate {
                        depth,
                        default_collection,
                        default_ide,
                    },
                )
                .map_err(map_opener_error)?;
            let human = format!("Updated source {} ({})", source.path, source.id);
            respond(mode, command_name, &source, || human)
        }
        SourceCommand::Remove { id } => {
            store.delete(&id).map_err(map_opener_error)?;
            respond(mode, command_name, &json!({ "id": id }), || format!("Removed source {id}"))
        }
    }
}

fn run_project(
    config: &RuntimeConfig,
    command: ProjectCommand,
    mode: OutputMode,
    command_name: &str,
    now: i64,
) -> Result<String, AppError> {
    let store = ManualProjectStore::from_config(config);
    match command {
        ProjectCommand::Add {
            path,
            collection,
            ide,
        } => {
            let default_collection = collection
                .map(|raw| resolve_manual_collection(config, &raw))
                .transpose()?;
            let project = store
                .add(&path, default_collection, ide.as_deref().map(ide_from_path), now)
                .map_err(map_opener_error)?;
            let human = format!("Added project {} ({})", project.path, project.id);
            respond(mode, command_name, &project, || human)
        }
        ProjectCommand::Remove { id } => {
            store.delete(&id).map_err(map_opener_error)?;
            respond(mode, command_name, &json!({ "id": id }), || format!("Removed project {id}"))
        }
        ProjectCommand::Relocate { from, to } => {
            let relocation = relocate_project(config, &from, &to).map_err(map_opener_error)?;
            let human = if relocation.moved {
                format!("Moved settings from {} to {}", relocation.from, relocation.to)
            } else {
                format!("No settings stored for {}", relocation.from)
            };
            respond(mode, command_name, &relocation, || human)
        }
    }
}

fn run_collection(
    config: &RuntimeConfig,
    command: CollectionCommand,
    mode: OutputMode,
    command_name: &str,
    now: i64,
) -> Result<String, AppError> {
    let store = CollectionStore::from_config(config);
    match command {
        CollectionCommand::Create { name, icon, color } => {
            let icon = icon.map(|raw| validate_icon(&raw)).transpose()?;
            let color = color.map(|raw| resolve_color(&raw)).transpose()?;
            let collection = store.create(&name, icon, color, now).map_err(map_opener_error)?;
            let human = format!("Created collection {} ({})", collection.name, collection.id);
            respond(mode, command_name, &collection, || human)
        }
        CollectionCommand::Rename { id, name } => {
            let collection = store
                .update(
                    &id,
                    CollectionUpdate {
                        name: Some(name),
                        ..CollectionUpdate::default()
                    },
                )
                .map_err(map_opener_error)?;
            let human = format!("Renamed {} to {}", collection.id, collection.name);
            respond(mode, command_name, &collection, || human)
        }
        CollectionCommand::Delete { id } => {
            let cleaned = store
                .delete(&id, &SettingsStore::from_config(config))
                .map_err(map_opener_error)?;
            let human = format!("Deleted collection {id}; removed it from {cleaned} project(s)");
            respond(mode, command_name, &json!({ "id": id, "cleaned": cleaned }), || human)
        }
        CollectionCommand::List => {
            let collections = store.all();
            respond(mode, command_name, &collections, || {
                collections
                    .iter()
                    .map(|collection| {
                        let kind = if collection.is_auto() { "auto" } else { "manual" };
                        format!("{} | {} | {kind}", collection.id, collection.name)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

fn run_settings(
    config: &RuntimeConfig,
    command: SettingsCommand,
    mode: OutputMode,
    command_name: &str,
) -> Result<String, AppError> {
    let store = SettingsStore::from_config(config);
    match command {
        SettingsCommand::Show { path } => {
            let key = settings_key(config, &path)?;
            let settings = store.get(&key);
            let human = serde_json::to_string_pretty(&settings).map_err(map_serialize_error)?;
            respond(mode, command_name, &settings, || human)
        }
        SettingsCommand::Set {
            path,
            display_name,
            icon,
            color,
            ide,
            custom_icon,
        } => {
            let key = settings_key(config, &path)?;
            // Validate every input before touching the store.
            let icon = icon.map(|raw| validate_icon(&raw)).transpose()?;
            let color = color.map(|raw| resolve_color(&raw)).transpose()?;

            let mut settings = store.get(&key);
            if let Some(file) = custom_icon {
                let copied = store.copy_custom_icon(&key, &file).map_err(map_opener_error)?;
                if let Some(previous) = settings.custom_icon.as_deref() {
                    if PathBuf::from(previous) != copied {
                        store.delete_custom_icon(&PathBuf::from(previous));
                    }
                }
                settings.custom_icon = Some(copied.to_string_lossy().to_string());
            }
            if let Some(display_name) = display_name {
                settings.display_name = Some(display_name);
            }
            if let Some(icon) = icon {
                settings.icon = Some(icon);
            }
            if let Some(color) = color {
                settings.icon_color = Some(color);
            }
            if let Some(ide) = ide {
                settings.ide = Some(ide_from_path(&ide));
            }

            store.save(&key, settings.clone()).map_err(map_store_error)?;
            respond(mode, command_name, &settings, || format!("Updated settings for {key}"))
        }
        SettingsCommand::Clear { path, ide_only } => {
            let key = settings_key(config, &path)?;
            if ide_only {
                store.clear_ide(&key).map_err(map_store_error)?;
            } else {
                if let Some(icon) = store.get(&key).custom_icon {
                    store.delete_custom_icon(&PathBuf::from(icon));
                }
                store.delete(&key).map_err(map_store_error)?;
            }
            let human = if ide_only {
                format!("Cleared editor override for {key}")
            } else {
                format!("Cleared settings for {key}")
            };
            respond(mode, command_name, &store.get(&key), || human)
        }
        SettingsCommand::Assign { path, collections } => {
            let key = settings_key(config, &path)?;
            let ids = collections
                .iter()
                .map(|raw| resolve_manual_collection(config, raw))
                .collect::<Result<Vec<_>, _>>()?;
            store.set_collections(&key, ids.clone()).map_err(map_store_error)?;
            let human = format!("Assigned {} collection(s) to {key}", ids.len());
            respond(mode, command_name, &json!({ "path": key, "collections": ids }), || human)
        }
    }
}

fn respond<T, F>(mode: OutputMode, command: &str, result: &T, human: F) -> Result<String, AppError>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    match mode {
        OutputMode::Json => build_success_envelope(command, &result).map_err(map_serialize_error),
        OutputMode::Human => Ok(human()),
    }
}

fn render_sections_human(sections: &[ListSection]) -> String {
    if sections.is_empty() {
        return "No projects matched".to_string();
    }

    let mut lines = Vec::new();
    for section in sections {
        lines.push(section.title.clone());
        for item in &section.items {
            let mut line = format!("  {} | {}", item.title, item.path);
            if let Some(subtitle) = &item.subtitle {
                line.push_str(&format!(" | {subtitle}"));
            }
            if let Some(text) = item
                .accessories
                .iter()
                .find_map(|accessory| accessory.text.as_deref())
            {
                line.push_str(&format!(" | {text}"));
            }
            if item.missing {
                line.push_str(" [missing]");
            }
            lines.push(line);
        }
    }
    lines.join("\n")
}

fn emit_error(command: &str, output_mode: OutputMode, error: &AppError) {
    match output_mode {
        OutputMode::Json => {
            println!(
                "{}",
                build_error_envelope(
                    command,
                    error.code,
                    &error.message,
                    error_kind_label(error.kind),
                    error.exit_code(),
                )
            );
        }
        OutputMode::Human => {
            eprintln!("error[{}]: {}", error.code, error.message);
        }
    }
}

fn error_kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::User => "user",
        ErrorKind::Runtime => "runtime",
    }
}

fn settings_key(config: &RuntimeConfig, raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::user(ERROR_CODE_USER_INVALID_PATH, "no project path given"));
    }
    Ok(config.expand(raw).to_string_lossy().to_string())
}

fn ide_from_path(path: &str) -> ProjectIde {
    ProjectIde {
        path: path.to_string(),
        name: app_name_from_path(path),
    }
}

/// Accept a manual collection id or its (case-insensitive) name.
fn resolve_manual_collection(config: &RuntimeConfig, raw: &str) -> Result<String, AppError> {
    let store = CollectionStore::from_config(config);
    let collection = store
        .by_id(raw)
        .or_else(|| store.by_name(raw))
        .ok_or_else(|| map_opener_error(OpenerError::UnknownCollection(raw.to_string())))?;
    if collection.is_auto() {
        return Err(map_opener_error(OpenerError::AutoCollectionReadOnly(collection.id)));
    }
    Ok(collection.id)
}

fn validate_icon(raw: &str) -> Result<String, AppError> {
    icon_option(raw).map(|option| option.key.to_string()).ok_or_else(|| {
        let known: Vec<&str> = ICON_OPTIONS.iter().map(|option| option.key).collect();
        AppError::user(
            ERROR_CODE_USER_INVALID_INPUT,
            format!("unknown icon: {raw} (expected one of {})", known.join(", ")),
        )
    })
}

/// Palette name (`Deep Purple`) or a `#RRGGBB` value.
fn resolve_color(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    if let Some(color) = ICON_COLORS
        .iter()
        .find(|color| color.name.eq_ignore_ascii_case(raw))
    {
        return Ok(color.value.to_string());
    }

    let is_hex = raw
        .strip_prefix('#')
        .is_some_and(|digits| digits.len() == 6 && digits.chars().all(|ch| ch.is_ascii_hexdigit()));
    if is_hex {
        Ok(raw.to_ascii_uppercase())
    } else {
        Err(AppError::user(
            ERROR_CODE_USER_INVALID_INPUT,
            format!("invalid color: {raw} (expected a palette name or #RRGGBB)"),
        ))
    }
}

fn map_store_error(error: StoreError) -> AppError {
    AppError::runtime(ERROR_CODE_RUNTIME_STORE_WRITE, error.to_string())
}

fn map_serialize_error(error: serde_json::Error) -> AppError {
    AppError::runtime(
        ERROR_CODE_RUNTIME_SERIALIZE,
        format!("failed to serialize result: {error}"),
    )
}

fn map_opener_error(error: OpenerError) -> AppError {
    let message = error.to_string();
    match error {
        OpenerError::MissingPath(_) | OpenerError::NotDirectory(_) | OpenerError::EmptyPath => {
            AppError::user(ERROR_CODE_USER_INVALID_PATH, message)
        }
        OpenerError::DuplicateSource(_) | OpenerError::DuplicateProject(_) => {
            AppError::user(ERROR_CODE_USER_DUPLICATE, message)
        }
        OpenerError::NotAProject(_) | OpenerError::NoProjectsFound { .. } => {
            AppError::user(ERROR_CODE_USER_NO_PROJECTS, message)
        }
        OpenerError::UnknownSource(_)
        | OpenerError::UnknownCollection(_)
        | OpenerError::UnknownManualProject(_) => {
            AppError::user(ERROR_CODE_USER_NOT_FOUND, message)
        }
        OpenerError::EmptyCollectionName
        | OpenerError::AutoCollectionReadOnly(_)
        | OpenerError::UnsupportedIconExtension(_) => {
            AppError::user(ERROR_CODE_USER_INVALID_INPUT, message)
        }
        OpenerError::IconCopy { .. } => AppError::runtime(ERROR_CODE_RUNTIME_ICON_COPY, message),
        OpenerError::Launch { .. } => AppError::runtime(ERROR_CODE_RUNTIME_LAUNCH, message),
        OpenerError::Store(error) => map_store_error(error),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::Value;
    use tempfile::TempDir;

    use super::*;

    struct Workspace {
        _data: TempDir,
        home: TempDir,
        config: RuntimeConfig,
    }

    fn workspace() -> Workspace {
        let data = tempfile::tempdir().expect("create data dir");
        let home = tempfile::tempdir().expect("create home dir");
        let data_dir = data.path().to_string_lossy().to_string();
        let home_dir = home.path().to_string_lossy().to_string();
        let config = RuntimeConfig::from_pairs(vec![
            ("HOME", home_dir.as_str()),
            ("PROJECT_OPENER_DATA_DIR", data_dir.as_str()),
            ("PROJECT_OPENER_PROJECTS_DIR", "~/Projects"),
        ])
        .expect("config should parse");
        Workspace {
            _data: data,
            home,
            config,
        }
    }

    fn make_project(root: &Path, relative: &str, marker: &str) {
        let dir = root.join(relative);
        fs::create_dir_all(&dir).expect("create project dir");
        fs::write(dir.join(marker), "").expect("write marker");
    }

    fn cli(command: Commands, json: bool) -> Cli {
        Cli {
            output: None,
            json,
            command,
        }
    }

    fn run_json(command: Commands, config: &RuntimeConfig) -> Value {
        let output = run_with_config(cli(command, true), config).expect("command should succeed");
        serde_json::from_str(&output).expect("output should be valid JSON")
    }

    #[test]
    fn search_migrates_legacy_directory_and_groups_results() {
        let ws = workspace();
        make_project(ws.home.path(), "Projects/alpha", "Cargo.toml");
        make_project(ws.home.path(), "Projects/group/beta", "package.json");

        let json = run_json(
            Commands::Search {
                query: String::new(),
                group: GroupArg::Collection,
            },
            &ws.config,
        );
        assert_eq!(json.get("schema_version").and_then(Value::as_str), Some("v1"));
        assert_eq!(json.get("command").and_then(Value::as_str), Some("opener.search"));
        assert_eq!(json.get("ok").and_then(Value::as_bool), Some(true));

        let sections = json["result"].as_array().expect("sections array");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0]["title"], "Uncategorized");
        let titles: Vec<&str> = sections[0]["items"]
            .as_array()
            .expect("items")
            .iter()
            .filter_map(|item| item["title"].as_str())
            .collect();
        assert_eq!(titles, vec!["alpha", "beta"]);
    }

    #[test]
    fn search_filters_by_language() {
        let ws = workspace();
        make_project(ws.home.path(), "Projects/alpha", "Cargo.toml");
        make_project(ws.home.path(), "Projects/beta", "go.mod");

        let json = run_json(
            Commands::Search {
                query: "lang:golang".into(),
                group: GroupArg::Flat,
            },
            &ws.config,
        );
        let items = json["result"][0]["items"].as_array().expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "beta");
    }

    #[test]
    fn collection_lifecycle_prunes_assignments() {
        let ws = workspace();
        let created = run_json(
            Commands::Collection {
                command: CollectionCommand::Create {
                    name: "Work".into(),
                    icon: Some("Code".into()),
                    color: Some("deep purple".into()),
                },
            },
            &ws.config,
        );
        let id = created["result"]["id"].as_str().expect("id").to_string();
        assert_eq!(created["result"]["color"], "#5E35B1");
        assert_eq!(created["result"]["type"], "manual");

        for project in ["~/a", "~/b"] {
            run_with_config(
                cli(
                    Commands::Settings {
                        command: SettingsCommand::Assign {
                            path: project.into(),
                            collections: vec!["work".into()],
                        },
                    },
                    false,
                ),
                &ws.config,
            )
            .expect("assign by name");
        }

        let deleted = run_json(
            Commands::Collection {
                command: CollectionCommand::Delete { id: id.clone() },
            },
            &ws.config,
        );
        assert_eq!(deleted["result"]["cleaned"], 2);
        assert!(SettingsStore::from_config(&ws.config).load_all().is_empty());
    }

    #[test]
    fn assigning_auto_or_unknown_collection_is_a_user_error() {
        let ws = workspace();
        let err = run_with_config(
            cli(
                Commands::Settings {
                    command: SettingsCommand::Assign {
                        path: "~/a".into(),
                        collections: vec!["Recent".into()],
                    },
                },
                false,
            ),
            &ws.config,
        )
        .expect_err("auto collections cannot be assigned");
        assert_eq!(err.code, ERROR_CODE_USER_INVALID_INPUT);
        assert_eq!(err.exit_code(), 2);

        let err = run_with_config(
            cli(
                Commands::Settings {
                    command: SettingsCommand::Assign {
                        path: "~/a".into(),
                        collections: vec!["nope".into()],
                    },
                },
                false,
            ),
            &ws.config,
        )
        .expect_err("unknown collection");
        assert_eq!(err.code, ERROR_CODE_USER_NOT_FOUND);
    }

    #[test]
    fn source_add_rejects_duplicates_and_lists() {
        let ws = workspace();
        make_project(ws.home.path(), "code/app", "Makefile");

        let add = || {
            run_with_config(
                cli(
                    Commands::Source {
                        command: SourceCommand::Add {
                            path: "~/code".into(),
                            depth: 1,
                            collection: None,
                            ide: Some("/Applications/Zed.app".into()),
                        },
                    },
                    false,
                ),
                &ws.config,
            )
        };
        assert!(add().expect("first add").starts_with("Added source"));
        let err = add().expect_err("duplicate add");
        assert_eq!(err.code, ERROR_CODE_USER_DUPLICATE);

        let listed = run_json(
            Commands::Source {
                command: SourceCommand::List,
            },
            &ws.config,
        );
        assert_eq!(listed["result"][0]["depth"], 1);
        assert_eq!(listed["result"][0]["defaultIde"]["name"], "Zed");

        let id = listed["result"][0]["id"].as_str().expect("source id").to_string();
        let updated = run_json(
            Commands::Source {
                command: SourceCommand::Update {
                    id,
                    depth: Some(3),
                    collection: None,
                    clear_collection: false,
                    ide: None,
                    clear_ide: true,
                },
            },
            &ws.config,
        );
        assert_eq!(updated["result"]["depth"], 3);
        assert!(updated["result"].get("defaultIde").is_none());
    }

    #[test]
    fn settings_set_validates_before_writing() {
        let ws = workspace();
        let err = run_with_config(
            cli(
                Commands::Settings {
                    command: SettingsCommand::Set {
                        path: "~/a".into(),
                        display_name: Some("Alpha".into()),
                        icon: Some("NotAnIcon".into()),
                        color: None,
                        ide: None,
                        custom_icon: None,
                    },
                },
                false,
            ),
            &ws.config,
        )
        .expect_err("unknown icon");
        assert_eq!(err.code, ERROR_CODE_USER_INVALID_INPUT);
        assert!(SettingsStore::from_config(&ws.config).load_all().is_empty());

        let json = run_json(
            Commands::Settings {
                command: SettingsCommand::Set {
                    path: "~/a".into(),
                    display_name: Some("Alpha".into()),
                    icon: Some("Rocket".into()),
                    color: Some("#00897b".into()),
                    ide: Some("/usr/bin/nvim".into()),
                    custom_icon: None,
                },
            },
            &ws.config,
        );
        assert_eq!(json["result"]["displayName"], "Alpha");
        assert_eq!(json["result"]["iconColor"], "#00897B");
        assert_eq!(json["result"]["ide"]["name"], "nvim");
    }

    #[test]
    fn open_missing_directory_is_invalid_path() {
        let ws = workspace();
        let err = run_with_config(
            cli(
                Commands::Open {
                    path: "~/does-not-exist".into(),
                },
                false,
            ),
            &ws.config,
        )
        .expect_err("missing project");
        assert_eq!(err.code, ERROR_CODE_USER_INVALID_PATH);
    }

    #[test]
    fn conflicting_output_flags_are_rejected() {
        let ws = workspace();
        let err = run_with_config(
            Cli {
                output: Some(OutputModeArg::Human),
                json: true,
                command: Commands::Migrate,
            },
            &ws.config,
        )
        .expect_err("conflict");
        assert_eq!(err.code, ERROR_CODE_USER_OUTPUT_MODE_CONFLICT);
    }

    #[test]
    fn color_resolution_accepts_names_and_hex() {
        assert_eq!(resolve_color("Teal").expect("name"), "#00897B");
        assert_eq!(resolve_color("#abcdef").expect("hex"), "#ABCDEF");
        assert!(resolve_color("teal-ish").is_err());
        assert!(resolve_color("#12345").is_err());
    }
}
