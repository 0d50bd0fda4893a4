use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::config::{RuntimeConfig, expand_path};
use crate::error::OpenerError;
use crate::settings::{ProjectIde, SettingsStore};
use crate::sources::{ManualProjectStore, SourceStore};

/// Hands a project directory to an editor.
pub trait Launcher {
    fn launch(&self, ide: &ProjectIde, path: &Path) -> Result<(), OpenerError>;
}

/// Spawns the editor as a child process and waits for the launch command.
/// Its stdout is discarded so it never mixes into the command's own output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandLauncher;

/// `open -a <ide> <path>` on macOS, `<ide> <path>` elsewhere.
pub fn launch_command(ide: &ProjectIde, path: &Path) -> (String, Vec<String>) {
    let path = path.to_string_lossy().to_string();
    if cfg!(target_os = "macos") {
        ("open".to_string(), vec!["-a".to_string(), ide.path.clone(), path])
    } else {
        (ide.path.clone(), vec![path])
    }
}

impl Launcher for CommandLauncher {
    fn launch(&self, ide: &ProjectIde, path: &Path) -> Result<(), OpenerError> {
        let (program, args) = launch_command(ide, path);
        debug!(%program, ?args, "launching editor");

        let launch_error = |message: String| OpenerError::Launch {
            ide: ide.name.clone(),
            path: path.to_path_buf(),
            message,
        };

        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|error| launch_error(error.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(launch_error(format!("{program} exited with {status}")))
        }
    }
}

/// Project override, then the default of whatever registered the project
/// (manual entry or the first source containing it), then the global IDE.
pub fn resolve_ide(config: &RuntimeConfig, project_path: &str) -> ProjectIde {
    if let Some(ide) = SettingsStore::from_config(config).get(project_path).ide {
        return ide;
    }

    let home = config.home.to_string_lossy();
    if let Some(ide) = ManualProjectStore::from_config(config)
        .find_by_path(project_path)
        .and_then(|project| project.default_ide)
    {
        return ide;
    }

    let project = Path::new(project_path);
    SourceStore::from_config(config)
        .load()
        .into_iter()
        .find(|source| project.starts_with(expand_path(&source.path, &home)))
        .and_then(|source| source.default_ide)
        .unwrap_or_else(|| config.ide.clone())
}

/// Record the open, then launch. The timestamp is kept even if the launch fails.
pub fn open_project(
    config: &RuntimeConfig,
    launcher: &dyn Launcher,
    raw_path: &str,
    now: i64,
) -> Result<(PathBuf, ProjectIde), OpenerError> {
    let raw_path = raw_path.trim();
    if raw_path.is_empty() {
        return Err(OpenerError::EmptyPath);
    }
    let path = config.expand(raw_path);
    if !path.is_dir() {
        return Err(OpenerError::MissingPath(path));
    }

    let key = path.to_string_lossy().to_string();
    let ide = resolve_ide(config, &key);
    SettingsStore::from_config(config).touch_last_opened(&key, now)?;
    launcher.launch(&ide, &path)?;

    info!(path = %key, ide = %ide.name, "opened project");
    Ok((path, ide))
}
