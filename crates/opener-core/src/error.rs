use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading or writing one persisted JSON document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file not found: {0}")]
    NotFound(PathBuf),
    #[error("permission denied for store file: {0}")]
    PermissionDenied(PathBuf),
    #[error("failed to parse store file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("i/o failure on store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub fn from_io(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }

    /// Kinds that readers collapse into "no data yet".
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::PermissionDenied(_) | Self::Parse { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum OpenerError {
    #[error("path does not exist: {0}")]
    MissingPath(PathBuf),
    #[error("path is not a directory: {0}")]
    NotDirectory(PathBuf),
    #[error("no directory given")]
    EmptyPath,
    #[error("this source directory has already been added: {0}")]
    DuplicateSource(PathBuf),
    #[error("this project has already been added: {0}")]
    DuplicateProject(PathBuf),
    #[error("no project markers found (.git, package.json, etc.) in {0}")]
    NotAProject(PathBuf),
    #[error("no projects found at depth {depth} in {path}")]
    NoProjectsFound { path: PathBuf, depth: usize },
    #[error("unknown source: {0}")]
    UnknownSource(String),
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("unknown manual project: {0}")]
    UnknownManualProject(String),
    #[error("collection name must not be empty")]
    EmptyCollectionName,
    #[error("auto collections cannot be modified: {0}")]
    AutoCollectionReadOnly(String),
    #[error("unsupported icon image extension: {0}")]
    UnsupportedIconExtension(String),
    #[error("failed to copy custom icon from {path}: {source}")]
    IconCopy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to launch {ide} for {path}: {message}")]
    Launch {
        ide: String,
        path: PathBuf,
        message: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
