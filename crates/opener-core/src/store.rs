use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::error::StoreError;

/// One JSON document on disk, read and rewritten whole.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _document: PhantomData<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _document: PhantomData,
        }
    }

    pub fn load(&self) -> Result<T, StoreError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|source| StoreError::from_io(self.path.clone(), source))?;

        serde_json::from_str(&content).map_err(|error| StoreError::Parse {
            path: self.path.clone(),
            message: error.to_string(),
        })
    }

    /// Missing, unreadable or corrupt documents read as the empty default.
    /// Any other i/o failure also yields the default but is logged as an error.
    pub fn load_or_default(&self) -> T {
        match self.load() {
            Ok(document) => document,
            Err(StoreError::NotFound(_)) => T::default(),
            Err(failure) if failure.is_recoverable() => {
                warn!(error = %failure, "treating unreadable store as empty");
                T::default()
            }
            Err(failure) => {
                error!(error = %failure, "unexpected i/o failure reading store");
                T::default()
            }
        }
    }

    pub fn save(&self, document: &T) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(document).map_err(|error| StoreError::Parse {
            path: self.path.clone(),
            message: error.to_string(),
        })?;

        write_atomic(&self.path, &payload)
            .map_err(|source| StoreError::from_io(self.path.clone(), source))
    }
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "target path must have a parent",
        )
    })?;
    fs::create_dir_all(parent)?;

    let tmp_path = path.with_extension(format!("{}.tmp", std::process::id()));
    fs::write(&tmp_path, bytes)?;
    fs::rename(tmp_path, path)?;
    Ok(())
}
