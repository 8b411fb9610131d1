//! Storage medium keeping one `<key>.json` file per key in a directory.

use std::io;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::{debug, warn};

use super::atomic_io::write_atomic;
use crate::domain::ports::{StorageKey, StorageMedium, StorageMediumError};

/// Directory-backed medium.
///
/// All access goes through a `cap-std` directory handle, so documents can
/// never be read or written outside the configured data directory.
pub struct JsonDirectoryMedium {
    dir: Dir,
}

impl JsonDirectoryMedium {
    /// Open `path`, creating it and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`StorageMediumError::Unavailable`] when the directory cannot
    /// be created or opened.
    pub fn open(path: &Utf8Path) -> Result<Self, StorageMediumError> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(path, ambient_authority()))
            .map(Self::from_dir)
            .map_err(|err| {
                warn!(path = %path, error = %err, "failed to open data directory");
                StorageMediumError::unavailable(format!("{path}: {err}"))
            })
    }

    /// Use an already opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir }
    }

    fn file_name(key: StorageKey) -> String {
        format!("{}.json", key.as_str())
    }
}

impl StorageMedium for JsonDirectoryMedium {
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageMediumError> {
        match self.dir.read_to_string(Self::file_name(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read document");
                Err(StorageMediumError::read(key, err.to_string()))
            }
        }
    }

    fn write(&self, key: StorageKey, contents: &str) -> Result<(), StorageMediumError> {
        write_atomic(&self.dir, &Self::file_name(key), contents).map_err(|err| {
            warn!(key = %key, error = %err, "failed to write document");
            StorageMediumError::write(key, err.to_string())
        })
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageMediumError> {
        match self.dir.remove_file(Self::file_name(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(key = %key, "document already absent");
                Ok(())
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to remove document");
                Err(StorageMediumError::write(key, err.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for JsonDirectoryMedium {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonDirectoryMedium").finish_non_exhaustive()
    }
}
