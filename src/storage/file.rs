//! JSON file storage.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::storage::{KeyValueStorage, StorageError};

type Entries = BTreeMap<String, String>;

/// Storage backed by a single JSON object file.
///
/// The file is created on first write and replaced atomically on every write. A missing file
/// reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Storage kept in the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(source) => return Err(self.io_error(source)),
        };

        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn persist(&self, entries: &Entries) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let contents = serde_json::to_string_pretty(entries).map_err(StorageError::Encode)?;

        let staging = self.staging_path();

        fs::write(&staging, contents).map_err(|source| self.io_error(source))?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), entries = entries.len(), "storage file written");

        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Entries) -> bool) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load()?;

        if apply(&mut entries) {
            self.persist(&entries)?;
        }

        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("storage"), OsString::from);

        name.push(".tmp");

        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());

            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}
