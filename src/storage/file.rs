//! File-backed local store.
//!
//! All keys of the scope live in one JSON document mapping key to raw text:
//!
//! ```text
//! data/
//! └── local-storage.json   {"clicks": "3", "theme": "\"dark\""}
//! ```
//!
//! Reads take a shared file lock, writes an exclusive one, so several
//! processes pointed at the same file see whole documents only.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;

use crate::config::FileStoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::SyncBackend;

type Entries = BTreeMap<String, String>;

/// Key/value store persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    /// Path of the JSON document.
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a file store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn new(config: &FileStoreConfig) -> StorageResult<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            StorageError::FileIO(format!(
                "Failed to create directory {}: {e}",
                config.data_dir.display()
            ))
        })?;

        Ok(Self::at(config.path()))
    }

    /// Create a file store backed by `path` without touching the filesystem.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(contents: &str) -> StorageResult<Entries> {
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }
        Ok(serde_json::from_str(contents)?)
    }

    /// Read the whole document under a shared lock.
    fn read_entries_locked(&self) -> StorageResult<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let mut file = File::open(&self.path)?;
        file.lock_shared()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let mut contents = String::new();
        let read = file.read_to_string(&mut contents);
        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;
        read?;

        Self::parse(&contents)
    }

    /// Apply `update_fn` to the document under an exclusive lock.
    fn update_entries<F>(&self, update_fn: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Entries),
    {
        let _guard = self.lock.lock();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;

        file.lock_exclusive()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        let result = Self::rewrite(&mut file, update_fn);

        file.unlock()
            .map_err(|e| StorageError::LockFailed(e.to_string()))?;

        result
    }

    fn rewrite<F>(file: &mut File, update_fn: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Entries),
    {
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let mut entries = Self::parse(&contents)?;

        update_fn(&mut entries);

        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        let json = serde_json::to_string_pretty(&entries)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        Ok(())
    }
}

impl SyncBackend for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_entries_locked()?.remove(key))
    }

    fn set(&self, key: &str, raw: &str) -> StorageResult<()> {
        self.update_entries(|entries| {
            entries.insert(key.to_string(), raw.to_string());
        })
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update_entries(|entries| {
            entries.remove(key);
        })
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
