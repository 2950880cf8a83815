//! # Key-Value Backends
//!
//! The board persists one JSON document per collection key. A backend gets
//! and puts whole documents, and applies a batch of puts as one unit.
//!
//! - [`MemoryBackend`]: shared in-process map, cloneable.
//! - [`FileBackend`]: one `{key}.json` file per key under a directory,
//!   guarded by an advisory lock file so several processes can share it.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::RwLock;

use crate::error::StoreError;

/// Inspects the current guard document inside a batch and may veto it.
pub type Precondition<'a> = &'a dyn Fn(Option<&str>) -> Result<(), StoreError>;

pub trait KvBackend: Send + Sync + std::fmt::Debug {
    /// Read `keys` as of one instant: no batch lands halfway through.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError>;

    /// Apply `writes` in order as one unit.
    ///
    /// `check` sees the current document under `guard` while the backend
    /// holds its exclusive lock. If `check` fails, or any write fails,
    /// none of `writes` is visible afterwards.
    fn put_batch(
        &self,
        guard: &str,
        check: Precondition<'_>,
        writes: &[(&str, String)],
    ) -> Result<(), StoreError>;

    /// The stored document for `key`, or `None` if never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get_many(&[key])?.pop().flatten())
    }

    /// Replace the document for `key`.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.put_batch(key, &|_| Ok(()), &[(key, value.to_string())])
    }
}

/// Keys are used as file names, so they are restricted to `[a-z0-9_-]+`.
fn validate_key(key: &str) -> Result<&str, StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(key)
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

// ─── Memory ──────────────────────────────────────────────────────────

/// Thread-safe, cloneable in-memory backend. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let data = self.data.read();
        keys.iter()
            .map(|key| Ok(data.get(validate_key(key)?).cloned()))
            .collect()
    }

    fn put_batch(
        &self,
        guard: &str,
        check: Precondition<'_>,
        writes: &[(&str, String)],
    ) -> Result<(), StoreError> {
        let guard = validate_key(guard)?;
        for (key, _) in writes {
            validate_key(key)?;
        }
        let mut data = self.data.write();
        check(data.get(guard).map(String::as_str))?;
        for (key, value) in writes {
            data.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}

// ─── File ────────────────────────────────────────────────────────────

const LOCK_FILE: &str = ".lock";

/// Directory of JSON documents, `{base_dir}/{key}.json`.
///
/// Reads hold a shared lock on `{base_dir}/.lock`, batches an exclusive
/// one. A batch stages every document as a hidden temporary sibling and
/// renames them into place, in order, only once all of them are written.
#[derive(Debug, Clone)]
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    fn staging_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!(".{key}.json.tmp"))
    }

    /// Open the lock file, creating the directory on first use. The lock
    /// is released when the returned file is dropped.
    fn open_lock(&self) -> Result<File, StoreError> {
        fs::create_dir_all(&self.base_dir)?;
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.base_dir.join(LOCK_FILE))?;
        Ok(file)
    }

    fn read_file(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(validate_key(key)?);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn discard_staged(&self, staged: &[(PathBuf, PathBuf)]) {
        for (tmp, _) in staged {
            if let Err(e) = fs::remove_file(tmp) {
                tracing::warn!(path = %tmp.display(), error = %e, "failed to remove staged document");
            }
        }
    }
}

impl KvBackend for FileBackend {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let lock = self.open_lock()?;
        FileExt::lock_shared(&lock)?;
        keys.iter().map(|key| self.read_file(key)).collect()
    }

    fn put_batch(
        &self,
        guard: &str,
        check: Precondition<'_>,
        writes: &[(&str, String)],
    ) -> Result<(), StoreError> {
        validate_key(guard)?;
        for (key, _) in writes {
            validate_key(key)?;
        }

        let lock = self.open_lock()?;
        FileExt::lock_exclusive(&lock)?;
        check(self.read_file(guard)?.as_deref())?;

        let mut staged = Vec::with_capacity(writes.len());
        for (key, value) in writes {
            let tmp = self.staging_path(key);
            if let Err(e) = fs::write(&tmp, value) {
                tracing::warn!(key, error = %e, "staging failed; batch discarded");
                self.discard_staged(&staged);
                return Err(e.into());
            }
            staged.push((tmp, self.path_for(key)));
        }

        for (tmp, path) in &staged {
            if let Err(e) = fs::rename(tmp, path) {
                tracing::error!(path = %path.display(), error = %e, "rename failed mid-batch");
                return Err(e.into());
            }
        }
        Ok(())
    }
}
