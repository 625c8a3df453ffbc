//! Persisted installation and backup indexes.
//!
//! Two keyed JSON stores back the installer and backup subsystem:
//!
//! - the **install index** maps package name to [`InstallRecord`]
//! - the **backup index** maps backup id to [`BackupRecord`]
//!
//! Each store is read fully into memory at the start of an operation and
//! written back fully after mutation. Writes go to a temporary file in the
//! same directory which is then renamed over the index, so a crashed write
//! never leaves a truncated index behind.
//!
//! No file locking is performed; running two operations against the same
//! index concurrently is a documented misuse.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::package::ProfileKind;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while loading or saving an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to read the index file.
    #[error("failed to read index {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// Failed to write the index file.
    #[error("failed to write index {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    /// The index file exists but is not valid JSON for its schema.
    #[error("malformed index {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Record of one installed package.
///
/// Created on successful install, replaced (not mutated) on update,
/// removed on uninstall. At most one record exists per package name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Name of the installed package.
    pub package: String,

    /// Version string of the installed package.
    pub version: String,

    /// Absolute target directory the package was installed into.
    pub target_dir: PathBuf,

    /// Backup taken immediately before this install, if any.
    pub backup_id: Option<String>,

    /// Installed file paths, relative to `target_dir`, in install order.
    pub files: Vec<PathBuf>,

    /// When the install committed.
    pub installed_at: DateTime<Local>,
}

/// Record of one backup snapshot.
///
/// Immutable once written; deleted only by rotation or explicit cleanup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Unique backup identifier. Embeds the creation timestamp and a
    /// monotonic counter so ids sort lexicographically by creation time
    /// within a package, even under rapid successive calls.
    pub id: String,

    /// When the backup was created.
    pub created_at: DateTime<Local>,

    /// Package the backup was taken for.
    pub package: String,

    /// Absolute directory holding the snapshot files.
    pub backup_dir: PathBuf,

    /// Captured file paths, relative to both `backup_dir` and `target_dir`.
    pub files: Vec<PathBuf>,

    /// Directory the files should be restored into.
    pub target_dir: PathBuf,
}

/// The install index: package name -> [`InstallRecord`].
#[derive(Debug, Clone)]
pub struct InstallIndex {
    path: PathBuf,
}

impl InstallIndex {
    /// Create a handle to the index at `path`. Nothing is read until
    /// [`InstallIndex::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records. A missing index file is an empty index.
    pub fn load(&self) -> IndexResult<BTreeMap<String, InstallRecord>> {
        load_json(&self.path)
    }

    /// Atomically replace the index contents.
    pub fn save(&self, records: &BTreeMap<String, InstallRecord>) -> IndexResult<()> {
        save_json(&self.path, records)
    }
}

/// The active-profile index: player name -> [`ProfileKind`].
///
/// Records which configuration profile is currently live for each player.
#[derive(Debug, Clone)]
pub struct ProfileIndex {
    path: PathBuf,
}

impl ProfileIndex {
    /// Create a handle to the index at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the map. A missing index file means no active profiles.
    pub fn load(&self) -> IndexResult<BTreeMap<String, ProfileKind>> {
        load_json(&self.path)
    }

    /// Atomically replace the index contents.
    pub fn save(&self, profiles: &BTreeMap<String, ProfileKind>) -> IndexResult<()> {
        save_json(&self.path, profiles)
    }
}

/// The backup index: backup id -> [`BackupRecord`].
#[derive(Debug, Clone)]
pub struct BackupIndex {
    path: PathBuf,
}

impl BackupIndex {
    /// Create a handle to the index at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records. A missing index file is an empty index.
    pub fn load(&self) -> IndexResult<BTreeMap<String, BackupRecord>> {
        load_json(&self.path)
    }

    /// Atomically replace the index contents.
    pub fn save(&self, records: &BTreeMap<String, BackupRecord>) -> IndexResult<()> {
        save_json(&self.path, records)
    }
}

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> IndexResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(path).map_err(|e| IndexError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| IndexError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> IndexResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| IndexError::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let content = serde_json::to_string_pretty(value).map_err(|e| IndexError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Write-to-temp-then-rename keeps the index readable at all times.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|e| IndexError::Write {
        path: tmp.clone(),
        source: e,
    })?;
    fs::rename(&tmp, path).map_err(|e| IndexError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
