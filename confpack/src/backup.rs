//! Backup creation, listing, restore, and rotation.
//!
//! The [`BackupStore`] snapshots files out of a target directory before any
//! destructive operation touches them. Snapshots live under a backup root,
//! one directory per backup, tracked by the persisted backup index.
//!
//! # Guarantees
//!
//! - A failed snapshot never leaves a dangling backup: the partial
//!   directory is removed before the error is returned, and the index is
//!   only written after the snapshot completed.
//! - Backup ids embed the creation timestamp and a monotonic counter, so
//!   they are globally unique and sort lexicographically by creation time
//!   within a package even when several backups are taken in the same
//!   second.
//! - Restore is additive: files captured in the backup are copied back
//!   over their original locations; files the target gained afterwards are
//!   left alone.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fsops::{self, FsError};
use crate::index::{BackupIndex, BackupRecord, IndexError};

/// Default number of backups retained per package by rotation.
pub const DEFAULT_KEEP_COUNT: usize = 5;

/// Result type for backup operations.
pub type BackupResult<T> = Result<T, BackupError>;

/// Errors that can occur during backup operations.
#[derive(Debug, Error)]
pub enum BackupError {
    /// No backup with the given id exists in the index.
    #[error("backup not found: {id}")]
    NotFound { id: String },

    /// The backup directory recorded in the index is missing on disk.
    #[error("backup directory missing for {id}: {path}")]
    DirectoryMissing { id: String, path: PathBuf },

    /// Copying files into or out of a snapshot failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Reading or writing the backup index failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Store of timestamped backup snapshots.
///
/// Owns the lifecycle of [`BackupRecord`]s: they are created here, never
/// mutated, and deleted only by [`BackupStore::cleanup_old_backups`] or
/// [`BackupStore::delete_backup`].
#[derive(Debug)]
pub struct BackupStore {
    root: PathBuf,
    index: BackupIndex,
    counter: u64,
}

impl BackupStore {
    /// Open a backup store rooted at `root` with its index at `index_path`.
    ///
    /// The monotonic id counter is seeded from the largest counter already
    /// present in the index, so ids stay strictly increasing across runs.
    pub fn open(root: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> BackupResult<Self> {
        let index = BackupIndex::new(index_path);
        let records = index.load()?;

        let counter = records
            .keys()
            .filter_map(|id| parse_id_counter(id))
            .max()
            .unwrap_or(0);

        Ok(Self {
            root: root.into(),
            index,
            counter,
        })
    }

    /// Root directory snapshots are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot `files` (paths relative to `target_dir`) into a new backup.
    ///
    /// Files in the list that do not exist on disk are skipped; an empty
    /// backup is valid. If any copy fails partway, the partially written
    /// backup directory is removed and no index entry is created.
    pub fn create_backup(
        &mut self,
        package: &str,
        target_dir: &Path,
        files: &[PathBuf],
    ) -> BackupResult<BackupRecord> {
        let created_at = Local::now();
        self.counter += 1;
        let id = format!(
            "{package}_{}_{:06}",
            created_at.format("%Y%m%d_%H%M%S"),
            self.counter
        );
        let backup_dir = self.root.join(&id);

        let mut captured = Vec::new();
        for rel in files {
            let source = target_dir.join(rel);
            if !source.exists() {
                continue;
            }
            if let Err(e) = fsops::copy_file(&source, &backup_dir.join(rel)) {
                // Never leave a partial snapshot behind.
                if let Err(cleanup) = fsops::remove_tree(&backup_dir) {
                    warn!(id, error = %cleanup, "failed to remove partial backup directory");
                }
                return Err(e.into());
            }
            captured.push(rel.clone());
        }

        // An empty snapshot still gets a directory so index and disk agree.
        fsops::ensure_writable_dir(&backup_dir)?;

        let record = BackupRecord {
            id: id.clone(),
            created_at,
            package: package.to_string(),
            backup_dir,
            files: captured,
            target_dir: target_dir.to_path_buf(),
        };

        let mut records = self.index.load()?;
        records.insert(id.clone(), record.clone());
        if let Err(e) = self.index.save(&records) {
            // Index write failed after the snapshot: remove the directory
            // so disk and index stay consistent.
            if let Err(cleanup) = fsops::remove_tree(&record.backup_dir) {
                warn!(id, error = %cleanup, "failed to remove backup after index failure");
            }
            return Err(e.into());
        }

        info!(id, package, files = record.files.len(), "created backup");
        Ok(record)
    }

    /// List all backups, newest first.
    ///
    /// Entries whose directory has vanished from disk are excluded and
    /// logged as anomalies; they are never a fatal error here.
    pub fn list_backups(&self) -> BackupResult<Vec<BackupRecord>> {
        let records = self.index.load()?;

        let mut backups: Vec<BackupRecord> = records
            .into_values()
            .filter(|record| {
                if record.backup_dir.is_dir() {
                    true
                } else {
                    warn!(
                        id = record.id,
                        path = %record.backup_dir.display(),
                        "backup directory missing, skipping index entry"
                    );
                    false
                }
            })
            .collect();

        backups.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(backups)
    }

    /// List backups for one package, newest first.
    pub fn backups_for(&self, package: &str) -> BackupResult<Vec<BackupRecord>> {
        let mut backups = self.list_backups()?;
        backups.retain(|b| b.package == package);
        Ok(backups)
    }

    /// Look up a backup by id.
    pub fn get(&self, id: &str) -> BackupResult<BackupRecord> {
        let records = self.index.load()?;
        let record = records.get(id).cloned().ok_or_else(|| BackupError::NotFound {
            id: id.to_string(),
        })?;

        if !record.backup_dir.is_dir() {
            return Err(BackupError::DirectoryMissing {
                id: id.to_string(),
                path: record.backup_dir,
            });
        }

        Ok(record)
    }

    /// Restore the files captured in a backup to their recorded target
    /// directory.
    ///
    /// The target directory is not cleared first: files not present in the
    /// backup remain untouched. Returns the absolute paths restored.
    pub fn restore_backup(&self, id: &str) -> BackupResult<Vec<PathBuf>> {
        let record = self.get(id)?;

        let copied = fsops::copy_tree(&record.backup_dir, &record.target_dir)?;
        let restored: Vec<PathBuf> = copied
            .iter()
            .map(|rel| record.target_dir.join(rel))
            .collect();

        if copied.len() != record.files.len() {
            warn!(
                id,
                expected = record.files.len(),
                restored = copied.len(),
                "backup directory contents differ from the recorded file list"
            );
        }

        info!(id, files = restored.len(), "restored backup");
        Ok(restored)
    }

    /// Delete a backup directory and its index entry.
    ///
    /// The index entry is only removed after the directory removal
    /// succeeded, so the index never references a missing directory.
    pub fn delete_backup(&mut self, id: &str) -> BackupResult<()> {
        let mut records = self.index.load()?;
        let Some(record) = records.get(id).cloned() else {
            return Ok(());
        };

        fsops::remove_tree(&record.backup_dir)?;
        records.remove(id);
        self.index.save(&records)?;

        debug!(id, "deleted backup");
        Ok(())
    }

    /// Remove old backups of one package, keeping the `keep` most recent.
    ///
    /// Rotation is per package: backups of other packages are never
    /// touched. Returns the number of backups removed.
    pub fn cleanup_old_backups(&mut self, package: &str, keep: usize) -> BackupResult<usize> {
        let backups = self.backups_for(package)?;
        if backups.len() <= keep {
            return Ok(0);
        }

        let mut removed = 0;
        for victim in &backups[keep..] {
            self.delete_backup(&victim.id)?;
            removed += 1;
        }

        info!(package, removed, keep, "rotated backups");
        Ok(removed)
    }
}

/// Extract the trailing counter from a backup id, if present.
fn parse_id_counter(id: &str) -> Option<u64> {
    id.rsplit('_').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        target: PathBuf,
        store: BackupStore,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        fs::create_dir_all(&target).unwrap();

        let store = BackupStore::open(
            tmp.path().join("backups"),
            tmp.path().join("backup_index.json"),
        )
        .unwrap();

        Fixture {
            _tmp: tmp,
            target,
            store,
        }
    }

    fn write_target(fx: &Fixture, rel: &str, content: &str) {
        let path = fx.target.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_create_backup_captures_existing_files_only() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "vo=gpu");

        let record = fx
            .store
            .create_backup(
                "clarity",
                &fx.target,
                &[PathBuf::from("mpv.conf"), PathBuf::from("missing.conf")],
            )
            .unwrap();

        assert_eq!(record.files, vec![PathBuf::from("mpv.conf")]);
        assert_eq!(
            fs::read_to_string(record.backup_dir.join("mpv.conf")).unwrap(),
            "vo=gpu"
        );
    }

    #[test]
    fn test_empty_backup_is_valid() {
        let mut fx = fixture();

        let record = fx.store.create_backup("clarity", &fx.target, &[]).unwrap();

        assert!(record.files.is_empty());
        assert!(record.backup_dir.is_dir());
        assert_eq!(fx.store.backups_for("clarity").unwrap().len(), 1);
    }

    #[test]
    fn test_ids_are_unique_and_ordered_under_rapid_calls() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "vo=gpu");

        let files = vec![PathBuf::from("mpv.conf")];
        let ids: Vec<String> = (0..5)
            .map(|_| {
                fx.store
                    .create_backup("clarity", &fx.target, &files)
                    .unwrap()
                    .id
            })
            .collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted, "ids must sort in creation order");

        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len(), "ids must be unique");
    }

    #[test]
    fn test_counter_survives_reopen() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "vo=gpu");

        let first = fx
            .store
            .create_backup("clarity", &fx.target, &[PathBuf::from("mpv.conf")])
            .unwrap();

        let root = fx.store.root().to_path_buf();
        let index_path = fx.store.index.path().to_path_buf();
        let mut reopened = BackupStore::open(root, index_path).unwrap();

        let second = reopened
            .create_backup("clarity", &fx.target, &[PathBuf::from("mpv.conf")])
            .unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn test_list_backups_newest_first() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "vo=gpu");

        let files = vec![PathBuf::from("mpv.conf")];
        let a = fx.store.create_backup("clarity", &fx.target, &files).unwrap();
        let b = fx.store.create_backup("clarity", &fx.target, &files).unwrap();
        let c = fx.store.create_backup("other", &fx.target, &files).unwrap();

        let all = fx.store.list_backups().unwrap();
        assert_eq!(
            all.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
            vec![c.id, b.id.clone(), a.id.clone()]
        );

        let clarity = fx.store.backups_for("clarity").unwrap();
        assert_eq!(
            clarity.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
            vec![b.id, a.id]
        );
    }

    #[test]
    fn test_list_skips_entries_with_missing_directory() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "vo=gpu");

        let record = fx
            .store
            .create_backup("clarity", &fx.target, &[PathBuf::from("mpv.conf")])
            .unwrap();
        fs::remove_dir_all(&record.backup_dir).unwrap();

        // Not fatal, just excluded.
        assert!(fx.store.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_restore_is_additive() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "original");

        let record = fx
            .store
            .create_backup("clarity", &fx.target, &[PathBuf::from("mpv.conf")])
            .unwrap();

        // Mutate after the backup: one file changed, one added.
        write_target(&fx, "mpv.conf", "changed");
        write_target(&fx, "user-added.conf", "keep me");

        let restored = fx.store.restore_backup(&record.id).unwrap();

        assert_eq!(restored, vec![fx.target.join("mpv.conf")]);
        assert_eq!(
            fs::read_to_string(fx.target.join("mpv.conf")).unwrap(),
            "original"
        );
        assert_eq!(
            fs::read_to_string(fx.target.join("user-added.conf")).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn test_restore_unknown_id() {
        let fx = fixture();
        let err = fx.store.restore_backup("nope").unwrap_err();
        assert!(matches!(err, BackupError::NotFound { .. }));
    }

    #[test]
    fn test_failed_snapshot_leaves_no_dangling_backup() {
        let mut fx = fixture();
        // A directory where a file is expected makes the copy fail.
        fs::create_dir_all(fx.target.join("broken.conf")).unwrap();
        write_target(&fx, "ok.conf", "fine");

        let err = fx
            .store
            .create_backup(
                "clarity",
                &fx.target,
                &[PathBuf::from("ok.conf"), PathBuf::from("broken.conf")],
            )
            .unwrap_err();
        assert!(matches!(err, BackupError::Fs(_)));

        // No index entry and no leftover snapshot directory.
        assert!(fx.store.list_backups().unwrap().is_empty());
        let leftover = fs::read_dir(fx.store.root())
            .map(|it| it.count())
            .unwrap_or(0);
        assert_eq!(leftover, 0);
    }

    #[test]
    fn test_cleanup_keeps_most_recent_per_package() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "vo=gpu");
        let files = vec![PathBuf::from("mpv.conf")];

        for _ in 0..7 {
            fx.store.create_backup("clarity", &fx.target, &files).unwrap();
        }
        let other = fx.store.create_backup("other", &fx.target, &files).unwrap();

        let removed = fx.store.cleanup_old_backups("clarity", 5).unwrap();
        assert_eq!(removed, 2);

        let remaining = fx.store.backups_for("clarity").unwrap();
        assert_eq!(remaining.len(), 5);

        // Rotation is per package.
        assert_eq!(fx.store.backups_for("other").unwrap().len(), 1);
        assert!(other.backup_dir.is_dir());
    }

    #[test]
    fn test_cleanup_below_keep_count_is_noop() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "vo=gpu");

        fx.store
            .create_backup("clarity", &fx.target, &[PathBuf::from("mpv.conf")])
            .unwrap();

        assert_eq!(fx.store.cleanup_old_backups("clarity", 5).unwrap(), 0);
        assert_eq!(fx.store.backups_for("clarity").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_backup_removes_directory_and_entry() {
        let mut fx = fixture();
        write_target(&fx, "mpv.conf", "vo=gpu");

        let record = fx
            .store
            .create_backup("clarity", &fx.target, &[PathBuf::from("mpv.conf")])
            .unwrap();

        fx.store.delete_backup(&record.id).unwrap();

        assert!(!record.backup_dir.exists());
        assert!(fx.store.list_backups().unwrap().is_empty());

        // Deleting again is a no-op.
        fx.store.delete_backup(&record.id).unwrap();
    }
}
