//! Install, uninstall, and update orchestration.
//!
//! The [`Installer`] drives every operation through the same staged flow:
//!
//! ```text
//! Validating -> BackingUp -> Copying -> Verifying -> Committed
//! ```
//!
//! with an error edge from any non-terminal stage. The safety rules:
//!
//! - no filesystem write happens before validation passes;
//! - a backup is taken before any existing file is overwritten or removed,
//!   and a backup failure aborts the operation outright;
//! - a copy failure rolls the target directory back to its pre-operation
//!   state (restore the backup, delete files the operation created);
//! - verification after the copy is advisory and never rolls back.
//!
//! Operations run to completion before returning; there is no suspension
//! point. Concurrent invocations against the same target directory are a
//! documented misuse, not a handled case.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::{info, warn};

use crate::backup::{BackupError, BackupStore, DEFAULT_KEEP_COUNT};
use crate::fsops::{self, FsError};
use crate::index::{IndexError, InstallIndex, InstallRecord};
use crate::package::{Package, PackageFile};
use crate::validate::{ValidationReport, Validator};

/// Result type for installer operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// Stages of an install/uninstall/update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    /// Running pre-install validation.
    Validating,
    /// Snapshotting files the operation is about to touch.
    BackingUp,
    /// Writing (or, for uninstall, removing) files in the target.
    Copying,
    /// Re-checking required files after the writes.
    Verifying,
    /// Persisting the installation record.
    Committed,
}

impl InstallStage {
    /// Human-readable stage name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::BackingUp => "backing up",
            Self::Copying => "copying",
            Self::Verifying => "verifying",
            Self::Committed => "committing",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors that can occur during install/uninstall/update operations.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The package has no installation record.
    #[error("package is not installed: {name}")]
    NotInstalled { name: String },

    /// Pre-install validation failed; no writes occurred.
    #[error("validation failed: {report}")]
    Validation { report: ValidationReport },

    /// Files already exist at target paths and the conflict policy is
    /// [`ConflictPolicy::Abort`]. The caller decides how to proceed.
    #[error("{} conflicting file(s) already exist in the target directory", paths.len())]
    Conflicts { paths: Vec<PathBuf> },

    /// A declared target path would escape the target directory.
    #[error("target path escapes the target directory: {path}")]
    UnsafeTarget { path: PathBuf },

    /// Taking the pre-operation backup failed; the operation aborted
    /// before any destructive step.
    #[error("backup failed, operation aborted: {source}")]
    Backup { source: BackupError },

    /// The operation failed partway and was rolled back.
    #[error(
        "operation failed while {stage}: {source} (target restored{})",
        .backup_id.as_deref().map(|id| format!(" from backup {id}")).unwrap_or_default()
    )]
    Failed {
        stage: InstallStage,
        /// Backup used for recovery, when one was taken.
        backup_id: Option<String>,
        #[source]
        source: StageFailure,
    },

    /// Reading or writing the installation index failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A filesystem operation failed outside the rolled-back copy phase.
    #[error(transparent)]
    Fs(#[from] FsError),
}

/// Underlying cause of a rolled-back stage failure.
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// How to treat files that already exist at target paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Snapshot conflicting files into a backup, then overwrite them.
    #[default]
    Backup,
    /// Refuse to install and return [`InstallError::Conflicts`].
    Abort,
}

/// Options controlling an install/uninstall/update run.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Plan the operation without touching files or indexes.
    pub dry_run: bool,
    /// Conflict handling for install/update.
    pub conflict_policy: ConflictPolicy,
}

impl InstallOptions {
    /// Options for a dry run.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }
}

/// One file operation an install/uninstall/update performs or would
/// perform (dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// Snapshot an existing target file into the backup.
    Backup { target: PathBuf },
    /// Copy a package file into the target directory.
    Copy { source: PathBuf, target: PathBuf },
    /// Remove a file from the target directory.
    Remove { target: PathBuf },
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backup { target } => write!(f, "backup {}", target.display()),
            Self::Copy { source, target } => {
                write!(f, "copy {} -> {}", source.display(), target.display())
            }
            Self::Remove { target } => write!(f, "remove {}", target.display()),
        }
    }
}

/// Result of a successful install (or install dry run).
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Name of the installed package.
    pub package: String,
    /// Version installed.
    pub version: String,
    /// Target directory.
    pub target_dir: PathBuf,
    /// Backup taken before the install, if any files needed protection.
    pub backup_id: Option<String>,
    /// Installed file paths, relative to the target directory.
    pub installed_files: Vec<PathBuf>,
    /// Advisory verification warnings; never cause a rollback.
    pub warnings: Vec<String>,
    /// File operations performed (or planned, for a dry run).
    pub actions: Vec<FileAction>,
    /// True when nothing was written.
    pub dry_run: bool,
}

/// Result of a successful uninstall (or uninstall dry run).
#[derive(Debug, Clone)]
pub struct UninstallOutcome {
    /// Name of the removed package.
    pub package: String,
    /// Backup taken before removal.
    pub backup_id: Option<String>,
    /// Files removed, relative to the target directory.
    pub removed_files: Vec<PathBuf>,
    /// File operations performed (or planned).
    pub actions: Vec<FileAction>,
    /// True when nothing was removed.
    pub dry_run: bool,
}

/// Result of a successful update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The install half of the update.
    pub install: InstallOutcome,
    /// Files from the previous version that the new version no longer
    /// declares, removed after the install committed.
    pub removed_stale: Vec<PathBuf>,
}

/// Orchestrates package installation with backup and rollback.
///
/// Owns the lifecycle of [`InstallRecord`]s: one per installed package,
/// created on install, replaced on update, removed on uninstall.
pub struct Installer {
    validator: Validator,
    backups: BackupStore,
    index: InstallIndex,
    keep_backups: usize,
}

impl Installer {
    /// Create an installer from its collaborators.
    pub fn new(validator: Validator, backups: BackupStore, index: InstallIndex) -> Self {
        Self {
            validator,
            backups,
            index,
            keep_backups: DEFAULT_KEEP_COUNT,
        }
    }

    /// Set the per-package backup rotation bound (builder pattern).
    pub fn with_keep_backups(mut self, keep: usize) -> Self {
        self.keep_backups = keep;
        self
    }

    /// Access the backup store.
    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Mutable access to the backup store (restore, cleanup).
    pub fn backups_mut(&mut self) -> &mut BackupStore {
        &mut self.backups
    }

    /// All installation records, keyed by package name.
    pub fn installed(&self) -> InstallResult<BTreeMap<String, InstallRecord>> {
        Ok(self.index.load()?)
    }

    /// Install `package` from `source_root` into `target_dir`.
    ///
    /// Re-installing an already-installed package is idempotent: it
    /// re-validates, takes a fresh backup of anything it would overwrite,
    /// re-copies, and ends in the same state as a single install.
    pub fn install(
        &mut self,
        package: &Package,
        source_root: &Path,
        target_dir: &Path,
        options: &InstallOptions,
    ) -> InstallResult<InstallOutcome> {
        self.install_protected(package, source_root, target_dir, options, &[])
    }

    /// Install with extra paths to include in the pre-install backup.
    ///
    /// Used by [`Installer::update`] so that stale files removed after the
    /// install are protected by the same backup.
    fn install_protected(
        &mut self,
        package: &Package,
        source_root: &Path,
        target_dir: &Path,
        options: &InstallOptions,
        extra_protect: &[PathBuf],
    ) -> InstallResult<InstallOutcome> {
        // Stage: validating. No writes have happened yet.
        let report = self.validator.validate(package, source_root);
        if !report.passed() {
            return Err(InstallError::Validation { report });
        }

        let files = applicable_files(package, source_root);

        // The validator already rejects these; checked again before any write.
        for file in &files {
            if !file.has_safe_target() {
                return Err(InstallError::UnsafeTarget {
                    path: file.target.clone(),
                });
            }
        }

        // Conflicts: files the install would overwrite.
        let conflicts: Vec<PathBuf> = files
            .iter()
            .filter(|f| target_dir.join(&f.target).exists())
            .map(|f| f.target.clone())
            .collect();

        if options.conflict_policy == ConflictPolicy::Abort && !conflicts.is_empty() {
            return Err(InstallError::Conflicts { paths: conflicts });
        }

        // Everything the backup must protect before files change.
        let mut protect: Vec<PathBuf> = conflicts;
        for extra in extra_protect {
            if target_dir.join(extra).exists() && !protect.contains(extra) {
                protect.push(extra.clone());
            }
        }

        let mut actions: Vec<FileAction> = protect
            .iter()
            .map(|p| FileAction::Backup { target: p.clone() })
            .collect();
        actions.extend(files.iter().map(|f| FileAction::Copy {
            source: f.source.clone(),
            target: f.target.clone(),
        }));

        if options.dry_run {
            return Ok(InstallOutcome {
                package: package.name.clone(),
                version: package.version.clone(),
                target_dir: target_dir.to_path_buf(),
                backup_id: None,
                installed_files: files.iter().map(|f| f.target.clone()).collect(),
                warnings: Vec::new(),
                actions,
                dry_run: true,
            });
        }

        fsops::ensure_writable_dir(target_dir)?;

        // Stage: backing up. Only when the backup protects something;
        // a backup failure aborts before any destructive step.
        let backup_id = if protect.is_empty() {
            None
        } else {
            let record = self
                .backups
                .create_backup(&package.name, target_dir, &protect)
                .map_err(|source| InstallError::Backup { source })?;
            Some(record.id)
        };

        // Stage: copying. Track what pre-existed so rollback can tell
        // restored files from created ones, and which directories the
        // copies bring into existence so rollback removes exactly those.
        let pre_existing: BTreeSet<PathBuf> = protect.iter().cloned().collect();
        let mut written: Vec<PathBuf> = Vec::new();
        let mut created_dirs: Vec<PathBuf> = Vec::new();

        for file in &files {
            let dest = target_dir.join(&file.target);
            record_missing_ancestors(&dest, target_dir, &mut created_dirs);
            if let Err(e) = fsops::copy_file(&source_root.join(&file.source), &dest) {
                // The failing copy may have left a partial destination
                // behind (e.g. disk full mid-write). If the path did not
                // exist before the operation, it must not survive it.
                if !pre_existing.contains(&file.target) {
                    if let Err(cleanup) = fsops::remove_file(&dest) {
                        warn!(file = %dest.display(), error = %cleanup, "partial file cleanup failed");
                    }
                }
                self.roll_back(
                    target_dir,
                    &written,
                    &pre_existing,
                    &created_dirs,
                    backup_id.as_deref(),
                );
                return Err(InstallError::Failed {
                    stage: InstallStage::Copying,
                    backup_id,
                    source: e.into(),
                });
            }
            written.push(file.target.clone());
        }

        // Stage: verifying. Advisory only; the writes are already done
        // and an anomaly here is an environment problem, not ours.
        let warnings = verify_files(package, target_dir);

        // Stage: committing.
        let record = InstallRecord {
            package: package.name.clone(),
            version: package.version.clone(),
            target_dir: target_dir.to_path_buf(),
            backup_id: backup_id.clone(),
            files: written.clone(),
            installed_at: Local::now(),
        };

        let mut records = self.index.load()?;
        records.insert(package.name.clone(), record);
        if let Err(e) = self.index.save(&records) {
            self.roll_back(
                target_dir,
                &written,
                &pre_existing,
                &created_dirs,
                backup_id.as_deref(),
            );
            return Err(InstallError::Failed {
                stage: InstallStage::Committed,
                backup_id,
                source: e.into(),
            });
        }

        // Rotation is best-effort housekeeping after a committed install.
        if let Err(e) = self
            .backups
            .cleanup_old_backups(&package.name, self.keep_backups)
        {
            warn!(package = package.name, error = %e, "backup rotation failed");
        }

        info!(
            package = package.name,
            version = package.version,
            files = written.len(),
            backup = backup_id.as_deref().unwrap_or("none"),
            "installed package"
        );

        Ok(InstallOutcome {
            package: package.name.clone(),
            version: package.version.clone(),
            target_dir: target_dir.to_path_buf(),
            backup_id,
            installed_files: written,
            warnings,
            actions,
            dry_run: false,
        })
    }

    /// Uninstall a package by name.
    ///
    /// Removes exactly the paths recorded at install time; anything on
    /// disk that is not in the record (user-added files) is preserved.
    /// A file the user deleted and recreated under a recorded name is
    /// indistinguishable from a tool-managed file and will be removed —
    /// an accepted limitation of record-based tracking.
    pub fn uninstall(
        &mut self,
        name: &str,
        options: &InstallOptions,
    ) -> InstallResult<UninstallOutcome> {
        let mut records = self.index.load()?;
        let record = records
            .get(name)
            .cloned()
            .ok_or_else(|| InstallError::NotInstalled {
                name: name.to_string(),
            })?;

        let existing: Vec<PathBuf> = record
            .files
            .iter()
            .filter(|rel| record.target_dir.join(rel).exists())
            .cloned()
            .collect();

        let mut actions: Vec<FileAction> = existing
            .iter()
            .map(|p| FileAction::Backup { target: p.clone() })
            .collect();
        actions.extend(
            existing
                .iter()
                .map(|p| FileAction::Remove { target: p.clone() }),
        );

        if options.dry_run {
            return Ok(UninstallOutcome {
                package: name.to_string(),
                backup_id: None,
                removed_files: existing,
                actions,
                dry_run: true,
            });
        }

        // Uninstall always backs up: files about to be removed are the
        // thing the backup protects. An empty snapshot is still taken so
        // the operation is uniformly recoverable.
        let backup = self
            .backups
            .create_backup(name, &record.target_dir, &existing)
            .map_err(|source| InstallError::Backup { source })?;

        let mut removed = Vec::new();
        for rel in &existing {
            let path = record.target_dir.join(rel);
            if let Err(e) = fsops::remove_file(&path) {
                // Put back what we already removed and abort.
                if let Err(restore_err) = self.backups.restore_backup(&backup.id) {
                    warn!(backup = backup.id, error = %restore_err, "rollback restore failed");
                }
                return Err(InstallError::Failed {
                    stage: InstallStage::Copying,
                    backup_id: Some(backup.id),
                    source: e.into(),
                });
            }
            removed.push(rel.clone());
        }

        fsops::prune_empty_dirs(&record.target_dir)?;

        records.remove(name);
        self.index.save(&records)?;

        info!(package = name, files = removed.len(), "uninstalled package");

        Ok(UninstallOutcome {
            package: name.to_string(),
            backup_id: Some(backup.id),
            removed_files: removed,
            actions,
            dry_run: false,
        })
    }

    /// Update an installed package to a new version.
    ///
    /// Runs a normal install of the new version, then removes files that
    /// the previous version installed but the new one no longer declares.
    /// Stale files are included in the pre-install backup so their removal
    /// is protected too.
    pub fn update(
        &mut self,
        package: &Package,
        source_root: &Path,
        target_dir: &Path,
        options: &InstallOptions,
    ) -> InstallResult<UpdateOutcome> {
        let records = self.index.load()?;
        let previous = records
            .get(&package.name)
            .cloned()
            .ok_or_else(|| InstallError::NotInstalled {
                name: package.name.clone(),
            })?;

        let new_targets: BTreeSet<PathBuf> = applicable_files(package, source_root)
            .iter()
            .map(|f| f.target.clone())
            .collect();
        let stale: Vec<PathBuf> = previous
            .files
            .iter()
            .filter(|rel| !new_targets.contains(*rel))
            .cloned()
            .collect();

        let mut install =
            self.install_protected(package, source_root, target_dir, options, &stale)?;

        let mut removed_stale = Vec::new();
        for rel in &stale {
            let path = target_dir.join(rel);
            if !path.exists() {
                continue;
            }
            install.actions.push(FileAction::Remove { target: rel.clone() });
            if options.dry_run {
                removed_stale.push(rel.clone());
                continue;
            }
            match fsops::remove_file(&path) {
                Ok(()) => removed_stale.push(rel.clone()),
                // The new version is installed and committed; a stale
                // leftover is worth a warning, not a rollback.
                Err(e) => warn!(file = %rel.display(), error = %e, "failed to remove stale file"),
            }
        }

        if !options.dry_run {
            fsops::prune_empty_dirs(target_dir)?;
        }

        info!(
            package = package.name,
            from = previous.version,
            to = package.version,
            stale = removed_stale.len(),
            "updated package"
        );

        Ok(UpdateOutcome {
            install,
            removed_stale,
        })
    }

    /// Check an installed package's files on disk.
    ///
    /// Returns a list of human-readable issues: missing or unreadable
    /// recorded files. An empty list means the installation looks intact.
    pub fn verify(&self, name: &str) -> InstallResult<Vec<String>> {
        let records = self.index.load()?;
        let record = records
            .get(name)
            .ok_or_else(|| InstallError::NotInstalled {
                name: name.to_string(),
            })?;

        let mut issues = Vec::new();
        for rel in &record.files {
            let path = record.target_dir.join(rel);
            if !path.exists() {
                issues.push(format!("missing installed file: {}", path.display()));
            } else if !fsops::is_readable(&path) {
                issues.push(format!("installed file not readable: {}", path.display()));
            }
        }

        Ok(issues)
    }

    /// Undo a partially completed copy phase.
    ///
    /// Files that did not exist before the operation are deleted; the
    /// backup (when one was taken) restores the previous content of the
    /// rest. Only directories the copy phase itself created are removed;
    /// directories that were already in the target, even empty ones, stay.
    /// Best effort: rollback failures are logged, not returned.
    fn roll_back(
        &self,
        target_dir: &Path,
        written: &[PathBuf],
        pre_existing: &BTreeSet<PathBuf>,
        created_dirs: &[PathBuf],
        backup_id: Option<&str>,
    ) {
        for rel in written {
            if pre_existing.contains(rel) {
                continue;
            }
            if let Err(e) = fsops::remove_file(&target_dir.join(rel)) {
                warn!(file = %rel.display(), error = %e, "rollback removal failed");
            }
        }

        if let Some(id) = backup_id {
            if let Err(e) = self.backups.restore_backup(id) {
                warn!(backup = id, error = %e, "rollback restore failed");
            }
        }

        // Deepest first so parents become removable; a directory that
        // gained content in the meantime simply stays.
        let mut dirs = created_dirs.to_vec();
        dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
        for dir in dirs {
            let _ = std::fs::remove_dir(&dir);
        }
    }
}

/// Record the ancestors of `dest` (up to, not including, `target_dir`)
/// that do not exist yet and will be created by the upcoming copy.
fn record_missing_ancestors(dest: &Path, target_dir: &Path, created_dirs: &mut Vec<PathBuf>) {
    let mut cur = match dest.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };
    while cur.starts_with(target_dir) && cur != *target_dir && !cur.exists() {
        if !created_dirs.contains(&cur) {
            created_dirs.push(cur.clone());
        }
        match cur.parent() {
            Some(p) => cur = p.to_path_buf(),
            None => break,
        }
    }
}

/// Files the operation will actually deploy: all required files plus
/// optional files whose source exists.
fn applicable_files<'a>(package: &'a Package, source_root: &Path) -> Vec<&'a PackageFile> {
    package
        .files
        .iter()
        .filter(|f| f.required || source_root.join(&f.source).exists())
        .collect()
}

/// Advisory post-copy check: every required file must exist and be
/// readable at its target path.
fn verify_files(package: &Package, target_dir: &Path) -> Vec<String> {
    let mut warnings = Vec::new();
    for file in package.files.iter().filter(|f| f.required) {
        let path = target_dir.join(&file.target);
        if !path.exists() {
            warnings.push(format!("expected file missing after install: {}", path.display()));
        } else if !fsops::is_readable(&path) {
            warnings.push(format!("installed file not readable: {}", path.display()));
        }
    }
    warnings
}
