//! File system primitives used by the backup store and installer.
//!
//! Every operation returns a structured error carrying the path it failed
//! on; retry policy is the caller's concern.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Result type for file system operations.
pub type FsResult<T> = Result<T, FsError>;

/// Errors that can occur during file system operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// The source path does not exist.
    #[error("source does not exist: {path}")]
    MissingSource { path: PathBuf },

    /// The source path is not a regular file.
    #[error("source is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// Failed to read a file or directory.
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// Failed to copy a file.
    #[error("failed to copy to {path}: {source}")]
    Copy { path: PathBuf, source: io::Error },

    /// Failed to remove a file or directory.
    #[error("failed to remove {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    /// The directory exists but is not writable.
    #[error("directory is not writable: {path}")]
    NotWritable { path: PathBuf },
}

/// Copy a single regular file, creating missing parent directories.
pub fn copy_file(source: &Path, dest: &Path) -> FsResult<()> {
    if !source.exists() {
        return Err(FsError::MissingSource {
            path: source.to_path_buf(),
        });
    }
    if !source.is_file() {
        return Err(FsError::NotAFile {
            path: source.to_path_buf(),
        });
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| FsError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::copy(source, dest).map_err(|e| FsError::Copy {
        path: dest.to_path_buf(),
        source: e,
    })?;

    debug!(source = %source.display(), dest = %dest.display(), "copied file");
    Ok(())
}

/// Recursively copy a directory tree, preserving relative structure.
///
/// Returns the relative paths of every file written, in traversal order,
/// so callers can record what landed without re-walking the filesystem.
/// On failure the already copied files are left in place; the caller
/// decides whether to clean up.
pub fn copy_tree(source: &Path, dest: &Path) -> FsResult<Vec<PathBuf>> {
    if !source.exists() {
        return Err(FsError::MissingSource {
            path: source.to_path_buf(),
        });
    }

    let mut copied = Vec::new();
    copy_tree_inner(source, dest, Path::new(""), &mut copied)?;
    Ok(copied)
}

fn copy_tree_inner(
    source: &Path,
    dest: &Path,
    prefix: &Path,
    copied: &mut Vec<PathBuf>,
) -> FsResult<()> {
    fs::create_dir_all(dest).map_err(|e| FsError::CreateDir {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let entries = fs::read_dir(source).map_err(|e| FsError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| FsError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;

        let source_path = entry.path();
        let dest_path = dest.join(entry.file_name());
        let rel_path = prefix.join(entry.file_name());

        if source_path.is_dir() {
            copy_tree_inner(&source_path, &dest_path, &rel_path, copied)?;
        } else {
            fs::copy(&source_path, &dest_path).map_err(|e| FsError::Copy {
                path: dest_path.clone(),
                source: e,
            })?;
            copied.push(rel_path);
        }
    }

    Ok(())
}

/// Remove a single file. Removing a missing file is a no-op.
pub fn remove_file(path: &Path) -> FsResult<()> {
    if !path.exists() {
        return Ok(());
    }

    fs::remove_file(path).map_err(|e| FsError::Remove {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), "removed file");
    Ok(())
}

/// Remove a directory tree. Removing a missing tree is a no-op.
pub fn remove_tree(path: &Path) -> FsResult<()> {
    if !path.exists() {
        return Ok(());
    }

    fs::remove_dir_all(path).map_err(|e| FsError::Remove {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), "removed tree");
    Ok(())
}

/// Ensure a directory exists and is writable.
pub fn ensure_writable_dir(path: &Path) -> FsResult<()> {
    fs::create_dir_all(path).map_err(|e| FsError::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })?;

    let metadata = fs::metadata(path).map_err(|e| FsError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.permissions().readonly() {
        return Err(FsError::NotWritable {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Check whether a path exists and can be opened for reading.
pub fn is_readable(path: &Path) -> bool {
    path.is_file() && fs::File::open(path).is_ok()
}

/// Remove now-empty directories under `base`, deepest first.
///
/// `base` itself is never removed. Errors on individual directories are
/// ignored; a directory that cannot be removed simply stays.
pub fn prune_empty_dirs(base: &Path) -> FsResult<()> {
    let mut dirs = Vec::new();
    collect_dirs(base, &mut dirs)?;

    // Deepest paths first so parents become removable.
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));

    for dir in dirs {
        if fs::read_dir(&dir).map(|mut it| it.next().is_none()).unwrap_or(false) {
            let _ = fs::remove_dir(&dir);
        }
    }

    Ok(())
}

fn collect_dirs(base: &Path, dirs: &mut Vec<PathBuf>) -> FsResult<()> {
    let entries = fs::read_dir(base).map_err(|e| FsError::Read {
        path: base.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| FsError::Read {
            path: base.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path.clone());
            collect_dirs(&path, dirs)?;
        }
    }

    Ok(())
}
