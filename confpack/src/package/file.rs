//! A single declared file within a package.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::FileKind;

/// One file declared by a package.
///
/// Both paths are relative: `source` to the package root (the directory
/// containing the manifest), `target` to the installation target directory.
///
/// # Invariant
///
/// `target` must never escape the target directory. Absolute paths and
/// `..` components are rejected by [`PackageFile::has_safe_target`], which
/// the validator reports as an error and the installer checks defensively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    /// Path of the file inside the package, relative to the package root.
    pub source: PathBuf,

    /// Destination path, relative to the target directory.
    pub target: PathBuf,

    /// File kind, used for checker dispatch during validation.
    pub kind: FileKind,

    /// Whether the file must be present for the package to install.
    ///
    /// Optional files that are missing from the package are skipped with
    /// a validation warning instead of an error.
    pub required: bool,
}

impl PackageFile {
    /// Create a new required package file.
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        kind: FileKind,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            required: true,
        }
    }

    /// Mark the file as optional (builder pattern).
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Check that the target path stays inside the target directory.
    ///
    /// A safe target is relative and contains only normal components:
    /// no root, no drive prefix, no `..`.
    pub fn has_safe_target(&self) -> bool {
        is_safe_relative(&self.target)
    }
}

/// Check that a path is relative and cannot traverse above its root.
pub fn is_safe_relative(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_file_new_is_required() {
        let file = PackageFile::new("mpv.conf", "mpv.conf", FileKind::Config);

        assert_eq!(file.source, PathBuf::from("mpv.conf"));
        assert_eq!(file.target, PathBuf::from("mpv.conf"));
        assert!(file.required);
    }

    #[test]
    fn test_package_file_optional() {
        let file = PackageFile::new("extra.lua", "scripts/extra.lua", FileKind::PluginLua)
            .optional();

        assert!(!file.required);
    }

    #[test]
    fn test_safe_target_accepts_nested_relative() {
        let file = PackageFile::new("a.lua", "scripts/sub/a.lua", FileKind::PluginLua);
        assert!(file.has_safe_target());
    }

    #[test]
    fn test_safe_target_rejects_parent_components() {
        let file = PackageFile::new("a.conf", "../outside.conf", FileKind::Config);
        assert!(!file.has_safe_target());

        let sneaky = PackageFile::new("a.conf", "sub/../../outside.conf", FileKind::Config);
        assert!(!sneaky.has_safe_target());
    }

    #[test]
    fn test_safe_target_rejects_absolute() {
        let file = PackageFile::new("a.conf", "/etc/mpv/mpv.conf", FileKind::Config);
        assert!(!file.has_safe_target());
    }

    #[test]
    fn test_safe_target_rejects_empty() {
        let file = PackageFile::new("a.conf", "", FileKind::Config);
        assert!(!file.has_safe_target());
    }
}
