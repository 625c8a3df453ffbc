//! Core package descriptor.
//!
//! The [`Package`] struct is the immutable description of a configuration
//! bundle: identity, declared files, and dependencies. It is constructed
//! once from a manifest and read-only thereafter.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::file::PackageFile;
use super::types::{FileKind, PlayerKind, ProfileKind};

/// An immutable configuration package descriptor.
///
/// # Example
///
/// ```
/// use confpack::package::{FileKind, Package, PackageFile, PlayerKind, ProfileKind};
///
/// let package = Package::new("clarity", PlayerKind::Mpv, "1.2.0")
///     .with_description("High-quality mpv defaults")
///     .with_profile(ProfileKind::Quality)
///     .with_file(PackageFile::new("mpv.conf", "mpv.conf", FileKind::Config));
///
/// assert_eq!(package.name, "clarity");
/// assert_eq!(package.files.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Unique package name.
    pub name: String,

    /// Human-readable description.
    pub description: String,

    /// Player this package targets.
    pub player: PlayerKind,

    /// Version string (opaque; newest-wins semantics are the caller's).
    pub version: String,

    /// Profile tag.
    pub profile: ProfileKind,

    /// Declared files, in manifest order.
    pub files: Vec<PackageFile>,

    /// Names of packages this package depends on.
    pub dependencies: Vec<String>,
}

impl Package {
    /// Create a new empty package.
    pub fn new(name: impl Into<String>, player: PlayerKind, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            player,
            version: version.into(),
            profile: ProfileKind::Default,
            files: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Set the description (builder pattern).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the profile (builder pattern).
    pub fn with_profile(mut self, profile: ProfileKind) -> Self {
        self.profile = profile;
        self
    }

    /// Add a declared file (builder pattern).
    pub fn with_file(mut self, file: PackageFile) -> Self {
        self.files.push(file);
        self
    }

    /// Add a dependency name (builder pattern).
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// All declared files of a given kind, in manifest order.
    pub fn files_of_kind(&self, kind: FileKind) -> impl Iterator<Item = &PackageFile> {
        self.files.iter().filter(move |f| f.kind == kind)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} ({})", self.name, self.version, self.player)
    }
}
