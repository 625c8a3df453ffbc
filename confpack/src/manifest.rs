//! Package manifest loading.
//!
//! A package directory carries a `manifest.json` describing the package
//! and its files. The manifest is the only authoring surface: everything
//! else (indexes, backup metadata) is tool-managed.
//!
//! ```json
//! {
//!   "name": "clarity",
//!   "description": "Sharp upscaling profile",
//!   "player": "mpv",
//!   "version": "1.2.0",
//!   "profile": "quality",
//!   "files": [
//!     { "source": "mpv.conf", "target": "mpv.conf", "type": "config" },
//!     { "source": "shaders/fsr.glsl", "target": "shaders/fsr.glsl",
//!       "type": "shader", "required": false }
//!   ]
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::package::{is_safe_relative, FileKind, Package, PackageFile, PlayerKind, ProfileKind};

/// Name of the manifest file inside a package directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file does not exist.
    #[error("manifest not found: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read the manifest file.
    #[error("failed to read manifest {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// The manifest is not valid JSON for the expected schema.
    #[error("invalid manifest {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A declared target path would escape the target directory, or a
    /// declared source path reaches outside the package directory.
    #[error("unsafe path in manifest {path}: {unsafe_path}")]
    UnsafePath { path: PathBuf, unsafe_path: PathBuf },
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,
    #[serde(default)]
    description: String,
    player: PlayerKind,
    version: String,
    #[serde(default)]
    profile: ProfileKind,
    files: Vec<RawFile>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    source: PathBuf,
    target: PathBuf,
    #[serde(rename = "type")]
    kind: FileKind,
    #[serde(default = "default_required")]
    required: bool,
}

fn default_required() -> bool {
    true
}

/// Load and validate the manifest at `path`.
///
/// Every declared source and target path must be safe-relative; a
/// traversal component anywhere in the manifest rejects the whole file.
pub fn load_manifest(path: &Path) -> ManifestResult<Package> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| ManifestError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let raw: RawManifest = serde_json::from_str(&content).map_err(|e| ManifestError::Invalid {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut package = Package::new(raw.name, raw.player, raw.version)
        .with_description(raw.description)
        .with_profile(raw.profile);

    for dep in raw.dependencies {
        package = package.with_dependency(dep);
    }

    for file in raw.files {
        for p in [&file.source, &file.target] {
            if !is_safe_relative(p) {
                return Err(ManifestError::UnsafePath {
                    path: path.to_path_buf(),
                    unsafe_path: p.clone(),
                });
            }
        }
        let mut pf = PackageFile::new(file.source, file.target, file.kind);
        if !file.required {
            pf = pf.optional();
        }
        package = package.with_file(pf);
    }

    Ok(package)
}

/// Load the manifest of the package rooted at `dir`.
pub fn load_package_dir(dir: &Path) -> ManifestResult<Package> {
    load_manifest(&dir.join(MANIFEST_FILE_NAME))
}
