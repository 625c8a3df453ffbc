//! Package discovery across an assets directory.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::manifest::{self, MANIFEST_FILE_NAME};
use crate::package::Package;

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors that can occur while browsing the package repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The assets directory does not exist.
    #[error("assets directory does not exist: {path}")]
    AssetsMissing { path: PathBuf },

    /// Walking the assets directory failed.
    #[error("failed to scan {path}: {source}")]
    Scan { path: PathBuf, source: io::Error },

    /// No package with the requested name was found.
    #[error("package not found: {name}")]
    NotFound { name: String },

    /// A requested package declares a dependency that is not available
    /// in the repository.
    #[error("package {package} depends on {dependency}, which is not available")]
    DependencyUnresolved { package: String, dependency: String },
}

/// A package together with the directory its manifest was found in.
///
/// The directory is the source root for install operations: every
/// declared source path resolves relative to it.
#[derive(Debug, Clone)]
pub struct LoadedPackage {
    pub package: Package,
    pub root: PathBuf,
}

/// Finds packages by scanning an assets directory for manifests.
#[derive(Debug, Clone)]
pub struct PackageRepository {
    assets_dir: PathBuf,
}

impl PackageRepository {
    /// Create a repository over `assets_dir`.
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    /// Directory this repository scans.
    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// List every valid package under the assets directory.
    ///
    /// Scans recursively for `manifest.json` files. Directories whose
    /// manifest fails to load are logged and skipped; one broken package
    /// never hides the rest.
    pub fn list_packages(&self) -> RepoResult<Vec<LoadedPackage>> {
        if !self.assets_dir.exists() {
            return Err(RepoError::AssetsMissing {
                path: self.assets_dir.clone(),
            });
        }

        let mut packages = Vec::new();
        self.scan_dir(&self.assets_dir, &mut packages)?;
        packages.sort_by(|a, b| a.package.name.cmp(&b.package.name));

        debug!(count = packages.len(), "scanned package repository");
        Ok(packages)
    }

    fn scan_dir(&self, dir: &Path, out: &mut Vec<LoadedPackage>) -> RepoResult<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| RepoError::Scan {
            path: dir.to_path_buf(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| RepoError::Scan {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();

            if path.is_dir() {
                self.scan_dir(&path, out)?;
            } else if path.file_name().is_some_and(|n| n == MANIFEST_FILE_NAME) {
                match manifest::load_manifest(&path) {
                    Ok(package) => out.push(LoadedPackage {
                        package,
                        root: dir.to_path_buf(),
                    }),
                    Err(e) => {
                        warn!(manifest = %path.display(), error = %e, "skipping invalid manifest");
                    }
                }
            }
        }

        Ok(())
    }

    /// Look up a package by name.
    pub fn get_package(&self, name: &str) -> RepoResult<LoadedPackage> {
        self.list_packages()?
            .into_iter()
            .find(|p| p.package.name == name)
            .ok_or_else(|| RepoError::NotFound {
                name: name.to_string(),
            })
    }

    /// Look up a package and check that every declared dependency is
    /// also present in the repository. Dependencies are name references
    /// only; no version constraints, no transitive resolution.
    pub fn get_package_checked(&self, name: &str) -> RepoResult<LoadedPackage> {
        let all = self.list_packages()?;
        let loaded = all
            .iter()
            .find(|p| p.package.name == name)
            .cloned()
            .ok_or_else(|| RepoError::NotFound {
                name: name.to_string(),
            })?;

        for dep in &loaded.package.dependencies {
            if !all.iter().any(|p| &p.package.name == dep) {
                return Err(RepoError::DependencyUnresolved {
                    package: loaded.package.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::TempDir;

    fn add_package(assets: &Path, dir: &str, name: &str, deps: &[&str]) {
        let root = assets.join(dir);
        fs::create_dir_all(&root).unwrap();
        let deps_json = deps
            .iter()
            .map(|d| format!("\"{d}\""))
            .collect::<Vec<_>>()
            .join(", ");
        fs::write(
            root.join(MANIFEST_FILE_NAME),
            format!(
                r#"{{
                    "name": "{name}", "player": "mpv", "version": "1.0.0",
                    "files": [], "dependencies": [{deps_json}]
                }}"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_list_finds_nested_packages_sorted() {
        let tmp = TempDir::new().unwrap();
        add_package(tmp.path(), "b/nested", "zeta", &[]);
        add_package(tmp.path(), "a", "alpha", &[]);

        let repo = PackageRepository::new(tmp.path());
        let packages = repo.list_packages().unwrap();

        let names: Vec<_> = packages.iter().map(|p| p.package.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(packages[0].root, tmp.path().join("a"));
    }

    #[test]
    fn test_invalid_manifest_is_skipped() {
        let tmp = TempDir::new().unwrap();
        add_package(tmp.path(), "good", "good", &[]);
        let bad = tmp.path().join("bad");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(MANIFEST_FILE_NAME), "not json").unwrap();

        let repo = PackageRepository::new(tmp.path());
        let packages = repo.list_packages().unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].package.name, "good");
    }

    #[test]
    fn test_missing_assets_dir() {
        let tmp = TempDir::new().unwrap();
        let repo = PackageRepository::new(tmp.path().join("nope"));
        assert!(matches!(
            repo.list_packages().unwrap_err(),
            RepoError::AssetsMissing { .. }
        ));
    }

    #[test]
    fn test_get_package_by_name() {
        let tmp = TempDir::new().unwrap();
        add_package(tmp.path(), "a", "alpha", &[]);

        let repo = PackageRepository::new(tmp.path());
        assert_eq!(repo.get_package("alpha").unwrap().package.name, "alpha");
        assert!(matches!(
            repo.get_package("ghost").unwrap_err(),
            RepoError::NotFound { .. }
        ));
    }

    #[test]
    fn test_dependency_resolution() {
        let tmp = TempDir::new().unwrap();
        add_package(tmp.path(), "base", "base", &[]);
        add_package(tmp.path(), "addon", "addon", &["base"]);
        add_package(tmp.path(), "broken", "broken", &["missing"]);

        let repo = PackageRepository::new(tmp.path());
        assert!(repo.get_package_checked("addon").is_ok());

        match repo.get_package_checked("broken").unwrap_err() {
            RepoError::DependencyUnresolved {
                package,
                dependency,
            } => {
                assert_eq!(package, "broken");
                assert_eq!(dependency, "missing");
            }
            other => panic!("expected unresolved dependency, got {other}"),
        }
    }
}
