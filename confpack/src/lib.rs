//! Confpack - configuration package deployment for media players
//!
//! This library installs curated configuration packages (configs, plugin
//! scripts, shaders) into mpv and VLC configuration directories, with
//! validation before any write, backups before any overwrite, and rollback
//! when an operation fails partway.
//!
//! The main entry points:
//!
//! - [`repository::PackageRepository`] discovers packages by their
//!   `manifest.json`
//! - [`validate::Validator`] checks package contents without touching the
//!   target
//! - [`install::Installer`] performs install, uninstall, and update with
//!   the backup/rollback guarantees
//! - [`backup::BackupStore`] manages the snapshots the installer relies on
//! - [`profile::ProfileManager`] switches a player between configuration
//!   profiles by installing the package that provides one

pub mod backup;
pub mod fsops;
pub mod index;
pub mod install;
pub mod manifest;
pub mod package;
pub mod paths;
pub mod profile;
pub mod repository;
pub mod validate;

pub use backup::{BackupStore, DEFAULT_KEEP_COUNT};
pub use install::{ConflictPolicy, InstallError, InstallOptions, Installer};
pub use package::{FileKind, Package, PackageFile, PlayerKind, ProfileKind};
pub use profile::ProfileManager;
pub use repository::PackageRepository;
pub use validate::{ValidationReport, Validator};
