//! Shared wiring for CLI commands.

use std::path::PathBuf;

use confpack::index::InstallIndex;
use confpack::package::PlayerKind;
use confpack::repository::{LoadedPackage, PackageRepository};
use confpack::validate::Validator;
use confpack::{paths, BackupStore, Installer};

use crate::error::CliError;

/// Directory options every command accepts.
#[derive(Debug, Clone, clap::Args)]
pub struct DirArgs {
    /// Directory containing package manifests
    #[arg(long = "assets", global = true, value_name = "DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Install into this directory instead of the player's default
    #[arg(long = "target", global = true, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,
}

impl DirArgs {
    /// The package repository to scan.
    pub fn repository(&self) -> PackageRepository {
        PackageRepository::new(
            self.assets_dir
                .clone()
                .unwrap_or_else(paths::default_assets_dir),
        )
    }

    /// Resolve the target directory for `player`.
    pub fn resolve_target(&self, player: PlayerKind) -> Result<PathBuf, CliError> {
        match &self.target_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(paths::default_target_dir(player)?),
        }
    }
}

/// Build the production installer over the default state locations.
pub fn open_installer() -> Result<Installer, CliError> {
    let backups = BackupStore::open(paths::default_backup_dir()?, paths::default_backup_index()?)?;
    let index = InstallIndex::new(paths::default_state_file()?);
    Ok(Installer::new(Validator::new(), backups, index))
}

/// Look up a package, resolving dependencies.
pub fn find_package(dirs: &DirArgs, name: &str) -> Result<LoadedPackage, CliError> {
    Ok(dirs.repository().get_package_checked(name)?)
}
