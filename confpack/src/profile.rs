//! Configuration profile switching.
//!
//! A profile (performance, quality, cinematic, default) is realized by
//! whichever repository package declares it for a given player. Switching
//! installs that package through the regular [`Installer`] pipeline, so
//! validation, backup, and rollback guarantees all apply, then records the
//! profile as active for the player in a small persisted index.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::index::{IndexError, ProfileIndex};
use crate::install::{InstallError, InstallOptions, Installer};
use crate::package::{Package, PlayerKind, ProfileKind};
use crate::repository::{PackageRepository, RepoError};

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors that can occur while listing or switching profiles.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No repository package declares the requested profile for the player.
    #[error("no package provides the {profile} profile for {player}")]
    NoPackage {
        profile: ProfileKind,
        player: PlayerKind,
    },

    /// Scanning the package repository failed.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Installing the profile's package failed.
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Reading the active-profile index failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Lists profiles and switches the active one per player.
pub struct ProfileManager {
    repository: PackageRepository,
    index: ProfileIndex,
}

impl ProfileManager {
    /// Create a manager over `repository`, tracking active profiles in the
    /// index at `index`.
    pub fn new(repository: PackageRepository, index: ProfileIndex) -> Self {
        Self { repository, index }
    }

    /// All profiles that can be requested.
    pub fn list_profiles() -> Vec<ProfileKind> {
        ProfileKind::ALL.to_vec()
    }

    /// Repository packages that would realize `profile` for `player`, in
    /// repository order. Empty means the profile cannot be switched to.
    pub fn providers(
        &self,
        profile: ProfileKind,
        player: PlayerKind,
    ) -> ProfileResult<Vec<Package>> {
        Ok(self
            .repository
            .list_packages()?
            .into_iter()
            .map(|loaded| loaded.package)
            .filter(|p| p.profile == profile && p.player == player)
            .collect())
    }

    /// The profile currently active for `player`, if one was ever switched
    /// to. A missing index file means no active profile.
    pub fn active_profile(&self, player: PlayerKind) -> ProfileResult<Option<ProfileKind>> {
        Ok(self.index.load()?.get(&player.to_string()).copied())
    }

    /// Switch `player` to `profile` by installing the first repository
    /// package that declares the pair.
    ///
    /// The install runs through `installer` with `options`, so conflicting
    /// files are backed up (or the switch aborts) per the conflict policy,
    /// and a failed copy rolls the target back. A dry run returns the
    /// package that would be installed without touching anything.
    ///
    /// The active-profile index is updated after a successful install; a
    /// failure to persist it is logged and does not undo the switch.
    pub fn switch_profile(
        &self,
        profile: ProfileKind,
        player: PlayerKind,
        target_dir: &Path,
        installer: &mut Installer,
        options: &InstallOptions,
    ) -> ProfileResult<Package> {
        let loaded = self
            .repository
            .list_packages()?
            .into_iter()
            .find(|p| p.package.profile == profile && p.package.player == player)
            .ok_or(ProfileError::NoPackage { profile, player })?;

        installer.install(&loaded.package, &loaded.root, target_dir, options)?;
        if options.dry_run {
            return Ok(loaded.package);
        }

        if let Err(e) = self.record_active(profile, player) {
            // The configuration on disk is already switched; a stale
            // active-profile record is the lesser harm.
            warn!(
                profile = %profile,
                player = %player,
                error = %e,
                "profile installed but active-profile index update failed"
            );
        }

        info!(
            profile = %profile,
            player = %player,
            package = loaded.package.name,
            "switched profile"
        );
        Ok(loaded.package)
    }

    fn record_active(&self, profile: ProfileKind, player: PlayerKind) -> ProfileResult<()> {
        let mut profiles = self.index.load()?;
        profiles.insert(player.to_string(), profile);
        self.index.save(&profiles)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::backup::BackupStore;
    use crate::index::InstallIndex;
    use crate::validate::Validator;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        assets: PathBuf,
        target: PathBuf,
        manager: ProfileManager,
        installer: Installer,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let assets = tmp.path().join("assets");
        let target = tmp.path().join("target");
        fs::create_dir_all(&assets).unwrap();
        fs::create_dir_all(&target).unwrap();

        let manager = ProfileManager::new(
            PackageRepository::new(&assets),
            ProfileIndex::new(tmp.path().join("profiles.json")),
        );
        let backups = BackupStore::open(
            tmp.path().join("backups"),
            tmp.path().join("backup_index.json"),
        )
        .unwrap();
        let installer = Installer::new(
            Validator::new(),
            backups,
            InstallIndex::new(tmp.path().join("state.json")),
        );

        Fixture {
            tmp,
            assets,
            target,
            manager,
            installer,
        }
    }

    fn add_profile_package(fx: &Fixture, dir: &str, name: &str, profile: &str) {
        let root = fx.assets.join(dir);
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("mpv.conf"), "vo=gpu\n").unwrap();
        fs::write(
            root.join("manifest.json"),
            format!(
                r#"{{
                    "name": "{name}", "player": "mpv", "version": "1.0.0",
                    "profile": "{profile}",
                    "files": [{{"source": "mpv.conf", "target": "mpv.conf", "type": "config"}}]
                }}"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_list_profiles_is_exhaustive() {
        assert_eq!(ProfileManager::list_profiles(), ProfileKind::ALL.to_vec());
    }

    #[test]
    fn test_no_active_profile_without_state() {
        let fx = fixture();
        assert_eq!(fx.manager.active_profile(PlayerKind::Mpv).unwrap(), None);
    }

    #[test]
    fn test_switch_installs_and_records_active_profile() {
        let mut fx = fixture();
        add_profile_package(&fx, "fast", "fast-pack", "performance");

        let package = fx
            .manager
            .switch_profile(
                ProfileKind::Performance,
                PlayerKind::Mpv,
                &fx.target,
                &mut fx.installer,
                &InstallOptions::default(),
            )
            .unwrap();

        assert_eq!(package.name, "fast-pack");
        assert_eq!(
            fs::read_to_string(fx.target.join("mpv.conf")).unwrap(),
            "vo=gpu\n"
        );
        assert_eq!(
            fx.manager.active_profile(PlayerKind::Mpv).unwrap(),
            Some(ProfileKind::Performance)
        );
        // The other player stays unset.
        assert_eq!(fx.manager.active_profile(PlayerKind::Vlc).unwrap(), None);
    }

    #[test]
    fn test_switch_overwrites_previous_active_profile() {
        let mut fx = fixture();
        add_profile_package(&fx, "fast", "fast-pack", "performance");
        add_profile_package(&fx, "pretty", "pretty-pack", "quality");

        fx.manager
            .switch_profile(
                ProfileKind::Performance,
                PlayerKind::Mpv,
                &fx.target,
                &mut fx.installer,
                &InstallOptions::default(),
            )
            .unwrap();
        fx.manager
            .switch_profile(
                ProfileKind::Quality,
                PlayerKind::Mpv,
                &fx.target,
                &mut fx.installer,
                &InstallOptions::default(),
            )
            .unwrap();

        assert_eq!(
            fx.manager.active_profile(PlayerKind::Mpv).unwrap(),
            Some(ProfileKind::Quality)
        );
    }

    #[test]
    fn test_switch_without_matching_package() {
        let mut fx = fixture();
        add_profile_package(&fx, "fast", "fast-pack", "performance");

        let err = fx
            .manager
            .switch_profile(
                ProfileKind::Cinematic,
                PlayerKind::Mpv,
                &fx.target,
                &mut fx.installer,
                &InstallOptions::default(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ProfileError::NoPackage {
                profile: ProfileKind::Cinematic,
                player: PlayerKind::Mpv,
            }
        ));
    }

    #[test]
    fn test_dry_run_switch_leaves_everything_untouched() {
        let mut fx = fixture();
        add_profile_package(&fx, "fast", "fast-pack", "performance");

        let package = fx
            .manager
            .switch_profile(
                ProfileKind::Performance,
                PlayerKind::Mpv,
                &fx.target,
                &mut fx.installer,
                &InstallOptions::dry_run(),
            )
            .unwrap();

        assert_eq!(package.name, "fast-pack");
        assert!(!fx.target.join("mpv.conf").exists());
        assert_eq!(fx.manager.active_profile(PlayerKind::Mpv).unwrap(), None);
        assert!(!fx.tmp.path().join("profiles.json").exists());
    }

    #[test]
    fn test_providers_filters_by_profile_and_player() {
        let fx = fixture();
        add_profile_package(&fx, "fast", "fast-pack", "performance");
        add_profile_package(&fx, "pretty", "pretty-pack", "quality");

        let providers = fx
            .manager
            .providers(ProfileKind::Performance, PlayerKind::Mpv)
            .unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name, "fast-pack");

        assert!(fx
            .manager
            .providers(ProfileKind::Performance, PlayerKind::Vlc)
            .unwrap()
            .is_empty());
    }
}
