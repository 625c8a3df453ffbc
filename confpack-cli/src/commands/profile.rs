//! `profile` command: list, inspect, and switch configuration profiles.

use clap::Subcommand;
use confpack::index::ProfileIndex;
use confpack::package::{PlayerKind, ProfileKind};
use confpack::profile::ProfileManager;
use confpack::{paths, InstallOptions};

use crate::commands::common::{open_installer, DirArgs};
use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List profiles and the packages that provide them
    List {
        /// Player to list profiles for
        #[arg(long, default_value = "mpv")]
        player: PlayerKind,
    },
    /// Show the active profile for a player
    Active {
        /// Player to query
        #[arg(long, default_value = "mpv")]
        player: PlayerKind,
    },
    /// Install the package that provides a profile
    Switch {
        /// Profile to switch to (performance, quality, cinematic, default)
        profile: ProfileKind,
        /// Player to switch the profile for
        #[arg(long, default_value = "mpv")]
        player: PlayerKind,
        /// Plan the switch without changing any files
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

/// Run the profile command.
pub fn run(dirs: &DirArgs, action: ProfileAction) -> Result<(), CliError> {
    match action {
        ProfileAction::List { player } => list(dirs, player),
        ProfileAction::Active { player } => active(dirs, player),
        ProfileAction::Switch {
            profile,
            player,
            dry_run,
        } => switch(dirs, profile, player, dry_run),
    }
}

fn open_manager(dirs: &DirArgs) -> Result<ProfileManager, CliError> {
    Ok(ProfileManager::new(
        dirs.repository(),
        ProfileIndex::new(paths::default_profile_index()?),
    ))
}

fn list(dirs: &DirArgs, player: PlayerKind) -> Result<(), CliError> {
    let manager = open_manager(dirs)?;
    let active = manager.active_profile(player)?;

    for profile in ProfileManager::list_profiles() {
        let providers = manager.providers(profile, player)?;
        let marker = if Some(profile) == active {
            " [active]"
        } else {
            ""
        };
        match providers.first() {
            Some(pkg) => println!("{profile}{marker} ({pkg})"),
            None => println!("{profile}{marker} (no package)"),
        }
    }

    Ok(())
}

fn active(dirs: &DirArgs, player: PlayerKind) -> Result<(), CliError> {
    let manager = open_manager(dirs)?;
    match manager.active_profile(player)? {
        Some(profile) => println!("{profile}"),
        None => println!("No active profile for {player}."),
    }
    Ok(())
}

fn switch(
    dirs: &DirArgs,
    profile: ProfileKind,
    player: PlayerKind,
    dry_run: bool,
) -> Result<(), CliError> {
    let manager = open_manager(dirs)?;
    let target = dirs.resolve_target(player)?;
    let mut installer = open_installer()?;
    let options = if dry_run {
        InstallOptions::dry_run()
    } else {
        InstallOptions::default()
    };

    let package = manager.switch_profile(profile, player, &target, &mut installer, &options)?;

    if dry_run {
        println!("Dry run: switching {player} to {profile} would install {package}.");
    } else {
        println!("Switched {player} to the {profile} profile ({package}).");
    }
    Ok(())
}
