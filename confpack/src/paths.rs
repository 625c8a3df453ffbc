//! Well-known filesystem locations.
//!
//! Two groups of paths:
//!
//! - **player config directories**, where packages get installed; resolved
//!   per player from the platform's config directory conventions
//! - **tool state**, under `~/.confpack`: the install index, the backup
//!   store, and its index

use std::path::PathBuf;

use thiserror::Error;

use crate::package::PlayerKind;

/// Result type for path resolution.
pub type PathResult<T> = Result<T, PathError>;

/// Errors that can occur while resolving well-known paths.
#[derive(Debug, Error)]
pub enum PathError {
    /// The platform home/config directory could not be determined.
    #[error("could not determine the {what} directory for this platform")]
    Unresolvable { what: &'static str },
}

/// Candidate configuration directories for a player, most specific first.
///
/// Candidates follow each player's own lookup order: the per-user config
/// directory, then the home dotfile location.
pub fn candidate_target_dirs(player: PlayerKind) -> PathResult<Vec<PathBuf>> {
    let config = dirs::config_dir().ok_or(PathError::Unresolvable { what: "config" })?;
    let home = dirs::home_dir().ok_or(PathError::Unresolvable { what: "home" })?;

    Ok(match player {
        PlayerKind::Mpv => vec![config.join("mpv"), home.join(".config/mpv")],
        PlayerKind::Vlc => vec![config.join("vlc"), home.join(".config/vlc")],
    })
}

/// The target directory to install into for `player`.
///
/// Returns the first candidate that already exists, or the most specific
/// candidate when none do (the installer creates it).
pub fn default_target_dir(player: PlayerKind) -> PathResult<PathBuf> {
    let candidates = candidate_target_dirs(player)?;
    Ok(candidates
        .iter()
        .find(|p| p.exists())
        .cloned()
        .unwrap_or_else(|| candidates[0].clone()))
}

/// Root of the tool's own state: `~/.confpack`.
pub fn data_dir() -> PathResult<PathBuf> {
    let home = dirs::home_dir().ok_or(PathError::Unresolvable { what: "home" })?;
    Ok(home.join(".confpack"))
}

/// Default install index path: `~/.confpack/state.json`.
pub fn default_state_file() -> PathResult<PathBuf> {
    Ok(data_dir()?.join("state.json"))
}

/// Default backup store root: `~/.confpack/backups`.
pub fn default_backup_dir() -> PathResult<PathBuf> {
    Ok(data_dir()?.join("backups"))
}

/// Default backup index path: `~/.confpack/backups.json`.
pub fn default_backup_index() -> PathResult<PathBuf> {
    Ok(data_dir()?.join("backups.json"))
}

/// Default active-profile index path: `~/.confpack/profiles.json`.
pub fn default_profile_index() -> PathResult<PathBuf> {
    Ok(data_dir()?.join("profiles.json"))
}

/// Default package assets directory, relative to the working directory.
pub fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}
