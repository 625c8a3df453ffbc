//! CLI error type and process exit codes.

use confpack::backup::BackupError;
use confpack::install::InstallError;
use confpack::manifest::ManifestError;
use confpack::paths::PathError;
use confpack::profile::ProfileError;
use confpack::repository::RepoError;
use confpack::validate::ValidationReport;
use thiserror::Error;

/// Top-level CLI error. Each variant maps to a distinct exit code so
/// scripts can react to failure classes.
#[derive(Debug, Error)]
pub enum CliError {
    /// Catch-all for failures outside the classes below.
    #[error("{0}")]
    General(String),

    /// Package validation failed.
    #[error("validation failed: {report}")]
    Validation { report: ValidationReport },

    /// Install/uninstall/update failed.
    #[error("{0}")]
    Installation(String),

    /// A backup operation failed.
    #[error("{0}")]
    Backup(String),

    /// A required path could not be resolved.
    #[error("{0}")]
    Path(String),

    /// Files already exist in the target and conflicts were not allowed.
    #[error("{0} conflicting file(s) already exist in the target directory; re-run without --no-overwrite to back them up and proceed")]
    Conflict(usize),
}

impl CliError {
    /// Process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::General(_) => 1,
            Self::Validation { .. } => 2,
            Self::Installation(_) => 3,
            Self::Backup(_) => 4,
            Self::Path(_) => 5,
            Self::Conflict(_) => 6,
        }
    }
}

impl From<InstallError> for CliError {
    fn from(e: InstallError) -> Self {
        match e {
            InstallError::Validation { report } => Self::Validation { report },
            InstallError::Conflicts { paths } => Self::Conflict(paths.len()),
            InstallError::Backup { source } => Self::Backup(source.to_string()),
            other => Self::Installation(other.to_string()),
        }
    }
}

impl From<ProfileError> for CliError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::Install(inner) => inner.into(),
            other => Self::General(other.to_string()),
        }
    }
}

impl From<BackupError> for CliError {
    fn from(e: BackupError) -> Self {
        Self::Backup(e.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(e: PathError) -> Self {
        Self::Path(e.to_string())
    }
}

impl From<RepoError> for CliError {
    fn from(e: RepoError) -> Self {
        Self::General(e.to_string())
    }
}

impl From<ManifestError> for CliError {
    fn from(e: ManifestError) -> Self {
        Self::General(e.to_string())
    }
}
