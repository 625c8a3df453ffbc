//! Backup management commands.

use clap::Subcommand;
use confpack::DEFAULT_KEEP_COUNT;

use crate::commands::common::open_installer;
use crate::error::CliError;

/// Backup action subcommands.
#[derive(Debug, Subcommand)]
pub enum BackupsAction {
    /// List backups, newest first
    List {
        /// Only show backups for this package
        package: Option<String>,
    },
    /// Restore a backup's files into their original target directory
    Restore {
        /// Backup id, as shown by `backups list`
        id: String,
    },
    /// Delete a single backup
    Delete {
        /// Backup id to delete
        id: String,
    },
    /// Delete old backups, keeping the newest per package
    Cleanup {
        /// Package to clean up
        package: String,
        /// How many backups to keep
        #[arg(long, default_value_t = DEFAULT_KEEP_COUNT)]
        keep: usize,
    },
}

/// Run a backups subcommand.
pub fn run(action: BackupsAction) -> Result<(), CliError> {
    let mut installer = open_installer()?;
    let store = installer.backups_mut();

    match action {
        BackupsAction::List { package } => {
            let backups = match package {
                Some(name) => store.backups_for(&name)?,
                None => store.list_backups()?,
            };

            if backups.is_empty() {
                println!("No backups.");
                return Ok(());
            }
            for backup in &backups {
                println!(
                    "{}  {}  {} file(s)  {}",
                    backup.id,
                    backup.created_at.format("%Y-%m-%d %H:%M:%S"),
                    backup.files.len(),
                    backup.target_dir.display()
                );
            }
            Ok(())
        }
        BackupsAction::Restore { id } => {
            let restored = store.restore_backup(&id)?;
            println!("Restored {} file(s) from {id}", restored.len());
            Ok(())
        }
        BackupsAction::Delete { id } => {
            store.delete_backup(&id)?;
            println!("Deleted backup {id}");
            Ok(())
        }
        BackupsAction::Cleanup { package, keep } => {
            let deleted = store.cleanup_old_backups(&package, keep)?;
            println!("Deleted {deleted} old backup(s) for {package}");
            Ok(())
        }
    }
}
