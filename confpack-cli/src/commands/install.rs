//! `install`, `uninstall`, `update`, and `verify` commands.

use confpack::install::{ConflictPolicy, InstallOptions};

use crate::commands::common::{find_package, open_installer, DirArgs};
use crate::error::CliError;

fn options(dry_run: bool, no_overwrite: bool) -> InstallOptions {
    InstallOptions {
        dry_run,
        conflict_policy: if no_overwrite {
            ConflictPolicy::Abort
        } else {
            ConflictPolicy::Backup
        },
    }
}

/// Run the install command.
pub fn install(
    dirs: &DirArgs,
    name: &str,
    dry_run: bool,
    no_overwrite: bool,
) -> Result<(), CliError> {
    let loaded = find_package(dirs, name)?;
    let target = dirs.resolve_target(loaded.package.player)?;
    let mut installer = open_installer()?;

    let outcome = installer.install(
        &loaded.package,
        &loaded.root,
        &target,
        &options(dry_run, no_overwrite),
    )?;

    if outcome.dry_run {
        println!("Dry run; no files were changed. Planned actions:");
        for action in &outcome.actions {
            println!("  {action}");
        }
        return Ok(());
    }

    for warning in &outcome.warnings {
        println!("warning: {warning}");
    }
    if let Some(id) = &outcome.backup_id {
        println!("Backed up overwritten files as {id}");
    }
    println!(
        "Installed {} v{} ({} file(s)) into {}",
        outcome.package,
        outcome.version,
        outcome.installed_files.len(),
        outcome.target_dir.display()
    );

    Ok(())
}

/// Run the uninstall command.
pub fn uninstall(name: &str, dry_run: bool) -> Result<(), CliError> {
    let mut installer = open_installer()?;
    let outcome = installer.uninstall(name, &options(dry_run, false))?;

    if outcome.dry_run {
        println!("Dry run; no files were changed. Planned actions:");
        for action in &outcome.actions {
            println!("  {action}");
        }
        return Ok(());
    }

    if let Some(id) = &outcome.backup_id {
        println!("Removed files saved as backup {id}");
    }
    println!(
        "Uninstalled {} ({} file(s) removed)",
        outcome.package,
        outcome.removed_files.len()
    );

    Ok(())
}

/// Run the update command.
pub fn update(
    dirs: &DirArgs,
    name: &str,
    dry_run: bool,
    no_overwrite: bool,
) -> Result<(), CliError> {
    let loaded = find_package(dirs, name)?;
    let target = dirs.resolve_target(loaded.package.player)?;
    let mut installer = open_installer()?;

    let outcome = installer.update(
        &loaded.package,
        &loaded.root,
        &target,
        &options(dry_run, no_overwrite),
    )?;

    if outcome.install.dry_run {
        println!("Dry run; no files were changed. Planned actions:");
        for action in &outcome.install.actions {
            println!("  {action}");
        }
        return Ok(());
    }

    for warning in &outcome.install.warnings {
        println!("warning: {warning}");
    }
    println!(
        "Updated {} to v{} ({} stale file(s) removed)",
        outcome.install.package,
        outcome.install.version,
        outcome.removed_stale.len()
    );

    Ok(())
}

/// Run the verify command.
pub fn verify(name: &str) -> Result<(), CliError> {
    let installer = open_installer()?;
    let issues = installer.verify(name)?;

    if issues.is_empty() {
        println!("{name} is intact.");
        Ok(())
    } else {
        for issue in &issues {
            println!("{issue}");
        }
        Err(CliError::Installation(format!(
            "{name}: {} issue(s) found",
            issues.len()
        )))
    }
}
