//! `list` command: show available and installed packages.

use crate::commands::common::{open_installer, DirArgs};
use crate::error::CliError;

/// Run the list command.
pub fn run(dirs: &DirArgs, installed_only: bool) -> Result<(), CliError> {
    let installer = open_installer()?;
    let installed = installer
        .installed()
        .map_err(|e| CliError::General(e.to_string()))?;

    if installed_only {
        if installed.is_empty() {
            println!("No packages installed.");
            return Ok(());
        }
        for record in installed.values() {
            println!(
                "{} v{} -> {}",
                record.package,
                record.version,
                record.target_dir.display()
            );
        }
        return Ok(());
    }

    let packages = dirs.repository().list_packages()?;
    if packages.is_empty() {
        println!("No packages available.");
        return Ok(());
    }

    for loaded in &packages {
        let pkg = &loaded.package;
        let marker = match installed.get(&pkg.name) {
            Some(record) if record.version == pkg.version => " [installed]",
            Some(_) => " [installed, different version]",
            None => "",
        };
        println!("{pkg}{marker}");
        if !pkg.description.is_empty() {
            println!("    {}", pkg.description);
        }
    }

    Ok(())
}
