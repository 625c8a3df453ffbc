//! `validate` command: check a package without touching the target.

use confpack::Validator;

use crate::commands::common::{find_package, DirArgs};
use crate::error::CliError;

/// Run the validate command.
pub fn run(dirs: &DirArgs, name: &str) -> Result<(), CliError> {
    let loaded = find_package(dirs, name)?;
    let report = Validator::new().validate(&loaded.package, &loaded.root);

    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    for error in &report.errors {
        println!("error: {error}");
    }

    if report.passed() {
        println!(
            "{} is valid ({} warning(s))",
            loaded.package,
            report.warnings.len()
        );
        Ok(())
    } else {
        Err(CliError::Validation { report })
    }
}
