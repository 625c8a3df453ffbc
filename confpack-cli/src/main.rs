//! Confpack CLI - media player configuration package manager.

mod commands;
mod error;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::backups::BackupsAction;
use commands::common::DirArgs;
use commands::profile::ProfileAction;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "confpack", version, about = "Install configuration packages for mpv and VLC")]
struct Cli {
    /// Show debug-level log output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    dirs: DirArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List available packages
    List {
        /// Only show installed packages
        #[arg(long)]
        installed: bool,
    },
    /// Validate a package without installing it
    Validate {
        /// Package name
        package: String,
    },
    /// Install a package
    Install {
        /// Package name
        package: String,
        /// Plan the install without changing any files
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Fail instead of backing up files that already exist in the target
        #[arg(long)]
        no_overwrite: bool,
    },
    /// Uninstall a package
    Uninstall {
        /// Package name
        package: String,
        /// Plan the removal without changing any files
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Update an installed package to the repository version
    Update {
        /// Package name
        package: String,
        /// Plan the update without changing any files
        #[arg(short = 'n', long)]
        dry_run: bool,
        /// Fail instead of backing up files that already exist in the target
        #[arg(long)]
        no_overwrite: bool,
    },
    /// Check an installed package's files on disk
    Verify {
        /// Package name
        package: String,
    },
    /// Manage backups
    Backups {
        #[command(subcommand)]
        action: BackupsAction,
    },
    /// List and switch configuration profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "confpack=debug" } else { "confpack=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::List { installed } => commands::list::run(&cli.dirs, installed),
        Commands::Validate { package } => commands::validate::run(&cli.dirs, &package),
        Commands::Install {
            package,
            dry_run,
            no_overwrite,
        } => commands::install::install(&cli.dirs, &package, dry_run, no_overwrite),
        Commands::Uninstall { package, dry_run } => commands::install::uninstall(&package, dry_run),
        Commands::Update {
            package,
            dry_run,
            no_overwrite,
        } => commands::install::update(&cli.dirs, &package, dry_run, no_overwrite),
        Commands::Verify { package } => commands::install::verify(&package),
        Commands::Backups { action } => commands::backups::run(action),
        Commands::Profile { action } => commands::profile::run(&cli.dirs, action),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
