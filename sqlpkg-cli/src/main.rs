//! Command-line interface for the sqlpkg package manager.

mod commands;

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sqlpkg::Repository;

#[derive(Parser)]
#[command(name = "sqlpkg", version, about = "SQLite package manager")]
struct Cli {
    /// Print debug information
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Install a package, or all packages from the lockfile
    Install {
        /// Package name, spec url or local path
        package: Option<String>,
    },
    /// Uninstall a package
    Uninstall {
        /// Package name (owner/name)
        package: String,
    },
    /// Update a package, or all installed packages
    Update {
        /// Package name (owner/name)
        package: Option<String>,
    },
    /// List installed packages
    List,
    /// Print package information
    Info {
        /// Package name, spec url or local path
        package: String,
    },
    /// Print the path to the extension file
    Which {
        /// Package name (owner/name)
        package: String,
    },
    /// Create a local repository in the current directory
    Init,
    /// Print the program version
    Version,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sqlpkg=debug" } else { "sqlpkg=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let repo = Repository::locate();
    let result = match cli.command {
        Command::Install { package: Some(p) } => commands::install(&repo, &p),
        Command::Install { package: None } => commands::install_all(&repo),
        Command::Uninstall { package } => commands::uninstall(&repo, &package),
        Command::Update { package: Some(p) } => commands::update(&repo, &p),
        Command::Update { package: None } => commands::update_all(&repo),
        Command::List => commands::list(&repo),
        Command::Info { package } => commands::info(&repo, &package),
        Command::Which { package } => commands::which(&repo, &package),
        Command::Init => commands::init(),
        Command::Version => {
            println!("sqlpkg {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(err) = result {
        println!("! {err}");
        process::exit(1);
    }
}
