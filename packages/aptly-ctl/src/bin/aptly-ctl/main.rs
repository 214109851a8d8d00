use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing::debug;

use aptly_ctl::{
    cli::{self, package, publish, repo, snapshot, version},
    config::Config,
    logging::Logging,
};

/// Aptly API client
///
/// Administers an Aptly server through its REST API: publishes, local
/// repositories, snapshots and the packages in them.
#[derive(Parser, Debug)]
#[command(name = "aptly-ctl", version, max_term_width = 80)]
struct Args {
    /// Profile from the config file to use, by name or zero-based index.
    #[arg(short, long, default_value = "0")]
    profile: String,

    /// Config file to read instead of the default locations.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override a key of the selected profile, e.g. `signing.gpgkey=A16BE921`.
    #[arg(short = 'C', long, value_name = "KEY=VALUE", action = clap::ArgAction::Append)]
    config_keys: Vec<String>,

    /// Be more verbose. Repeat to trace HTTP requests.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage publishes
    Publish(publish::PublishCommand),
    /// Manage local repositories
    Repo(repo::RepoCommand),
    /// Manage snapshots
    Snapshot(snapshot::SnapshotCommand),
    /// Manage packages in local repositories
    Package(package::PackageCommand),
    /// Show the Aptly server version
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    let Some(command) = args.command else {
        return cli::missing_subcommand::<Args>();
    };

    let logging = Logging::from_verbosity(args.verbose);
    if let Err(err) = logging.init() {
        eprintln!("{err}");
        return ExitCode::from(err.exit_code());
    }

    let config = match Config::load(args.config.as_deref(), &args.profile, &args.config_keys) {
        Ok(config) => config,
        Err(err) => return logging.report(&err.into()),
    };
    debug!(?command, profile = %config.profile.name, "running");

    let result = match command {
        Command::Publish(command) => publish::handle_publish(&config, command).await,
        Command::Repo(command) => repo::handle_repo(&config, command).await,
        Command::Snapshot(command) => snapshot::handle_snapshot(&config, command).await,
        Command::Package(command) => package::handle_package(&config, command).await,
        Command::Version => version::handle_version(&config).await,
    };
    cli::finish(result, &logging)
}
