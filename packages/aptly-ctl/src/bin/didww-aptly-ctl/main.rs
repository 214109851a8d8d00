use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::debug;

use aptly_ctl::{
    cli::{self, publish},
    config::{Config, ConfigError, Profile, SigningSettings},
    logging::Logging,
};

/// DIDWW Aptly API client
///
/// Publishes to an Aptly server, signing with the passphrase file the
/// build hosts are provisioned with.
#[derive(Parser, Debug)]
#[command(name = "didww-aptly-ctl", version, max_term_width = 80)]
struct Args {
    /// Aptly API URL.
    #[arg(short, long, env = "APTLY_URL", default_value = "http://localhost:8090/")]
    url: String,

    /// File with the passphrase of the signing key.
    #[arg(long, env = "APTLY_PASS_FILE", default_value = "/etc/aptly/passphrase")]
    pass_file: String,

    /// One of debug, info, warning, error, critical.
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage publishes
    Publish(publish::PublishCommand),
}

/// Everything is signed in batch mode with the passphrase file; there are no
/// per-publish rules.
fn config(url: String, pass_file: String) -> Result<Config, ConfigError> {
    Config::from_profile(Profile {
        name: String::from("didww"),
        url,
        signing: SigningSettings {
            batch: Some(true),
            passphrase_file: Some(pass_file),
            ..Default::default()
        },
        ..Default::default()
    })
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

    let logging = match Logging::from_level_name(&args.log_level) {
        Ok(logging) => logging,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };
    if let Err(err) = logging.init() {
        eprintln!("{err}");
        return ExitCode::from(err.exit_code());
    }

    let config = match config(args.url, args.pass_file) {
        Ok(config) => config,
        Err(err) => return logging.report(&err.into()),
    };
    debug!(?command, url = %config.url, "running");

    let result = match command {
        Command::Publish(command) => publish::handle_publish(&config, command).await,
    };
    cli::finish(result, &logging)
}
