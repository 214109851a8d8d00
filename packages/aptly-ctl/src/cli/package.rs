use clap::{Args, Subcommand};

use crate::{Error, api::Client, config::Config};

use super::table;

#[derive(Args, Debug)]
pub struct PackageCommand {
    #[command(subcommand)]
    subcommand: PackageSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum PackageSubcommand {
    /// Show packages in a local repository
    #[command(visible_alias = "ls")]
    List {
        /// Name of the repository.
        repo: String,
        /// Aptly package query, e.g. `nginx (>= 1.14)`.
        #[arg(short, long)]
        query: Option<String>,
        /// Show name, version and architecture instead of package keys.
        #[arg(long)]
        detail: bool,
    },
    /// Add packages already known to Aptly to a local repository
    Add {
        /// Name of the repository.
        repo: String,
        /// Package keys, e.g. `Pamd64 nginx 1.14.0 a1b2c3d4`.
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Remove packages from a local repository
    #[command(visible_aliases = ["rm", "delete"])]
    Remove {
        /// Name of the repository.
        repo: String,
        /// Package keys.
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

pub async fn handle_package(ctx: &Config, command: PackageCommand) -> Result<String, Error> {
    let client = Client::from_config(ctx)?;
    match command.subcommand {
        PackageSubcommand::List {
            repo,
            query,
            detail: false,
        } => {
            let mut keys = client.repo_packages(&repo, query.as_deref()).await?;
            keys.sort();
            Ok(keys.join("\n"))
        }
        PackageSubcommand::List {
            repo,
            query,
            detail: true,
        } => {
            let mut packages = client
                .repo_packages_detailed(&repo, query.as_deref())
                .await?;
            packages.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(table(
                &["Package", "Version", "Architecture", "Key"],
                packages
                    .into_iter()
                    .map(|p| [p.package, p.version, p.architecture, p.key]),
            ))
        }
        PackageSubcommand::Add { repo, keys } => {
            let count = keys.len();
            client.repo_add_packages(&repo, keys).await?;
            Ok(format!("Added {count} package(s) to {repo}"))
        }
        PackageSubcommand::Remove { repo, keys } => {
            let count = keys.len();
            client.repo_remove_packages(&repo, keys).await?;
            Ok(format!("Removed {count} package(s) from {repo}"))
        }
    }
}
