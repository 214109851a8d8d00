use clap::{Args, Subcommand};

use crate::{
    Error,
    api::{
        Client,
        repo::{CreateRepoRequest, LocalRepo},
    },
    config::Config,
};

use super::table;

#[derive(Args, Debug)]
pub struct RepoCommand {
    #[command(subcommand)]
    subcommand: RepoSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoSubcommand {
    /// Show local repositories
    #[command(visible_alias = "ls")]
    List,
    /// Show one local repository
    Show {
        /// Name of the repository.
        name: String,
    },
    /// Create a local repository
    #[command(visible_aliases = ["new", "add"])]
    Create {
        /// A name that uniquely identifies this repository.
        name: String,
        /// Free-form comment.
        #[arg(long)]
        comment: Option<String>,
        /// Default distribution when publishing from this repository.
        #[arg(long)]
        distribution: Option<String>,
        /// Default component when publishing from this repository.
        #[arg(long)]
        component: Option<String>,
    },
    /// Delete a local repository
    #[command(visible_alias = "rm")]
    Delete {
        /// Name of the repository.
        name: String,
        /// Delete even if snapshots reference it.
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_repo(ctx: &Config, command: RepoCommand) -> Result<String, Error> {
    let client = Client::from_config(ctx)?;
    match command.subcommand {
        RepoSubcommand::List => {
            let mut repos = client.repo_list().await?;
            if repos.is_empty() {
                return Ok(String::from("No local repositories found"));
            }
            repos.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(render_repos(repos))
        }
        RepoSubcommand::Show { name } => Ok(render_repos([client.repo_show(&name).await?])),
        RepoSubcommand::Create {
            name,
            comment,
            distribution,
            component,
        } => {
            let request = CreateRepoRequest::builder()
                .name(name)
                .maybe_comment(comment)
                .maybe_default_distribution(distribution)
                .maybe_default_component(component)
                .build();
            let repo = client.repo_create(&request).await?;
            Ok(format!("Repository created: {}", repo.name))
        }
        RepoSubcommand::Delete { name, force } => {
            client.repo_delete(&name, force).await?;
            Ok(format!("Repository deleted: {name}"))
        }
    }
}

fn render_repos(repos: impl IntoIterator<Item = LocalRepo>) -> String {
    table(
        &["Name", "Comment", "Default distribution", "Default component"],
        repos.into_iter().map(|repo| {
            [
                repo.name,
                repo.comment,
                repo.default_distribution,
                repo.default_component,
            ]
        }),
    )
}
