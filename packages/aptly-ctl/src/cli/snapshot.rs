use clap::{Args, Subcommand};

use crate::{
    Error,
    api::{Client, snapshot::Snapshot},
    config::Config,
};

use super::table;

#[derive(Args, Debug)]
pub struct SnapshotCommand {
    #[command(subcommand)]
    subcommand: SnapshotSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SnapshotSubcommand {
    /// Show snapshots
    #[command(visible_alias = "ls")]
    List,
    /// Show one snapshot
    Show {
        /// Name of the snapshot.
        name: String,
    },
    /// Snapshot the current contents of a local repository
    #[command(visible_alias = "new")]
    Create {
        /// Name of the new snapshot.
        name: String,
        /// Local repository to take the snapshot of.
        #[arg(long, value_name = "REPO")]
        from_repo: String,
        /// Free-form description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a snapshot
    #[command(visible_alias = "rm")]
    Delete {
        /// Name of the snapshot.
        name: String,
        /// Delete even if it is published or other snapshots were made from it.
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn handle_snapshot(ctx: &Config, command: SnapshotCommand) -> Result<String, Error> {
    let client = Client::from_config(ctx)?;
    match command.subcommand {
        SnapshotSubcommand::List => {
            let mut snapshots = client.snapshot_list().await?;
            if snapshots.is_empty() {
                return Ok(String::from("No snapshots found"));
            }
            snapshots.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(render_snapshots(snapshots))
        }
        SnapshotSubcommand::Show { name } => {
            Ok(render_snapshots([client.snapshot_show(&name).await?]))
        }
        SnapshotSubcommand::Create {
            name,
            from_repo,
            description,
        } => {
            let snapshot = client
                .snapshot_create_from_repo(&from_repo, &name, description)
                .await?;
            Ok(format!(
                "Snapshot created: {} (from local repo {from_repo})",
                snapshot.name
            ))
        }
        SnapshotSubcommand::Delete { name, force } => {
            client.snapshot_delete(&name, force).await?;
            Ok(format!("Snapshot deleted: {name}"))
        }
    }
}

fn render_snapshots(snapshots: impl IntoIterator<Item = Snapshot>) -> String {
    table(
        &["Name", "Description", "Created at"],
        snapshots
            .into_iter()
            .map(|snapshot| [snapshot.name, snapshot.description, snapshot.created_at]),
    )
}
