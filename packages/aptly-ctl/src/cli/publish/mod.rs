use clap::{Args, Subcommand};
use itertools::Itertools as _;

use crate::{Error, PubSpec, api::Client, api::publish::PublishedRepo, config::Config};

mod create;
mod drop;
mod list;
mod update;

/// Administer publishes.
///
/// Publishes are addressed by PUB_SPEC, written `[prefix/]distribution`. The
/// prefix may be left out for publishes at the default prefix `.`; since the
/// split happens on the last slash, prefixes may contain slashes themselves
/// (e.g. `s3:bucket:ubuntu/dev/xenial`).
#[derive(Args, Debug)]
pub struct PublishCommand {
    #[command(subcommand)]
    subcommand: PublishSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum PublishSubcommand {
    /// List publishes
    #[command(visible_alias = "ls")]
    List(list::ListArgs),
    /// Publish snapshot/local repo
    #[command(visible_alias = "create")]
    Publish(create::CreateArgs),
    /// Update published local repo or switch published snapshot
    Update(update::UpdateArgs),
    /// Drop published repository
    Drop(drop::DropArgs),
}

pub async fn handle_publish(ctx: &Config, command: PublishCommand) -> Result<String, Error> {
    let client = Client::from_config(ctx)?;
    match command.subcommand {
        PublishSubcommand::List(args) => list::run(&client, args).await,
        PublishSubcommand::Publish(args) => create::run(ctx, &client, args).await,
        PublishSubcommand::Update(args) => update::run(ctx, &client, args).await,
        PublishSubcommand::Drop(args) => drop::run(&client, args).await,
    }
}

/// The spec a publish is addressed by, for rendering server responses.
fn spec_of(publish: &PublishedRepo) -> Result<PubSpec, Error> {
    publish.pub_spec().map_err(|err| Error::Domain {
        message: format!(
            "API returned publish {:?}/{:?} that cannot be addressed: {err}",
            publish.prefix, publish.distribution
        ),
        source: None,
    })
}

/// Render one publish with all of its attributes.
fn render_publish(publish: &PublishedRepo) -> Result<String, Error> {
    let mut lines = vec![
        spec_of(publish)?.to_string(),
        format!("    Source kind: {}", publish.source_kind),
        format!("    Prefix: {}", publish.prefix),
        format!("    Distribution: {}", publish.distribution),
        format!("    Storage: {}", publish.storage),
        format!("    Label: {}", publish.label),
        format!("    Origin: {}", publish.origin),
        format!("    Architectures: {}", publish.architectures.iter().join(", ")),
        String::from("    Sources:"),
    ];
    lines.extend(publish.sources.iter().map(|source| {
        format!(
            "        {} ({})",
            source.name,
            source.component.as_deref().unwrap_or_default()
        )
    }));
    Ok(lines.join("\n"))
}
