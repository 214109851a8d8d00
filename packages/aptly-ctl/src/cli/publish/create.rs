use clap::Args;
use tracing::{debug, info};

use crate::{
    Error,
    api::{
        Client,
        publish::{NewPublish, Source, SourceKind},
    },
    cli::{api_into_domain, parse_pub_spec},
    config::{Config, signing::SIGNING_OPTION_PREFIX},
};

use super::render_publish;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Publish to create, as `[prefix/]distribution`
    #[arg(value_name = "PUB_SPEC")]
    pub_spec: String,

    /// Publish from snapshots or local repos
    #[arg(short = 's', long, value_enum)]
    source_kind: SourceKind,

    /// Comma separated list of architectures to publish
    #[arg(long, value_delimiter = ',')]
    architectures: Vec<String>,

    /// Value of 'Label:' field in published repository stanza
    #[arg(long)]
    label: Option<String>,

    /// Value of 'Origin:' field in published repository stanza
    #[arg(long)]
    origin: Option<String>,

    /// Overwrite files in pool/ directory without notice
    #[arg(short, long)]
    force: bool,

    /// A local repo or snapshot to publish from, as `name=component`.
    ///
    /// The component can be omitted; it is then taken from the default
    /// component of the repo/snapshot, or set to `main`.
    #[arg(value_name = "source", required = true)]
    sources: Vec<String>,
}

pub async fn run(ctx: &Config, client: &Client, args: CreateArgs) -> Result<String, Error> {
    let spec = parse_pub_spec(&args.pub_spec)?;
    let sources = args
        .sources
        .iter()
        .map(|token| token.parse::<Source>())
        .collect::<Result<Vec<_>, _>>()?;
    let signing = ctx.signing_for(&spec)?.as_options(SIGNING_OPTION_PREFIX);

    let publish = NewPublish::builder()
        .source_kind(args.source_kind)
        .sources(sources)
        .architectures(
            args.architectures
                .into_iter()
                .filter(|arch| !arch.is_empty())
                .collect(),
        )
        .maybe_label(args.label)
        .maybe_origin(args.origin)
        .force_overwrite(args.force)
        .build();
    debug!(%spec, ?publish, "creating publish");

    let result = client
        .publish_create(&spec, publish, &signing, SIGNING_OPTION_PREFIX)
        .await
        .map_err(api_into_domain)?;
    info!(%spec, "published");
    render_publish(&result)
}
