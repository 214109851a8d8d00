use clap::Args;
use tracing::debug;

use crate::{
    Error,
    api::Client,
    cli::{not_found_into_domain, parse_pub_spec},
    config::{Config, signing::SIGNING_OPTION_PREFIX},
};

use super::render_publish;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Publish to update. See 'publish' subcommand --help
    #[arg(value_name = "PUB_SPEC")]
    pub_spec: String,

    /// Overwrite files in pool/ directory without notice
    #[arg(short, long)]
    force: bool,
}

pub async fn run(ctx: &Config, client: &Client, args: UpdateArgs) -> Result<String, Error> {
    let spec = parse_pub_spec(&args.pub_spec)?;
    let signing = ctx.signing_for(&spec)?.as_options(SIGNING_OPTION_PREFIX);
    let result = client
        .publish_update(&spec, args.force, &signing, SIGNING_OPTION_PREFIX)
        .await
        .map_err(not_found_into_domain)?;
    debug!(?result, "API returned");
    render_publish(&result)
}
