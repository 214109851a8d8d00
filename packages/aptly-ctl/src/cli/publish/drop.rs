use clap::Args;
use tracing::info;

use crate::{
    Error,
    api::Client,
    cli::{api_into_domain, parse_pub_spec},
};

#[derive(Args, Debug)]
pub struct DropArgs {
    /// Publish to drop. See 'publish' subcommand --help
    #[arg(value_name = "PUB_SPEC")]
    pub_spec: String,

    /// Delete published repository even if it has snapshots
    #[arg(short, long)]
    force: bool,
}

pub async fn run(client: &Client, args: DropArgs) -> Result<String, Error> {
    let spec = parse_pub_spec(&args.pub_spec)?;
    client
        .publish_drop(&spec, args.force)
        .await
        .map_err(api_into_domain)?;
    info!(%spec, "dropped publish");
    Ok(format!("Dropped {spec}"))
}
