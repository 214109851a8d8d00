use clap::Args;

use crate::{Error, api::Client};

use super::{render_publish, spec_of};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print additional details
    #[arg(long)]
    detail: bool,
}

pub async fn run(client: &Client, args: ListArgs) -> Result<String, Error> {
    let mut publishes = client
        .publish_list()
        .await?
        .into_iter()
        .map(|publish| Ok((spec_of(&publish)?.to_string(), publish)))
        .collect::<Result<Vec<_>, Error>>()?;
    publishes.sort_by(|(a, _), (b, _)| a.cmp(b));

    let rendered = publishes
        .into_iter()
        .map(|(spec, publish)| {
            if args.detail {
                render_publish(&publish)
            } else {
                Ok(spec)
            }
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(rendered.join("\n"))
}
