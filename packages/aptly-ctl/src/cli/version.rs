use crate::{Error, api::Client, config::Config};

pub async fn handle_version(ctx: &Config) -> Result<String, Error> {
    let version = Client::from_config(ctx)?.version().await?;
    Ok(format!("Aptly server version: {}", version.version))
}
