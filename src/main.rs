mod auth;
mod batch;
mod cli;
mod error;
mod extraction;
mod models;
mod providers;
#[cfg(test)]
mod test_utils;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting RepoLens - GitHub repository metadata aggregator");
    cli.execute().await?;

    Ok(())
}
