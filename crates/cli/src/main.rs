//! `shotver` -- version bookkeeping for ShotGrid-tracked entities.
//!
//! Resolves shots, assets, and sequences, creates numbered versions,
//! derives their media locations, encodes preview movies with ffmpeg, and
//! publishes the results back to ShotGrid. Configuration comes from the
//! environment (see [`config::CliConfig::from_env`]); a `.env` file in the
//! working directory is honoured.

mod cli;
mod commands;
mod config;

use clap::Parser;
use shotver_tracking::shotgun::ShotgunClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shotver=info,shotver_core=info,shotver_tracking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::from_env()?;
    let store = ShotgunClient::new(config.shotgun()?);

    tracing::debug!(
        site = ?config.site_url,
        media_root = %config.media_root.path,
        "Loaded configuration",
    );

    commands::dispatch(&store, &config, cli.command).await
}
