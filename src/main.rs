use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod connectivity;
mod discovery;
mod error;
mod geo;
mod models;
mod output;
mod reachability;
mod sweep;
mod utils;

use cli::Cli;
use config::Config;
use discovery::{HttpTransport, SourceFetcher};
use error::AppError;
use reachability::{TcpProbe, VerifyOptions};

#[tokio::main]
async fn main() {
    // Initialize environment
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("ipsweep failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_cli(&cli)?;
    let started = Instant::now();

    // One client for every HTTP collaborator; each request sets its own timeout
    let client = utils::create_http_client(&config.fetch.user_agent, config.fetch.request_timeout)?;

    if let Some(ping_url) = &config.ping_url {
        connectivity::check_connectivity(&client, ping_url, config.connectivity_timeout).await;
    }

    let fetcher = Arc::new(SourceFetcher::from_config(
        HttpTransport::new(client.clone(), config.fetch.request_timeout),
        &config.fetch,
    ));
    let options = VerifyOptions::from(&config.probe);

    let live = sweep::run_sweep(
        fetcher,
        &config.sources,
        config.fetch.max_concurrent,
        config.probe.public_only,
        Arc::new(TcpProbe),
        &options,
    )
    .await?;

    let annotated = geo::annotate(&client, &live, &config.geo).await;

    output::write_results(&config.output, &annotated).await?;

    tracing::info!(
        "Done in {:.1}s: {} live endpoints written to {}",
        started.elapsed().as_secs_f64(),
        annotated.len(),
        config.output.display()
    );

    Ok(())
}
