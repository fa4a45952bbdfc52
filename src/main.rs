mod cache;
mod cli;
mod constants;
mod distance;
mod geo;
mod npi;
mod server;
mod service;
mod specialty;
mod states;
mod taxonomy;
mod trials;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{PhysiciansArgs, TrialsArgs};
use service::FinderService;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = cli::Args::parse();

    match args.cmd {
        cli::Command::Serve(cmd) => server::run(cmd).await.context("serve failed"),
        cli::Command::Physicians(cmd) => run_physicians(cmd).await,
        cli::Command::Trials(cmd) => run_trials(cmd).await,
    }
}

async fn run_physicians(args: PhysiciansArgs) -> Result<()> {
    let service = FinderService::new(args.api.to_config()).context("build finder service")?;
    let response = service
        .find_physicians(
            args.city.as_deref(),
            args.state.as_deref(),
            args.condition.as_deref(),
            args.limit,
        )
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_trials(args: TrialsArgs) -> Result<()> {
    let service = FinderService::new(args.api.to_config()).context("build finder service")?;
    let response = service
        .find_trials_with_physicians(
            args.condition.as_deref(),
            args.city.as_deref(),
            args.state.as_deref(),
            args.limit,
            args.offset,
            args.max_distance_km,
        )
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
