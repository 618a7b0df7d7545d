use anyhow::{Context, Result};
use background_services::station_harvester::{harvest_stations, HarvestContext};
use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use dal::{PgStationStore, StationStore};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{error, info};

mod api;
mod background_services;
mod cli;
mod config;
mod dal;
mod geodesy;
mod model;
mod normalize;
mod stats;
mod telemetry;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    _ = dotenv();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let telemetry = telemetry::init_tracing(&config)?;

    let res = connect_and_run(cli.command.unwrap_or_default(), &config).await;

    if let Err(e) = &res {
        error!("{e:?}");
    }
    telemetry.shutdown();

    res
}

async fn connect_and_run(command: Command, config: &Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("couldn't connect to the station store")?;

    let res = run(command, config, &pool).await;

    // the pool is released whether or not the run finished
    pool.close().await;

    res
}

async fn run(command: Command, config: &Config, pool: &Pool<Postgres>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("couldn't migrate the station store")?;

    let store = PgStationStore::new(pool.clone());

    match command {
        Command::Harvest => harvest(store, config).await,
        Command::Serve => api::serve(store, config.bind_addr).await,
    }
}

/// A fatal error comes back with the progress made so far, `main` logs it once
async fn harvest<S: StationStore>(store: S, config: &Config) -> Result<()> {
    let mut ctx = HarvestContext::new(store, &config.base_url, config.request_delay);

    if let Err(e) = harvest_stations(&mut ctx).await {
        return Err(anyhow::Error::new(e)
            .context(format!("harvest aborted, progress so far {:?}", ctx.summary)));
    }

    info!("Harvest finished {:?}", ctx.summary);

    Ok(())
}
