//! Transport tariff worker
//!
//! Fits transport tariff curves and materializes per-kilometre tariff tables.
//! Connects to NATS and serves generation and lookup requests.

mod cli;
mod config;
mod db;
mod defaults;
mod error;
mod handlers;
mod services;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::cli::{Cli, Command};
use crate::services::tariff::{hyperbola, MemoryTariffStore, PgTariffStore, TariffService, TariffStore};
use crate::types::GenerateHyperbolicRequest;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR")
        .unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &logs_dir,
        "tariff-worker.log",
    );
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - stderr (stdout is kept for command output) and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,transport_tariff_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Migrate => {
            let config = config::Config::from_env()?;
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await
        }
        Command::Solve { points } => solve(&points),
        Command::Generate { input, dry_run } => generate_from_file(&input, dry_run).await,
    }
}

async fn serve() -> Result<()> {
    info!("Starting transport tariff worker...");

    let config = config::Config::from_env()?;
    info!("Configuration loaded (batch size {})", config.batch_size);

    let pool = db::create_pool(&config.database_url).await?;
    info!("Connected to PostgreSQL");

    db::run_migrations(&pool).await?;

    // Connect to NATS (supports optional NATS_USER/NATS_PASSWORD auth).
    let nats_client = match (std::env::var("NATS_USER"), std::env::var("NATS_PASSWORD")) {
        (Ok(user), Ok(password)) if !user.is_empty() => {
            async_nats::ConnectOptions::new()
                .user_and_password(user, password)
                .connect(&config.nats_url)
                .await?
        }
        _ => async_nats::connect(&config.nats_url).await?,
    };
    info!("Connected to NATS at {}", config.nats_url);

    let store = Arc::new(PgTariffStore::new(pool, config.batch_size));
    let service = Arc::new(TariffService::new(store));

    if let Err(e) = handlers::start_handlers(nats_client, service).await {
        error!("Handler error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Offline solve: print the outcome as JSON on stdout
fn solve(points: &[types::CalibrationPoint]) -> Result<()> {
    let points = cli::three_points(points)?;
    let outcome = hyperbola::solve(&points);

    let output = match outcome.params() {
        Some(params) => serde_json::json!({
            "strategy": outcome.strategy(),
            "a": params.a,
            "b": params.b,
            "c": params.c,
            "residual": outcome.residual(),
        }),
        None => anyhow::bail!(error::TariffError::NoSolution),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn generate_from_file(path: &std::path::Path, dry_run: bool) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let request: GenerateHyperbolicRequest = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid generate request in {}", path.display()))?;

    if dry_run {
        let store = Arc::new(MemoryTariffStore::new());
        let service = TariffService::new(store.clone());
        let response = service.generate_hyperbolic(&request).await?;

        let last_km = request.max_distance_km;
        let sample = store
            .list_rows(1, last_km)
            .await?
            .into_iter()
            .filter(|row| row.distance_km == 1 || row.distance_km % 100 == 0 || row.distance_km == last_km)
            .collect::<Vec<_>>();

        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "result": response, "sample": sample }))?
        );
        return Ok(());
    }

    let config = config::Config::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let service = TariffService::new(Arc::new(PgTariffStore::new(pool, config.batch_size)));
    let response = service.generate_hyperbolic(&request).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
