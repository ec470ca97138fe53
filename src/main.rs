//! flight-board: live flight snapshot probe.
//!
//! Wires the OpenSky and Open-Meteo clients, the persistent seed store and
//! the snapshot read service, then runs one command and prints JSON:
//! 1. `list`: all flights (bootstraps the live snapshot if empty)
//! 2. `get <ID>`: one flight, enriched with current weather when live
//! 3. `refresh`: rebuild the live snapshot and report the outcome
//! 4. `regions`: query every region once and print per-region health

mod config;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use flight_snapshot::{FlightReadService, MemoryStore, PersistentStore};
use open_meteo_client::OpenMeteoClient;
use opensky_client::OpenSkyClient;

/// Live flight snapshot service
#[derive(Parser)]
#[command(name = "flight-board", about = "Live flight snapshot and identity probe")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every flight in the current snapshot.
    List,
    /// Show one flight by identifier.
    Get {
        id: i64,
    },
    /// Rebuild the live snapshot.
    Refresh,
    /// Query each region once and print its health.
    Regions,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn load_persistent(seed_path: Option<&str>) -> Result<Arc<dyn PersistentStore>> {
    let store = match seed_path {
        Some(path) => MemoryStore::from_json_file(Path::new(path))
            .with_context(|| format!("failed to load seed flights from {path}"))?,
        None => {
            info!("No seed path configured; persistent store is empty");
            MemoryStore::default()
        }
    };
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "flight_board=info,flight_snapshot=info,opensky_client=info,open_meteo_client=info"
                    .into()
            }),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Regions: {:?}",
        cfg.regions.iter().map(|r| &r.code).collect::<Vec<_>>()
    );
    info!(
        "Snapshot: base_id={}, limit={}, region_cap={}, region_timeout={}ms",
        cfg.snapshot.base_id,
        cfg.snapshot.sample_limit,
        cfg.snapshot.region_cap,
        cfg.snapshot.region_timeout_ms
    );

    let telemetry = Arc::new(OpenSkyClient::new(&cfg.opensky));
    let weather = Arc::new(OpenMeteoClient::new(&cfg.weather));
    let persistent = load_persistent(cfg.persistent.seed_path.as_deref())?;
    let service = FlightReadService::from_config(&cfg, telemetry, weather, persistent);

    match cli.command {
        Command::List => {
            let flights = service.read_collection().await?;
            info!("{} flights", flights.len());
            print_json(&flights)?;
        }
        Command::Get { id } => {
            // A one-shot process starts with an empty snapshot, so live
            // identifiers need a snapshot to resolve against.
            if id >= service.base_id() && service.store().is_empty().await {
                service.refresh().await?;
            }
            let flight = service.read_one(id).await?;
            print_json(&flight)?;
        }
        Command::Refresh => {
            let outcome = service.refresh().await?;
            print_json(&outcome)?;
        }
        Command::Regions => {
            let reports = service.gateway().fetch_regions(service.regions()).await;
            let failed = reports.iter().filter(|r| !r.is_ok()).count();
            info!("{} regions probed, {} failed", reports.len(), failed);
            print_json(&service.gateway().health().entries())?;
        }
    }

    Ok(())
}
