//! Segment telemetry datastore service
//!
//! Accepts reports of traversed road segments over HTTP and stores one row
//! per segment in PostgreSQL.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │               DATASTORE SERVICE              │
//!                         │                                              │
//!     Client Request      │  ┌──────────┐    ┌───────────┐               │
//!     ────────────────────┼─▶│   net    │───▶│   pool    │               │
//!                         │  │ acceptor │    │ (bounded) │               │
//!                         │  └──────────┘    └─────┬─────┘               │
//!                         │                        ▼                     │
//!                         │                 ┌─────────────┐              │
//!                         │                 │ worker N    │              │
//!                         │                 │ http server │              │
//!                         │                 └──────┬──────┘              │
//!                         │                        ▼                     │
//!     Client Response     │  ┌──────────┐    ┌─────────────┐   ┌───────┐ │
//!     ◀───────────────────┼──│ response │◀───│   ingest    │──▶│ store │─┼──▶ PostgreSQL
//!                         │  └──────────┘    └─────────────┘   └───────┘ │
//!                         │                                              │
//!                         │  config · observability · resilience ·      │
//!                         │  lifecycle                                   │
//!                         └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```text
//! POSTGRES_DB=.. POSTGRES_USER=.. POSTGRES_HOST=.. POSTGRES_PASSWORD=.. \
//! POSTGRES_PORT=5432 datastore-service localhost:8003
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use segment_datastore::config::load_config;
use segment_datastore::lifecycle::{wait_for_signal, IngestService};
use segment_datastore::observability::{logging, metrics};
use segment_datastore::resilience::RetryPolicy;
use segment_datastore::store::{bootstrap_schema, PgSessionConnector};

#[derive(Parser, Debug)]
#[command(name = "datastore-service", version, about = "Segment telemetry datastore")]
struct Cli {
    /// Address to listen on, as host:port (a leading scheme is ignored)
    address: String,

    /// Optional TOML file with tuning options
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref(), &cli.address) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Bad address or environment: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "datastore-service starting");
    tracing::debug!(?config, "Configuration loaded");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let options = config.database.connect_options();
    let policy = RetryPolicy::from(&config.startup);
    match bootstrap_schema(&options, &policy).await {
        Ok(status) => tracing::info!(?status, "Schema ready"),
        Err(e) => {
            tracing::error!(error = %e, "Schema bootstrap failed");
            return ExitCode::FAILURE;
        }
    }

    let connector = PgSessionConnector::new(&config.database);
    let running = match IngestService::new(config, connector).start().await {
        Ok(running) => running,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start service");
            return ExitCode::FAILURE;
        }
    };

    wait_for_signal().await;
    running.stop().await;

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
