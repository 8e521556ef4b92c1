//! Provider health daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ loader ──▶ Services ─────────────────────────────┐
//!        │                      │                                    │
//!        │ (notify)             ▼                                    ▼
//!        └──▶ watcher ──▶ set_providers()    ┌──────────────┐   ┌──────────┐
//!                               │            │ HealthMonitor │◀──│ Load     │
//!                               └───────────▶│  probe cycle  │   │ Balancer │
//!                                            └──────┬───────┘   └────▲─────┘
//!                                                   │ probes         │
//!                                                   ▼                │
//!                                             upstream APIs    admin API / CLI
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use provider_health::admin::{self, AdminState};
use provider_health::config::{load_config, HealthConfig};
use provider_health::lifecycle::{signals, Services, Shutdown};
use provider_health::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "provider-health")]
#[command(about = "Probe upstream API providers and serve health-aware selection", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "provider-health.toml")]
    config: PathBuf,

    /// Do not reload the provider list when the config file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = if args.config.exists() {
        load_config(&args.config)?
    } else {
        eprintln!(
            "config file {} not found, using defaults",
            args.config.display()
        );
        HealthConfig::default()
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "provider-health starting");

    tracing::info!(
        providers = config.providers.len(),
        check_interval_ms = config.monitor.check_interval_ms,
        strategy = ?config.balancer.strategy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = Services::start(&config).await?;
    let shutdown = Shutdown::new();

    // Keep the watcher alive for the life of the process.
    let _watcher = if args.no_watch || !args.config.exists() {
        None
    } else {
        Some(services.watch_config(&args.config, &config)?)
    };

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            services: services.clone(),
            api_key: config.admin.api_key.as_str().into(),
        };
        Some(tokio::spawn(admin::serve(
            listener,
            state,
            shutdown.subscribe(),
        )))
    } else {
        None
    };

    signals::wait_for_signal().await;
    tracing::info!("Shutting down");

    services.stop();
    shutdown.trigger();

    if let Some(task) = admin_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
            Err(e) => tracing::error!(error = %e, "Admin API task panicked"),
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
