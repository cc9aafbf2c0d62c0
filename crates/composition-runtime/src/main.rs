//! # Composition Runtime
//!
//! Starts N composed contexts on one transport and hands a tile from the
//! first to the second.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logging + Prometheus registry)
//! 2. Load bus configuration from the environment
//! 3. Create one tile host per context and start transport pumps
//! 4. Hand off a tile, log the arrival
//! 5. Optionally print metrics, optionally keep running until Ctrl+C

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use composition_bus::{BusConfig, WiringMode};
use composition_runtime::{CompositionRuntime, RuntimeConfig, TransportKind};
use composition_telemetry::{
    encode_metrics, init_telemetry, log_event, PrometheusBusMetrics, TelemetryConfig,
};
use tracing::info;

/// Run several composed contexts over one composition bus.
#[derive(Parser, Debug)]
#[command(name = "composition-runtime")]
#[command(about = "Hosts composed contexts on a shared publish/subscribe bus")]
struct Args {
    /// Number of contexts to host
    #[arg(short, long, default_value = "2")]
    contexts: usize,

    /// Transport shared by the contexts
    #[arg(short, long, value_enum, default_value_t = TransportKind::Local)]
    transport: TransportKind,

    /// Hook wiring (overrides COMPOSITION_BUS_WIRING)
    #[arg(long)]
    wiring: Option<WiringMode>,

    /// Print Prometheus metrics after the hand-off
    #[arg(long)]
    metrics: bool,

    /// Keep running until Ctrl+C
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let telemetry = TelemetryConfig::from_env();
    let _guard = init_telemetry(telemetry.clone()).context("initializing telemetry")?;

    let mut bus = BusConfig::from_env();
    if let Some(wiring) = args.wiring {
        bus = bus.with_wiring(wiring);
    }

    let config = RuntimeConfig {
        contexts: args.contexts,
        transport: args.transport,
        bus,
    };
    let runtime = CompositionRuntime::new(config, Arc::new(PrometheusBusMetrics))
        .context("creating runtime")?;
    let pumps = runtime.start();

    let tile = runtime.hand_off().await.context("handing off demo tile")?;
    log_event!(info, telemetry.context.as_str(), "Tile arrived", tag = %tile.tag, state = %tile.state);

    if args.metrics {
        println!("{}", encode_metrics()?);
    }

    if args.serve {
        info!("Runtime is running. Press Ctrl+C to stop.");
        tokio::signal::ctrl_c().await?;
    }

    runtime.shutdown();
    for pump in pumps {
        pump.await?;
    }
    Ok(())
}
