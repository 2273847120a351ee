//! Live feed demonstration.
//!
//! Demonstrates:
//! - Owning one client at the composition root and handing out clones
//! - Re-subscribing to streams on every `connected`
//! - Typed `charger_update` / `metrics_update` listeners
//! - Surfacing `reconnect_failed` as an offline banner
//!
//! Usage:
//!   cargo run --example live_feed
//!   cargo run --example live_feed -- ws://10.0.4.12:8000/ws
//!   cargo run --example live_feed -- --debug --attempts 10

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use chargeflow_live::{
    ChargerUpdate, DEFAULT_LIVE_URL, EventBusClient, LifecycleEvent, MetricsUpdate,
    ReconnectFailed,
};

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    url: String,
    attempts: u32,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();

        let attempts = args
            .iter()
            .position(|a| a == "--attempts")
            .and_then(|i| args.get(i + 1))
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let url = args
            .iter()
            .find(|a| a.starts_with("ws://") || a.starts_with("wss://"))
            .cloned()
            .unwrap_or_else(|| DEFAULT_LIVE_URL.to_string());

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url,
            attempts,
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "chargeflow_live=debug"
    } else {
        "chargeflow_live=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Live Feed: {} ===\n", args.url);

    let client = EventBusClient::builder()
        .max_reconnect_attempts(args.attempts)
        .reconnect_interval(Duration::from_secs(3))
        .build()?;

    // Stream subscriptions live on the server side of one connection, so
    // they are requested again after every reconnect.
    let live = client.clone();
    client.on_fn(LifecycleEvent::Connected, move |_| {
        println!("[Live] Connected");
        live.subscribe_to_metrics();
        live.subscribe_to_charger_status();
        live.subscribe_to_traffic();
    });

    client.on_fn(LifecycleEvent::Disconnected, |_| {
        println!("[Live] Disconnected, retrying");
    });

    client.on_fn(LifecycleEvent::Error, |detail| {
        println!("[Live] Error: {detail}");
    });

    client.on_typed(|failed: ReconnectFailed| {
        println!(
            "[Live] Offline after {} attempts, showing demo data",
            failed.attempts
        );
    });

    client.on_typed(|metrics: MetricsUpdate| {
        let queue = metrics.get("currentQueue").cloned().unwrap_or_default();
        println!("[Metrics] queue={queue}");
    });

    client.on_typed(|update: ChargerUpdate| {
        println!("[Charger {}] {:?}", update.charger_id, update.updates);
    });

    client.on_fn("traffic", |traffic| println!("[Traffic] {traffic}"));

    client
        .connect(&args.url)
        .with_context(|| format!("cannot connect to {}", args.url))?;

    println!("Press Ctrl+C to exit...");
    tokio::signal::ctrl_c().await.ok();

    client.disconnect();
    println!("\nDone.");
    Ok(())
}
