//! Cardflow
//!
//! Runs the card carousel headlessly: applies scripted page swipes, opens
//! the centered card with the spring transition and reports the result.

use anyhow::{Context, Result};
use cardflow_core_layout::Size;
use cardflow_host::app::{App, HostEvent, Scenario};
use cardflow_host::config::{parse_log_level, Config};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cardflow")]
#[command(author, version, about = "Card carousel with a card-to-detail spring transition")]
struct Cli {
    /// Config file (default: platform config dir, then ./cardflow.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window size, e.g. 375x667
    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Size>,

    /// Number of cards (also sets the page count)
    #[arg(long)]
    items: Option<usize>,

    /// Swipe by this many pages before opening the centered card (repeatable, negative goes back)
    #[arg(long, allow_hyphen_values = true)]
    swipe: Vec<i64>,

    /// Cancel the transition this many milliseconds after it starts
    #[arg(long)]
    cancel_after_ms: Option<u64>,

    /// Print a JSON report when done
    #[arg(long)]
    report: bool,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_viewport(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    if width <= 0.0 || height <= 0.0 {
        return Err(format!("viewport must be positive, got {}x{}", width, height));
    }
    Ok(Size::new(width, height))
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(size) = cli.viewport {
        config.layout.viewport_width = size.width;
        config.layout.viewport_height = size.height;
    }
    if let Some(items) = cli.items {
        config.layout.item_count = items;
        config.layout.page_count = items;
    }
    if let Some(level) = &cli.log_level {
        config.behavior.log_level = level.clone();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for log level)
    let mut config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        // Can't use tracing yet, fall back to eprintln
        eprintln!("Failed to load configuration: {:#}. Using defaults.", e);
        Config::default()
    });
    apply_overrides(&mut config, &cli);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_log_level(&config.behavior.log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Validate and clamp config values
    for w in config.validate() {
        warn!("Config: {} - {}", w.field, w.message);
    }

    info!("Cardflow starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: viewport={}x{}, card={}x{}, items={}, pages={}, spring={}ms/{}/{}",
        config.layout.viewport_width,
        config.layout.viewport_height,
        config.layout.item_width,
        config.layout.item_height,
        config.layout.item_count,
        config.layout.page_count,
        config.transition.duration_ms,
        config.transition.damping_ratio,
        config.transition.initial_velocity
    );

    let app = App::new(config).context("Failed to build card screen")?;

    let (event_tx, event_rx) = mpsc::channel::<HostEvent>(100);

    // Install Ctrl+C handler so terminal kill triggers graceful shutdown
    {
        let shutdown_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Ctrl+C received, initiating shutdown...");
                let _ = shutdown_tx.send(HostEvent::Shutdown).await;
            }
        });
    }

    let scenario = Scenario {
        swipes: cli.swipe.clone(),
        cancel_after: cli.cancel_after_ms.map(Duration::from_millis),
    };
    tokio::spawn(scenario.play(event_tx.clone()));

    let report = app.run(event_rx, event_tx).await;
    info!(
        "Done: page {}, outcome {:?}, {} frames",
        report.page, report.outcome, report.frames
    );

    if cli.report {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    }

    Ok(())
}
