//! FreightView Simulator CLI
//!
//! Serve mode ticks on the wall clock until Ctrl-C (or `--duration`);
//! headless mode (`--ticks`) runs on a virtual clock and exits.

use clap::Parser;
use freightview_core::Scheduler;
use freightview_env::TokioContext;
use freightview_sim::{run_headless, Harness, HeadlessReport, SimConfig, SimError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// FreightView shipment movement simulator
#[derive(Parser, Debug)]
#[command(name = "freightview-sim")]
#[command(about = "Simulate shipments moving between world cities", long_about = None)]
struct Args {
    /// JSON config file (missing keys take defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated seconds per tick
    #[arg(long)]
    tick_secs: Option<f64>,

    /// Simulated seconds per real second
    #[arg(long)]
    time_scale: Option<f64>,

    /// File shipments are loaded from and saved to
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// JSON city catalog replacing the built-in one
    #[arg(long)]
    cities: Option<PathBuf>,

    /// Start empty instead of creating the sample fleet
    #[arg(long)]
    no_samples: bool,

    /// Master seed for creation defaults (0 = random from time)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Run this many ticks on a virtual clock, then exit
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Stop serving after this many seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Number of attached viewers
    #[arg(long, default_value = "1")]
    viewers: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting (headless mode)
    #[arg(long)]
    json: bool,
}

impl Args {
    fn to_config(&self) -> Result<SimConfig, SimError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };

        if let Some(secs) = self.tick_secs {
            config.tick_interval_secs = secs;
        }
        if let Some(scale) = self.time_scale {
            config.time_scale = scale;
        }
        if let Some(path) = &self.data_file {
            config.data_file = Some(path.clone());
        }
        if let Some(path) = &self.cities {
            config.cities_file = Some(path.clone());
        }
        if self.no_samples {
            config.seed_samples = false;
        }
        if let Some(seed) = self.seed {
            config.seed = if seed == 0 {
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0)
            } else {
                seed
            };
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: SimConfig, viewers: usize, duration: Option<f64>) -> Result<(), SimError> {
    let limit = duration
        .map(Duration::try_from_secs_f64)
        .transpose()
        .map_err(|e| SimError::Config(format!("invalid --duration: {e}")))?;

    let harness = Harness::build(TokioContext::shared(), &config).await?;
    let _viewers = harness.spawn_viewers(viewers);
    let scheduler = Scheduler::new(Arc::clone(&harness.tracker));

    info!(
        "Serving {} shipments, tick every {}s",
        harness.tracker.list_shipments().len(),
        config.tick_interval_secs
    );

    let shutdown = async move {
        match limit {
            Some(limit) => {
                tokio::select! {
                    _ = tokio::time::sleep(limit) => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
    };
    scheduler.run_until(shutdown).await?;

    let stats = harness.tracker.compute_stats();
    info!(
        "Final: {} shipments ({} in transit, {} delivered, {} cancelled), average progress {:.1}%",
        stats.total,
        stats.by_status.in_transit,
        stats.by_status.delivered,
        stats.by_status.cancelled,
        stats.average_progress
    );
    Ok(())
}

fn print_report(report: &HeadlessReport, json: bool) -> Result<(), SimError> {
    if json {
        let out = serde_json::to_string_pretty(report)
            .map_err(|e| SimError::Config(format!("cannot encode report: {e}")))?;
        println!("{}", out);
        return Ok(());
    }

    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "{} ticks ({:.0} simulated seconds), {} snapshots published",
        report.ticks, report.simulated_secs, report.snapshots_published
    );
    info!(
        "{} shipments: {} in transit, {} delivered, {} cancelled",
        report.stats.total,
        report.stats.by_status.in_transit,
        report.stats.by_status.delivered,
        report.stats.by_status.cancelled
    );
    for id in &report.delivered {
        info!("  ✓ {} delivered", id);
    }
    for viewer in &report.viewers {
        info!(
            "  {}: {} snapshots, {} stale, {} lagged",
            viewer.name, viewer.received, viewer.stale, viewer.lagged
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    if !args.json {
        info!("FreightView Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let result = match args.ticks {
        Some(ticks) => match run_headless(&config, ticks, args.viewers).await {
            Ok(report) => print_report(&report, args.json),
            Err(e) => Err(e),
        },
        None => serve(config, args.viewers, args.duration).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
