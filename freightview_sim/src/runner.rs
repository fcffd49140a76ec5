//! Harness assembly and the headless runner.
//!
//! [`Harness::build`] wires a tracker to its sinks and loads its initial
//! fleet; both the CLI's serve mode and [`run_headless`] start from it.

use freightview_core::{CityCatalog, Scheduler, Snapshot, Stats, Tracker};
use freightview_env::{BroadcastSink, FreightViewContext, SequentialIds, ShipmentId};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::context::SimContext;
use crate::error::SimError;
use crate::persistence::JsonFileStore;
use crate::samples::seed_samples;
use crate::viewer::{spawn_viewer, ViewerState};

/// A tracker with its broadcast channel and optional file store attached.
pub struct Harness<Ctx: FreightViewContext> {
    pub tracker: Arc<Tracker<Ctx>>,
    pub broadcast: Arc<BroadcastSink<Snapshot>>,
    pub store: Option<Arc<JsonFileStore>>,
}

impl<Ctx: FreightViewContext> Harness<Ctx> {
    /// Builds the tracker and loads its starting fleet.
    ///
    /// Shipments are restored from the data file when it exists; otherwise
    /// the sample fleet is created (unless disabled). A data file that
    /// exists but cannot be parsed is an error, never silently replaced.
    pub async fn build(context: Arc<Ctx>, config: &SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let catalog = Arc::new(load_catalog(config)?);
        info!("City catalog: {} cities on {} continents", catalog.len(), catalog.continents().len());

        let broadcast = Arc::new(BroadcastSink::new(config.broadcast_capacity));
        let store = config.data_file.as_ref().map(|p| Arc::new(JsonFileStore::new(p)));

        let mut tracker = Tracker::new(
            context,
            config.tracker()?,
            catalog,
            Arc::new(SequentialIds::new()),
        )?
        .with_sink(broadcast.clone());
        if let Some(store) = &store {
            tracker = tracker.with_sink(store.clone());
        }

        let restored = match &store {
            Some(store) => match store.load()? {
                Some(shipments) => tracker.restore(shipments)?,
                None => 0,
            },
            None => 0,
        };
        if restored > 0 {
            info!("Loaded {} shipments", restored);
        } else if config.seed_samples {
            seed_samples(&tracker).await?;
        }

        Ok(Self {
            tracker: Arc::new(tracker),
            broadcast,
            store,
        })
    }

    /// Attaches `count` viewers to the broadcast channel.
    pub fn spawn_viewers(&self, count: usize) -> Vec<oneshot::Receiver<ViewerState>> {
        (0..count)
            .map(|i| {
                spawn_viewer(
                    self.tracker.context().as_ref(),
                    format!("viewer-{}", i + 1),
                    self.broadcast.subscribe(),
                )
            })
            .collect()
    }
}

fn load_catalog(config: &SimConfig) -> Result<CityCatalog, SimError> {
    match &config.cities_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
            Ok(CityCatalog::from_json(&raw)?)
        }
        None => Ok(CityCatalog::world()),
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlessReport {
    pub seed: u64,
    pub ticks: u64,
    pub simulated_secs: f64,
    pub snapshots_published: u64,
    pub delivered: Vec<ShipmentId>,
    pub stats: Stats,
    pub viewers: Vec<ViewerState>,
}

/// Runs `ticks` ticks on a virtual clock with `viewers` attached.
///
/// No real time passes: the scheduler's sleeps only advance the
/// simulation clock.
pub async fn run_headless(config: &SimConfig, ticks: u64, viewers: usize) -> Result<HeadlessReport, SimError> {
    let context = SimContext::shared(config.seed);
    let harness = Harness::build(context.clone(), config).await?;
    let pending = harness.spawn_viewers(viewers);

    info!("Headless run: {} ticks, {} viewers, seed {}", ticks, viewers, config.seed);
    let scheduler = Scheduler::new(Arc::clone(&harness.tracker));
    let summary = scheduler.run_ticks(ticks).await?;
    let stats = harness.tracker.compute_stats();

    // Closing the channel lets every viewer drain and finish
    drop(scheduler);
    let Harness { tracker, broadcast, .. } = harness;
    drop(tracker);
    drop(broadcast);

    let mut states = Vec::with_capacity(pending.len());
    for done in pending {
        match done.await {
            Ok(state) => states.push(state),
            Err(_) => warn!("A viewer exited without reporting"),
        }
    }

    Ok(HeadlessReport {
        seed: config.seed,
        ticks: summary.ticks,
        simulated_secs: context.now().as_secs_f64(),
        snapshots_published: summary.last_sequence,
        delivered: summary.delivered,
        stats,
        viewers: states,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use freightview_core::{CreateShipment, Status};

    fn config() -> SimConfig {
        SimConfig {
            seed: 9,
            ..SimConfig::default()
        }
    }

    #[tokio::test]
    async fn test_build_seeds_samples_without_data_file() {
        let harness = Harness::build(SimContext::shared(1), &config()).await.unwrap();
        assert_eq!(harness.tracker.list_shipments().len(), 8);
        assert!(harness.store.is_none());
    }

    #[tokio::test]
    async fn test_build_without_samples_starts_empty() {
        let config = SimConfig {
            seed_samples: false,
            ..config()
        };
        let harness = Harness::build(SimContext::shared(1), &config).await.unwrap();
        assert!(harness.tracker.list_shipments().is_empty());
    }

    #[tokio::test]
    async fn test_build_restores_from_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimConfig {
            data_file: Some(dir.path().join("shipments.json")),
            ..config()
        };

        let first = Harness::build(SimContext::shared(1), &config).await.unwrap();
        first
            .tracker
            .create_shipment(&CreateShipment::new("Extra", "Lima", "Bogotá"))
            .await
            .unwrap();
        let saved = first.tracker.list_shipments();
        drop(first);

        let second = Harness::build(SimContext::shared(2), &config).await.unwrap();
        assert_eq!(second.tracker.list_shipments(), saved);
    }

    #[tokio::test]
    async fn test_unknown_cities_file_fails() {
        let config = SimConfig {
            cities_file: Some("/no/such/cities.json".into()),
            ..config()
        };
        assert!(matches!(
            Harness::build(SimContext::shared(1), &config).await,
            Err(SimError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_headless_run_moves_fleet_and_feeds_viewers() {
        let report = run_headless(&config(), 100, 2).await.unwrap();

        assert_eq!(report.ticks, 100);
        assert_relative_eq!(report.simulated_secs, 300.0, epsilon = 1e-6);
        // 11 sample mutations (8 creates, 2 settles, 1 cancel) precede the ticks
        assert_eq!(report.snapshots_published, 11 + 100);
        assert_eq!(report.stats.by_status.in_transit, 5);
        assert_eq!(report.viewers.len(), 2);
        for viewer in &report.viewers {
            assert_eq!(viewer.last_sequence, Some(report.snapshots_published));
            assert_eq!(viewer.stale, 0);
        }
    }

    #[tokio::test]
    async fn test_headless_runs_are_deterministic() {
        let a = run_headless(&config(), 10, 0).await.unwrap();
        let b = run_headless(&config(), 10, 0).await.unwrap();
        assert_eq!(a.stats, b.stats);
        assert_eq!(a.delivered, b.delivered);
        assert_eq!(a.snapshots_published, 21);
    }

    #[tokio::test]
    async fn test_long_headless_run_delivers_short_hops() {
        let dir = tempfile::tempdir().unwrap();
        let config = SimConfig {
            data_file: Some(dir.path().join("shipments.json")),
            seed_samples: false,
            tick_interval_secs: 3600.0,
            ..config()
        };
        {
            let harness = Harness::build(SimContext::shared(1), &config).await.unwrap();
            harness
                .tracker
                .create_shipment(&CreateShipment::new("Hop", "Paris", "Brussels"))
                .await
                .unwrap();
        }

        let report = run_headless(&config, 10, 0).await.unwrap();

        assert_eq!(report.delivered.len(), 1);
        assert_eq!(report.stats.by_status.delivered, 1);
        let saved = JsonFileStore::new(dir.path().join("shipments.json")).load().unwrap().unwrap();
        assert_eq!(saved[0].status(), Status::Delivered);
    }
}
