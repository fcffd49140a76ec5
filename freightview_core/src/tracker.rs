//! Tracker - the single owner of fleet state.
//!
//! This module is the integration layer between the pure fleet logic
//! (validation, movement, ledger, stats) and the environment abstraction
//! (FreightViewContext, SnapshotSink).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Tracker                           │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │          Context: FreightViewContext                │  │
//! │  │  • timestamp_ms() → event and shipment timestamps  │  │
//! │  │  • rng(stream)    → creation defaults              │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                           │                              │
//! │  ┌──────────── RwLock<State> (single writer) ────────┐   │
//! │  │   Fleet { shipments, ids, catalog, movement }     │   │
//! │  └───────────────────────────────────────────────────┘   │
//! │                           │ Arc<Snapshot>                │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐                  │
//! │  │  Sink 0  │ │  Sink 1  │ │   ...    │                  │
//! │  └──────────┘ └──────────┘ └──────────┘                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Ticks, creations and cancellations take the write lock; reads take the
//! read lock and always observe a fully applied tick. Snapshots are cut
//! while the lock is held and published after it is released, so a slow
//! sink never stalls the fleet. Creations and cancellations always
//! publish; a tick publishes only if some shipment changed.
//!
//! # Usage
//!
//! ```ignore
//! use freightview_core::{Tracker, TrackerConfig, CityCatalog};
//! use freightview_env::{BroadcastSink, SequentialIds, TokioContext};
//!
//! let sink = Arc::new(BroadcastSink::new(16));
//! let tracker = Tracker::new(
//!     TokioContext::shared(),
//!     TrackerConfig::default(),
//!     Arc::new(CityCatalog::world()),
//!     Arc::new(SequentialIds::new()),
//! )?
//! .with_sink(sink.clone());
//!
//! let mut viewer = sink.subscribe();
//! tracker.tick().await?;
//! ```

use freightview_env::{FreightViewContext, IdGenerator, ShipmentId, SnapshotSink};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, warn};

use crate::city::CityCatalog;
use crate::error::CoreError;
use crate::fleet::Fleet;
use crate::movement::MovementConfig;
use crate::shipment::Shipment;
use crate::stats::Stats;
use crate::validation::CreateShipment;

/// RNG stream used for creation defaults.
const CREATION_RNG_STREAM: u64 = 1;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for a [`Tracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Simulated time covered by one tick (default: 3s)
    #[serde(with = "duration_secs")]
    pub tick_interval: Duration,

    /// Movement rules applied on every tick
    pub movement: MovementConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(3),
            movement: MovementConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.tick_interval.is_zero() {
            return Err(CoreError::InvalidTickInterval(0.0));
        }
        self.movement.validate()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs_f64().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// A consistent, self-contained copy of every shipment.
///
/// Sequence numbers increase by one per snapshot, so a subscriber that sees
/// an older sequence than the last one it rendered can drop it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub sequence: u64,
    pub taken_at_ms: u64,
    pub shipments: Vec<Shipment>,
}

impl Snapshot {
    pub fn get(&self, id: ShipmentId) -> Option<&Shipment> {
        self.shipments.iter().find(|s| s.id() == id)
    }
}

/// What one call to [`Tracker::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    pub changed: Vec<ShipmentId>,
    pub delivered: Vec<ShipmentId>,
    /// Sequence of the snapshot published for this tick, if anything changed
    pub published: Option<u64>,
}

// ============================================================================
// TRACKER
// ============================================================================

struct State {
    fleet: Fleet,
    rng: ChaCha8Rng,
    sequence: u64,
    ticks: u64,
}

impl State {
    fn cut_snapshot(&mut self, taken_at_ms: u64) -> Arc<Snapshot> {
        self.sequence += 1;
        Arc::new(Snapshot {
            sequence: self.sequence,
            taken_at_ms,
            shipments: self.fleet.snapshot(),
        })
    }
}

/// Owns the fleet and publishes a snapshot after every mutation.
///
/// Generic over the context so the same tracker runs against the wall
/// clock in production and a manually advanced clock in simulation.
pub struct Tracker<Ctx: FreightViewContext> {
    context: Arc<Ctx>,
    config: TrackerConfig,
    state: RwLock<State>,
    sinks: Vec<Arc<dyn SnapshotSink<Snapshot>>>,
}

impl<Ctx: FreightViewContext> Tracker<Ctx> {
    pub fn new(
        context: Arc<Ctx>,
        config: TrackerConfig,
        catalog: Arc<CityCatalog>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let fleet = Fleet::new(catalog, ids, config.movement.clone())?;
        let rng = context.rng(CREATION_RNG_STREAM);

        Ok(Self {
            context,
            config,
            state: RwLock::new(State {
                fleet,
                rng,
                sequence: 0,
                ticks: 0,
            }),
            sinks: Vec::new(),
        })
    }

    /// Adds a sink that receives every published snapshot.
    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink<Snapshot>>) -> Self {
        self.sinks.push(sink);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads persisted shipments. Nothing is published.
    pub fn restore(&self, shipments: Vec<Shipment>) -> Result<usize, CoreError> {
        self.write().fleet.restore(shipments)
    }

    /// Validates and creates a shipment, then publishes a snapshot.
    pub async fn create_shipment(&self, request: &CreateShipment) -> Result<Shipment, CoreError> {
        let now_ms = self.context.timestamp_ms();
        let (shipment, snapshot) = {
            let mut guard = self.write();
            let state = &mut *guard;
            let shipment = state.fleet.create(request, now_ms, &mut state.rng)?.clone();
            (shipment, state.cut_snapshot(now_ms))
        };
        self.publish(snapshot).await;
        Ok(shipment)
    }

    /// Cancels an in-transit shipment, then publishes a snapshot.
    pub async fn cancel_shipment(&self, id: ShipmentId) -> Result<Shipment, CoreError> {
        let now_ms = self.context.timestamp_ms();
        let (shipment, snapshot) = {
            let mut state = self.write();
            let shipment = state.fleet.cancel(id, now_ms)?.clone();
            (shipment, state.cut_snapshot(now_ms))
        };
        self.publish(snapshot).await;
        Ok(shipment)
    }

    /// Runs one shipment to its terminal state, then publishes a snapshot.
    pub async fn settle_shipment(&self, id: ShipmentId) -> Result<Shipment, CoreError> {
        let now_ms = self.context.timestamp_ms();
        let (shipment, snapshot) = {
            let mut state = self.write();
            let shipment = state.fleet.settle(id, now_ms)?.clone();
            (shipment, state.cut_snapshot(now_ms))
        };
        self.publish(snapshot).await;
        Ok(shipment)
    }

    /// Every shipment in id order.
    pub fn list_shipments(&self) -> Vec<Shipment> {
        self.read().fleet.snapshot()
    }

    pub fn get_shipment(&self, id: ShipmentId) -> Result<Shipment, CoreError> {
        self.read().fleet.get(id).cloned().ok_or(CoreError::NotFound(id))
    }

    /// Cuts a snapshot without publishing it (e.g. for a newly joined viewer).
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let now_ms = self.context.timestamp_ms();
        self.write().cut_snapshot(now_ms)
    }

    pub fn compute_stats(&self) -> Stats {
        let clients = self.subscriber_count();
        self.read().fleet.stats(clients)
    }

    /// Listeners across all sinks.
    pub fn subscriber_count(&self) -> usize {
        self.sinks.iter().map(|s| s.subscriber_count()).sum()
    }

    /// Advances every in-transit shipment by one tick.
    ///
    /// The full shipment set is published only when at least one shipment
    /// changed; a tick over an idle fleet publishes nothing.
    pub async fn tick(&self) -> Result<TickReport, CoreError> {
        let now_ms = self.context.timestamp_ms();
        let tick_secs = self.config.tick_interval.as_secs_f64();

        let (report, snapshot) = {
            let mut state = self.write();
            let outcome = state.fleet.tick(tick_secs, now_ms)?;
            state.ticks += 1;
            let snapshot = (!outcome.changed.is_empty()).then(|| state.cut_snapshot(now_ms));
            let report = TickReport {
                tick: state.ticks,
                changed: outcome.changed,
                delivered: outcome.delivered,
                published: snapshot.as_ref().map(|s| s.sequence),
            };
            (report, snapshot)
        };

        if let Some(snapshot) = snapshot {
            self.publish(snapshot).await;
        }
        Ok(report)
    }

    pub fn tick_count(&self) -> u64 {
        self.read().ticks
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<Ctx> {
        &self.context
    }

    async fn publish(&self, snapshot: Arc<Snapshot>) {
        for sink in &self.sinks {
            if let Err(e) = sink.publish(Arc::clone(&snapshot)).await {
                warn!("Sink '{}' failed to publish snapshot {}: {}", sink.name(), snapshot.sequence, e);
            }
        }
        debug!(
            "Published snapshot {} ({} shipments) to {} sinks",
            snapshot.sequence,
            snapshot.shipments.len(),
            self.sinks.len()
        );
    }
}
