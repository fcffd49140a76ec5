//! FreightView Core - Shipment Movement Simulation and Lifecycle Engine
//!
//! Shipments travel between catalog cities on a fixed tick. Each tick moves
//! every in-transit shipment toward its destination at a priority-dependent
//! speed, records milestones in an append-only history and delivers it once
//! it is close enough. After every tick, creation and cancellation the
//! tracker publishes a full snapshot to its sinks.
//!
//! Layers, bottom up:
//! 1. **Geodesy**: haversine great-circle distances
//! 2. **Catalog / Shipment / Ledger**: the data model and its lifecycle
//! 3. **Movement / Fleet**: per-tick advancement over the whole fleet
//! 4. **Tracker / Scheduler**: locking, publishing and cadence

pub mod city;
pub mod error;
pub mod fleet;
pub mod geodesy;
pub mod ledger;
pub mod movement;
pub mod scheduler;
pub mod shipment;
pub mod stats;
pub mod tracker;
pub mod validation;

// Re-export key types for convenience
pub use city::{City, CityCatalog};
pub use error::CoreError;
pub use fleet::{Fleet, TickOutcome};
pub use geodesy::{haversine_km, Coordinate, EARTH_RADIUS_KM};
pub use ledger::{Event, EventKind, History, MILESTONES};
pub use movement::{advance, progress_percent, MovementConfig, SpeedTable};
pub use scheduler::{RunSummary, Scheduler};
pub use shipment::{Manifest, Priority, Shipment, Status};
pub use stats::{PriorityCounts, Stats, StatusCounts};
pub use tracker::{Snapshot, TickReport, Tracker, TrackerConfig};
pub use validation::{CreateShipment, CUSTOMER_NAMES};
