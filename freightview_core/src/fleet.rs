//! The owned shipment collection.
//!
//! `Fleet` is plain data plus the operations that mutate it. It has no
//! locking of its own; the [`Tracker`](crate::tracker::Tracker) wraps it in
//! the single write lock that serializes ticks, creations and cancellations.

use freightview_env::{IdGenerator, ShipmentId};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::city::CityCatalog;
use crate::error::CoreError;
use crate::movement::{advance, MovementConfig};
use crate::shipment::{Shipment, Status};
use crate::stats::{self, Stats};
use crate::validation::CreateShipment;

/// Tick length used by [`Fleet::settle`].
const SETTLE_TICK_SECS: f64 = 3600.0;

/// Upper bound on settle iterations (a pole-to-pole crawl needs a few hundred).
const MAX_SETTLE_TICKS: usize = 100_000;

/// Result of one pass over the fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Shipments whose location, progress or status changed
    pub changed: Vec<ShipmentId>,

    /// Subset of `changed` that was delivered during this pass
    pub delivered: Vec<ShipmentId>,
}

/// All known shipments, keyed and iterated in id order.
pub struct Fleet {
    catalog: Arc<CityCatalog>,
    ids: Arc<dyn IdGenerator>,
    movement: MovementConfig,
    shipments: BTreeMap<ShipmentId, Shipment>,
}

impl Fleet {
    pub fn new(
        catalog: Arc<CityCatalog>,
        ids: Arc<dyn IdGenerator>,
        movement: MovementConfig,
    ) -> Result<Self, CoreError> {
        movement.validate()?;
        Ok(Self {
            catalog,
            ids,
            movement,
            shipments: BTreeMap::new(),
        })
    }

    /// Loads previously persisted shipments.
    ///
    /// Every shipment is verified before any is inserted, and an id that is
    /// repeated in `shipments` or already live rejects the whole batch.
    /// Restored ids are reported to the id generator so they are never
    /// handed out again.
    pub fn restore(&mut self, shipments: Vec<Shipment>) -> Result<usize, CoreError> {
        let mut seen = BTreeSet::new();
        for shipment in &shipments {
            shipment.verify()?;
            if self.shipments.contains_key(&shipment.id) || !seen.insert(shipment.id) {
                return Err(CoreError::DuplicateShipment(shipment.id));
            }
        }

        let mut count = 0;
        for shipment in shipments {
            self.ids.observe(shipment.id);
            if self.shipments.insert(shipment.id, shipment).is_none() {
                count += 1;
            }
        }
        info!("Restored {} shipments", count);
        Ok(count)
    }

    /// Validates `request` and dispatches a new shipment.
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        request: &CreateShipment,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<&Shipment, CoreError> {
        let (origin, destination) = request.validate(&self.catalog)?;
        let (origin, destination) = (origin.clone(), destination.clone());
        let manifest = request.manifest(rng);
        let id = self.ids.next_id();

        let shipment = Shipment::dispatch(id, manifest, origin, destination, now_ms, &self.movement);
        info!(
            "{} created: {} -> {} for {} ({} priority, {:.0} km)",
            id,
            shipment.origin.name,
            shipment.destination.name,
            shipment.customer,
            shipment.priority,
            shipment.total_distance_km
        );
        Ok(self.shipments.entry(id).or_insert(shipment))
    }

    /// Cancels an in-transit shipment.
    pub fn cancel(&mut self, id: ShipmentId, now_ms: u64) -> Result<&Shipment, CoreError> {
        let shipment = self.shipments.get_mut(&id).ok_or(CoreError::NotFound(id))?;
        shipment.cancel(now_ms)?;
        info!("{} cancelled at {}% progress", id, shipment.progress);
        Ok(shipment)
    }

    /// Advances every shipment by one tick.
    ///
    /// The interval is checked up front, so an invalid tick mutates nothing.
    pub fn tick(&mut self, tick_secs: f64, now_ms: u64) -> Result<TickOutcome, CoreError> {
        if !(tick_secs.is_finite() && tick_secs > 0.0) {
            return Err(CoreError::InvalidTickInterval(tick_secs));
        }

        let mut outcome = TickOutcome::default();
        for (id, shipment) in self.shipments.iter_mut() {
            if advance(shipment, tick_secs, now_ms, &self.movement)? {
                outcome.changed.push(*id);
                if shipment.status == Status::Delivered {
                    info!(
                        "{} delivered to {} at {}",
                        id, shipment.customer, shipment.destination.name
                    );
                    outcome.delivered.push(*id);
                }
            }
        }
        debug!(
            "Fleet tick: {} changed, {} delivered",
            outcome.changed.len(),
            outcome.delivered.len()
        );
        Ok(outcome)
    }

    /// Drives a single shipment forward in hour-long ticks until it is terminal.
    pub fn settle(&mut self, id: ShipmentId, now_ms: u64) -> Result<&Shipment, CoreError> {
        let shipment = self.shipments.get_mut(&id).ok_or(CoreError::NotFound(id))?;
        let mut ticks = 0;
        while !shipment.is_terminal() && ticks < MAX_SETTLE_TICKS {
            advance(shipment, SETTLE_TICK_SECS, now_ms, &self.movement)?;
            ticks += 1;
        }
        debug!("{} settled after {} ticks ({})", id, ticks, shipment.status);
        Ok(shipment)
    }

    pub fn get(&self, id: ShipmentId) -> Option<&Shipment> {
        self.shipments.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shipment> {
        self.shipments.values()
    }

    pub fn len(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }

    /// Owned copy of every shipment, in id order.
    pub fn snapshot(&self) -> Vec<Shipment> {
        self.shipments.values().cloned().collect()
    }

    pub fn stats(&self, connected_clients: usize) -> Stats {
        stats::compute(self.shipments.values(), self.catalog.len(), connected_clients)
    }

    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    pub fn movement(&self) -> &MovementConfig {
        &self.movement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EventKind;
    use crate::shipment::Priority;
    use freightview_env::SequentialIds;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fleet() -> Fleet {
        Fleet::new(
            Arc::new(CityCatalog::world()),
            Arc::new(SequentialIds::new()),
            MovementConfig::default(),
        )
        .unwrap()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(1)
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut fleet = fleet();
        let mut rng = rng();

        let a = fleet.create(&CreateShipment::new("A", "Tokyo", "New York"), 0, &mut rng).unwrap().id();
        let b = fleet.create(&CreateShipment::new("B", "Berlin", "Sydney"), 0, &mut rng).unwrap().id();

        assert_eq!(a, ShipmentId(1));
        assert_eq!(b, ShipmentId(2));
        assert_eq!(fleet.len(), 2);
    }

    #[test]
    fn test_rejected_request_consumes_no_id() {
        let mut fleet = fleet();
        let mut rng = rng();

        assert!(fleet.create(&CreateShipment::new("A", "Paris", "Paris"), 0, &mut rng).is_err());
        assert!(fleet.is_empty());

        let id = fleet.create(&CreateShipment::new("A", "Paris", "Rome"), 0, &mut rng).unwrap().id();
        assert_eq!(id, ShipmentId(1));
    }

    #[test]
    fn test_cancel_unknown_shipment() {
        let mut fleet = fleet();
        assert_eq!(
            fleet.cancel(ShipmentId(99), 0).unwrap_err(),
            CoreError::NotFound(ShipmentId(99))
        );
    }

    #[test]
    fn test_tick_reports_changes_only_for_active_shipments() {
        let mut fleet = fleet();
        let mut rng = rng();
        let a = fleet.create(&CreateShipment::new("A", "Tokyo", "New York"), 0, &mut rng).unwrap().id();
        let b = fleet.create(&CreateShipment::new("B", "Paris", "Rome"), 0, &mut rng).unwrap().id();
        fleet.cancel(b, 1).unwrap();

        let outcome = fleet.tick(3.0, 3_000).unwrap();

        assert_eq!(outcome.changed, vec![a]);
        assert!(outcome.delivered.is_empty());
    }

    #[test]
    fn test_invalid_tick_mutates_nothing() {
        let mut fleet = fleet();
        let mut rng = rng();
        fleet.create(&CreateShipment::new("A", "Tokyo", "New York"), 0, &mut rng).unwrap();
        let before = fleet.snapshot();

        assert!(fleet.tick(0.0, 1).is_err());
        assert_eq!(fleet.snapshot(), before);
    }

    #[test]
    fn test_settle_delivers_with_full_history() {
        let mut fleet = fleet();
        let mut rng = rng();
        let id = fleet
            .create(&CreateShipment::new("Watch", "Geneva", "Hong Kong").priority(Priority::High), 0, &mut rng)
            .unwrap()
            .id();

        let shipment = fleet.settle(id, 10).unwrap();

        assert_eq!(shipment.status(), Status::Delivered);
        assert_eq!(shipment.progress(), 100);
        let milestones: Vec<_> = shipment.history().milestones().collect();
        assert!(milestones.starts_with(&[25, 50, 75]), "{milestones:?}");
        assert_eq!(shipment.history().count(|k| *k == EventKind::Delivered), 1);
    }

    #[test]
    fn test_restore_observes_ids() {
        let mut source = fleet();
        let mut rng = rng();
        for _ in 0..3 {
            source.create(&CreateShipment::new("A", "Lima", "Bogotá"), 0, &mut rng).unwrap();
        }

        let mut restored = fleet();
        assert_eq!(restored.restore(source.snapshot()).unwrap(), 3);

        let next = restored.create(&CreateShipment::new("B", "Lima", "Santiago"), 0, &mut rng).unwrap().id();
        assert_eq!(next, ShipmentId(4));
    }

    #[test]
    fn test_restore_rejects_corrupt_shipment() {
        let mut source = fleet();
        let mut rng = rng();
        source.create(&CreateShipment::new("A", "Lima", "Bogotá"), 0, &mut rng).unwrap();
        let mut shipments = source.snapshot();
        shipments[0].progress = 150;

        let mut restored = fleet();
        assert!(matches!(restored.restore(shipments), Err(CoreError::CorruptShipment { .. })));
        assert!(restored.is_empty());
    }

    #[test]
    fn test_restore_rejects_id_already_live() {
        let mut rng = rng();
        let mut live = fleet();
        live.create(&CreateShipment::new("Live", "Lima", "Bogotá"), 0, &mut rng).unwrap();

        let mut other = fleet();
        other.create(&CreateShipment::new("Stale", "Paris", "Rome"), 0, &mut rng).unwrap();

        assert_eq!(
            live.restore(other.snapshot()),
            Err(CoreError::DuplicateShipment(ShipmentId(1)))
        );
        assert_eq!(live.len(), 1);
        assert_eq!(live.get(ShipmentId(1)).unwrap().name(), "Live");
    }

    #[test]
    fn test_restore_rejects_repeated_id_in_batch() {
        let mut rng = rng();
        let mut source = fleet();
        source.create(&CreateShipment::new("Stale", "Paris", "Rome"), 0, &mut rng).unwrap();
        source.create(&CreateShipment::new("Other", "Lima", "Bogotá"), 0, &mut rng).unwrap();
        let mut shipments = source.snapshot();
        shipments.push(shipments[0].clone());

        let mut restored = fleet();
        assert_eq!(
            restored.restore(shipments),
            Err(CoreError::DuplicateShipment(ShipmentId(1)))
        );
        assert!(restored.is_empty());
    }

    #[test]
    fn test_stats_scenario() {
        let mut fleet = fleet();
        let mut rng = rng();
        let routes = [
            ("Tokyo", "New York"),
            ("Berlin", "Sydney"),
            ("Paris", "Los Angeles"),
            ("Geneva", "Hong Kong"),
            ("London", "Dubai"),
            ("Chicago", "São Paulo"),
        ];
        let ids: Vec<_> = routes
            .iter()
            .map(|(o, d)| fleet.create(&CreateShipment::new("X", *o, *d), 0, &mut rng).unwrap().id())
            .collect();
        fleet.settle(ids[3], 0).unwrap();
        fleet.settle(ids[4], 0).unwrap();
        fleet.cancel(ids[5], 0).unwrap();

        let stats = fleet.stats(4);

        assert_eq!(stats.total, 6);
        assert_eq!(stats.by_status.in_transit, 3);
        assert_eq!(stats.by_status.delivered, 2);
        assert_eq!(stats.by_status.cancelled, 1);
        assert_eq!(stats.total_cities, CityCatalog::world().len());
        assert_eq!(stats.connected_clients, 4);
    }
}
