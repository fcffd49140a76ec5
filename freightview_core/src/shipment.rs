//! The shipment entity and its lifecycle transitions.
//!
//! ```text
//!            dispatch                 advance (remaining < threshold)
//!   request ----------> InTransit ---------------------------------> Delivered
//!                           |
//!                           |  cancel (explicit request only)
//!                           +----------------------------------------> Cancelled
//! ```
//!
//! Fields are crate-private: only the movement engine and the lifecycle
//! methods below may change a shipment, which keeps the invariants on
//! `progress`, `location` and the terminal timestamps in one place.

use freightview_env::ShipmentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::city::City;
use crate::error::CoreError;
use crate::geodesy::{haversine_km, Coordinate};
use crate::ledger::{Event, EventKind, History};
use crate::movement::MovementConfig;

/// How far a restored delivered shipment may sit from its destination.
const DELIVERED_LOCATION_EPSILON_KM: f64 = 1e-6;

/// Delivery priority. Higher priorities travel faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn all() -> [Priority; 3] {
        [Priority::Low, Priority::Medium, Priority::High]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(CoreError::InvalidPriority(s.to_string())),
        }
    }
}

/// Lifecycle state. `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Cancelled,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::InTransit)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::InTransit => "In Transit",
            Status::Delivered => "Delivered",
            Status::Cancelled => "Cancelled",
        })
    }
}

/// Descriptive metadata fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub name: String,
    pub customer: String,
    pub customer_phone: String,
    pub weight_kg: f64,
    pub priority: Priority,
}

/// A shipment travelling between two cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub(crate) id: ShipmentId,
    pub(crate) name: String,
    pub(crate) customer: String,
    #[serde(default)]
    pub(crate) customer_phone: String,
    pub(crate) weight_kg: f64,
    pub(crate) priority: Priority,

    /// Copied from the catalog at creation
    pub(crate) origin: City,
    pub(crate) destination: City,

    pub(crate) location: Coordinate,
    pub(crate) status: Status,
    pub(crate) progress: u8,

    /// Great-circle origin → destination, computed once
    pub(crate) total_distance_km: f64,

    pub(crate) created_at_ms: u64,
    pub(crate) last_update_ms: u64,
    pub(crate) estimated_delivery_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) delivered_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cancelled_at_ms: Option<u64>,

    pub(crate) history: History,
}

impl Shipment {
    /// Creates a shipment at its origin and records the dispatch event.
    ///
    /// A route of zero length (origin and destination share a coordinate)
    /// is delivered on the spot.
    pub fn dispatch(
        id: ShipmentId,
        manifest: Manifest,
        origin: City,
        destination: City,
        now_ms: u64,
        movement: &MovementConfig,
    ) -> Self {
        let total_distance_km = haversine_km(origin.location, destination.location);
        let estimated_delivery_ms =
            now_ms.saturating_add(movement.travel_time_ms(manifest.priority, total_distance_km));

        let mut shipment = Self {
            id,
            name: manifest.name,
            customer: manifest.customer,
            customer_phone: manifest.customer_phone,
            weight_kg: manifest.weight_kg,
            priority: manifest.priority,
            location: origin.location,
            origin,
            destination,
            status: Status::InTransit,
            progress: 0,
            total_distance_km,
            created_at_ms: now_ms,
            last_update_ms: now_ms,
            estimated_delivery_ms,
            delivered_at_ms: None,
            cancelled_at_ms: None,
            history: History::default(),
        };

        shipment.history.append(Event {
            timestamp_ms: now_ms,
            kind: EventKind::Dispatched,
            description: format!(
                "Package created and dispatched from {} to {}",
                shipment.origin.name, shipment.destination.name
            ),
            location: shipment.origin.location,
            status: Status::InTransit,
            details: format!(
                "Customer: {}, Weight: {:.1} kg, Distance: {} km",
                shipment.customer,
                shipment.weight_kg,
                total_distance_km.round()
            ),
        });

        if total_distance_km <= 0.0 {
            shipment.deliver(now_ms);
        }

        shipment
    }

    pub fn id(&self) -> ShipmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn customer_phone(&self) -> &str {
        &self.customer_phone
    }

    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn origin(&self) -> &City {
        &self.origin
    }

    pub fn destination(&self) -> &City {
        &self.destination
    }

    pub fn location(&self) -> Coordinate {
        self.location
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    /// Great-circle distance still to go.
    pub fn remaining_km(&self) -> f64 {
        haversine_km(self.location, self.destination.location)
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    pub fn last_update_ms(&self) -> u64 {
        self.last_update_ms
    }

    pub fn estimated_delivery_ms(&self) -> u64 {
        self.estimated_delivery_ms
    }

    pub fn delivered_at_ms(&self) -> Option<u64> {
        self.delivered_at_ms
    }

    pub fn cancelled_at_ms(&self) -> Option<u64> {
        self.cancelled_at_ms
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Cancels an in-transit shipment, freezing it where it stands.
    pub fn cancel(&mut self, now_ms: u64) -> Result<(), CoreError> {
        match self.status {
            Status::Delivered => Err(CoreError::InvalidTransition {
                id: self.id,
                from: Status::Delivered,
                to: Status::Cancelled,
            }),
            Status::Cancelled => Err(CoreError::AlreadyCancelled(self.id)),
            Status::InTransit => {
                let previous = self.status;
                self.status = Status::Cancelled;
                self.cancelled_at_ms = Some(now_ms);
                self.last_update_ms = now_ms;
                self.history.append(Event {
                    timestamp_ms: now_ms,
                    kind: EventKind::Cancelled {
                        previous,
                        progress: self.progress,
                    },
                    description: format!(
                        "Package cancelled by user at {}% progress",
                        self.progress
                    ),
                    location: self.location,
                    status: Status::Cancelled,
                    details: format!("Previous status: {previous}. Refund will be processed."),
                });
                Ok(())
            }
        }
    }

    /// Terminal arrival: pins location and progress, stamps `delivered_at`.
    pub(crate) fn deliver(&mut self, now_ms: u64) {
        debug_assert_eq!(self.status, Status::InTransit);

        self.location = self.destination.location;
        self.progress = 100;
        self.status = Status::Delivered;
        self.delivered_at_ms = Some(now_ms);
        self.last_update_ms = now_ms;
        self.history.append(Event {
            timestamp_ms: now_ms,
            kind: EventKind::Delivered,
            description: format!(
                "Package delivered to {} at {}",
                self.customer, self.destination.name
            ),
            location: self.destination.location,
            status: Status::Delivered,
            details: format!(
                "Weight: {:.1} kg, Total distance: {} km",
                self.weight_kg,
                self.total_distance_km.round()
            ),
        });
    }

    pub(crate) fn record_milestone(&mut self, percent: u8, now_ms: u64, remaining_km: f64) {
        self.history.append(Event {
            timestamp_ms: now_ms,
            kind: EventKind::Milestone { percent },
            description: format!("Journey {percent}% complete"),
            location: self.location,
            status: self.status,
            details: format!(
                "Customer: {}, Remaining: {} km",
                self.customer,
                remaining_km.round()
            ),
        });
    }

    /// Checks the lifecycle invariants of a shipment loaded from outside
    /// the engine (e.g. a persisted snapshot).
    pub fn verify(&self) -> Result<(), CoreError> {
        let corrupt = |reason: &str| CoreError::CorruptShipment {
            id: self.id,
            reason: reason.to_string(),
        };

        if self.history.is_empty() {
            return Err(corrupt("empty history"));
        }
        if self.progress > 100 {
            return Err(corrupt("progress above 100"));
        }
        if !self.location.is_valid() {
            return Err(corrupt("location out of range"));
        }
        if !(self.total_distance_km.is_finite() && self.total_distance_km >= 0.0) {
            return Err(corrupt("total distance not a finite non-negative number"));
        }
        let mut seen = BTreeSet::new();
        if !self.history.milestones().all(|m| seen.insert(m)) {
            return Err(corrupt("milestone recorded twice"));
        }
        if self.status == Status::Delivered
            && self.location.distance_to(&self.destination.location) > DELIVERED_LOCATION_EPSILON_KM
        {
            return Err(corrupt("delivered shipment away from its destination"));
        }
        match self.status {
            Status::InTransit if self.delivered_at_ms.is_some() || self.cancelled_at_ms.is_some() => {
                Err(corrupt("terminal timestamp on in-transit shipment"))
            }
            Status::Delivered if self.delivered_at_ms.is_none() || self.cancelled_at_ms.is_some() => {
                Err(corrupt("delivered shipment without deliveredAt"))
            }
            Status::Delivered if self.progress != 100 => Err(corrupt("delivered below 100%")),
            Status::Cancelled if self.cancelled_at_ms.is_none() || self.delivered_at_ms.is_some() => {
                Err(corrupt("cancelled shipment without cancelledAt"))
            }
            _ => Ok(()),
        }
    }
}
