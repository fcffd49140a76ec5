//! Common types for the FreightView environment abstraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a shipment.
///
/// Ids are handed out sequentially by an [`IdGenerator`] and rendered as
/// `PKG` followed by at least three digits (`PKG001`, `PKG042`, `PKG1234`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShipmentId(pub u64);

impl ShipmentId {
    /// Prefix used in the textual form.
    pub const PREFIX: &'static str = "PKG";
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", Self::PREFIX, self.0)
    }
}

/// Error returned when a string is not a valid shipment id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid shipment id '{0}': expected PKG followed by digits")]
pub struct ParseShipmentIdError(pub String);

impl FromStr for ShipmentId {
    type Err = ParseShipmentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix(Self::PREFIX)
            .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| ParseShipmentIdError(s.to_string()))?;

        digits
            .parse::<u64>()
            .map(ShipmentId)
            .map_err(|_| ParseShipmentIdError(s.to_string()))
    }
}

impl TryFrom<String> for ShipmentId {
    type Error = ParseShipmentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShipmentId> for String {
    fn from(id: ShipmentId) -> Self {
        id.to_string()
    }
}

/// Source of shipment ids.
///
/// Ids are monotonic and never reused within a process lifetime.
pub trait IdGenerator: Send + Sync + 'static {
    /// Returns the next unused id.
    fn next_id(&self) -> ShipmentId;

    /// Records an id that already exists (e.g. restored from disk) so it is
    /// never handed out again.
    fn observe(&self, id: ShipmentId);
}

/// Sequential id generator backed by an atomic counter.
#[derive(Debug)]
pub struct SequentialIds {
    /// Next value to hand out
    next: AtomicU64,
}

impl SequentialIds {
    /// Creates a generator whose first id is `PKG001`.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates a generator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Peeks at the id the next call to `next_id` will return.
    pub fn peek(&self) -> ShipmentId {
        ShipmentId(self.next.load(Ordering::SeqCst))
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> ShipmentId {
        ShipmentId(self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn observe(&self, id: ShipmentId) {
        self.next.fetch_max(id.0.saturating_add(1), Ordering::SeqCst);
    }
}
