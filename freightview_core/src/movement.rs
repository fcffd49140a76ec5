//! The movement engine: advances one shipment by one tick.
//!
//! Stepping happens in coordinate space (a straight lat/lng line toward the
//! destination, direction re-evaluated every tick). Everything that is
//! *measured* (progress, arrival) uses great-circle distance.
//!
//! # Per-tick algorithm
//!
//! 1. Terminal shipments are left untouched.
//! 2. If the lat/lng gap to the destination exceeds the tolerance, step
//!    `speed_kmh / km_per_degree × tick_secs / 3600 × time_scale` degrees
//!    along it (never past the destination).
//! 3. Recompute remaining distance and progress; progress never decreases.
//! 4. Record a milestone event for each multiple of 25 crossed and not yet
//!    in the ledger.
//! 5. Deliver once remaining distance drops under the arrival threshold or
//!    the coordinate gap has converged.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geodesy::{haversine_km, Coordinate};
use crate::ledger::MILESTONES;
use crate::shipment::{Priority, Shipment, Status};

/// Cruise speed per priority, km/h.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTable {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            high: 80.0,
            medium: 60.0,
            low: 40.0,
        }
    }
}

/// Tunables for the movement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Remaining great-circle distance under which a shipment is delivered (default: 50 km)
    pub arrival_threshold_km: f64,

    /// Coordinate gap below which no further step is taken (default: 0.01°)
    pub tolerance_deg: f64,

    pub speeds_kmh: SpeedTable,

    /// Conversion used to turn km/h into degrees per tick (default: 111)
    pub km_per_degree: f64,

    /// Simulated seconds per real second (default: 1.0)
    pub time_scale: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_km: 50.0,
            tolerance_deg: 0.01,
            speeds_kmh: SpeedTable::default(),
            km_per_degree: 111.0,
            time_scale: 1.0,
        }
    }
}

impl MovementConfig {
    /// Rejects non-positive values and speeds that do not rank High > Medium > Low.
    pub fn validate(&self) -> Result<(), CoreError> {
        let positive = [
            ("arrival_threshold_km", self.arrival_threshold_km),
            ("tolerance_deg", self.tolerance_deg),
            ("speeds_kmh.high", self.speeds_kmh.high),
            ("speeds_kmh.medium", self.speeds_kmh.medium),
            ("speeds_kmh.low", self.speeds_kmh.low),
            ("km_per_degree", self.km_per_degree),
            ("time_scale", self.time_scale),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::InvalidConfig(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }

        let s = &self.speeds_kmh;
        if !(s.high > s.medium && s.medium > s.low) {
            return Err(CoreError::InvalidConfig(format!(
                "speeds must rank high > medium > low, got {}/{}/{}",
                s.high, s.medium, s.low
            )));
        }
        Ok(())
    }

    pub fn speed_kmh(&self, priority: Priority) -> f64 {
        match priority {
            Priority::High => self.speeds_kmh.high,
            Priority::Medium => self.speeds_kmh.medium,
            Priority::Low => self.speeds_kmh.low,
        }
    }

    /// Angular step for one tick of `tick_secs`.
    pub fn step_degrees(&self, priority: Priority, tick_secs: f64) -> f64 {
        self.speed_kmh(priority) / self.km_per_degree * (tick_secs / 3600.0) * self.time_scale
    }

    /// Wall-clock time to cover `distance_km` at the priority's speed.
    pub fn travel_time_ms(&self, priority: Priority, distance_km: f64) -> u64 {
        let hours = distance_km / (self.speed_kmh(priority) * self.time_scale);
        (hours * 3_600_000.0).max(0.0).round() as u64
    }
}

/// Percentage of the route covered, rounded and clamped to [0, 100].
pub fn progress_percent(total_km: f64, remaining_km: f64) -> u8 {
    if total_km <= 0.0 {
        return 100;
    }
    ((total_km - remaining_km) / total_km * 100.0)
        .clamp(0.0, 100.0)
        .round() as u8
}

/// Advances `shipment` by one tick.
///
/// Returns `Ok(true)` if location, progress or status changed, `Ok(false)`
/// for terminal shipments and converged no-op ticks.
///
/// # Errors
/// `InvalidTickInterval` if `tick_secs` is not a positive finite number.
pub fn advance(
    shipment: &mut Shipment,
    tick_secs: f64,
    now_ms: u64,
    config: &MovementConfig,
) -> Result<bool, CoreError> {
    if !(tick_secs.is_finite() && tick_secs > 0.0) {
        return Err(CoreError::InvalidTickInterval(tick_secs));
    }
    if shipment.status != Status::InTransit {
        return Ok(false);
    }
    if shipment.total_distance_km <= 0.0 {
        shipment.deliver(now_ms);
        return Ok(true);
    }

    let mut changed = false;
    let target = shipment.destination.location;
    let d_lat = target.lat - shipment.location.lat;
    let d_lng = target.lng - shipment.location.lng;
    let gap = d_lat.hypot(d_lng);

    if gap > config.tolerance_deg {
        let step = config.step_degrees(shipment.priority, tick_secs);
        shipment.location = if step >= gap {
            target
        } else {
            Coordinate {
                lat: shipment.location.lat + d_lat / gap * step,
                lng: shipment.location.lng + d_lng / gap * step,
            }
        };
        shipment.last_update_ms = now_ms;
        changed = true;
    }

    let remaining_km = haversine_km(shipment.location, target);
    let progress = progress_percent(shipment.total_distance_km, remaining_km).max(shipment.progress);

    if progress != shipment.progress {
        let previous = shipment.progress;
        shipment.progress = progress;
        shipment.last_update_ms = now_ms;
        changed = true;

        for milestone in MILESTONES {
            if previous < milestone
                && milestone <= progress
                && !shipment.history.has_milestone(milestone)
            {
                shipment.record_milestone(milestone, now_ms, remaining_km);
            }
        }
    }

    if remaining_km < config.arrival_threshold_km || gap <= config.tolerance_deg {
        shipment.deliver(now_ms);
        changed = true;
    }

    Ok(changed)
}
