//! Summary statistics over a shipment set.
//!
//! Always recomputed from the shipments themselves; nothing here is kept
//! between calls.

use serde::{Deserialize, Serialize};

use crate::shipment::{Priority, Shipment, Status};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub in_transit: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregate view of the fleet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    /// Arithmetic mean of `progress`, 0 for an empty fleet
    pub average_progress: f64,
    pub total_cities: usize,
    pub connected_clients: usize,
}

/// Computes stats in a single pass over `shipments`.
pub fn compute<'a>(
    shipments: impl IntoIterator<Item = &'a Shipment>,
    total_cities: usize,
    connected_clients: usize,
) -> Stats {
    let mut stats = Stats {
        total_cities,
        connected_clients,
        ..Stats::default()
    };
    let mut progress_sum: u64 = 0;

    for shipment in shipments {
        stats.total += 1;
        progress_sum += u64::from(shipment.progress());

        match shipment.status() {
            Status::InTransit => stats.by_status.in_transit += 1,
            Status::Delivered => stats.by_status.delivered += 1,
            Status::Cancelled => stats.by_status.cancelled += 1,
        }
        match shipment.priority() {
            Priority::High => stats.by_priority.high += 1,
            Priority::Medium => stats.by_priority.medium += 1,
            Priority::Low => stats.by_priority.low += 1,
        }
    }

    if stats.total > 0 {
        stats.average_progress = progress_sum as f64 / stats.total as f64;
    }
    stats
}
