//! Sample fleet for a fresh data file.
//!
//! Five shipments in transit, two already delivered and one cancelled, so a
//! new viewer has something to look at in every status.

use freightview_core::{CoreError, CreateShipment, Priority, Tracker};
use freightview_env::FreightViewContext;
use tracing::info;

struct Sample {
    name: &'static str,
    origin: &'static str,
    destination: &'static str,
    customer: &'static str,
    weight_kg: f64,
    priority: Priority,
}

impl Sample {
    fn request(&self) -> CreateShipment {
        CreateShipment::new(self.name, self.origin, self.destination)
            .customer(self.customer)
            .weight_kg(self.weight_kg)
            .priority(self.priority)
    }
}

const IN_TRANSIT: &[Sample] = &[
    Sample {
        name: "Premium Electronics Shipment",
        origin: "Tokyo",
        destination: "New York",
        customer: "John Smith",
        weight_kg: 15.5,
        priority: Priority::High,
    },
    Sample {
        name: "Medical Equipment Delivery",
        origin: "Berlin",
        destination: "Sydney",
        customer: "Dr. Sarah Johnson",
        weight_kg: 8.2,
        priority: Priority::High,
    },
    Sample {
        name: "Fashion Collection",
        origin: "Paris",
        destination: "Los Angeles",
        customer: "Emily Davis",
        weight_kg: 12.0,
        priority: Priority::Medium,
    },
    Sample {
        name: "Automotive Parts",
        origin: "Munich",
        destination: "Shanghai",
        customer: "Michael Brown",
        weight_kg: 25.8,
        priority: Priority::Medium,
    },
    Sample {
        name: "Pharmaceutical Supplies",
        origin: "Zurich",
        destination: "Mumbai",
        customer: "Dr. Jennifer Lee",
        weight_kg: 5.5,
        priority: Priority::High,
    },
];

const DELIVERED: &[Sample] = &[
    Sample {
        name: "Luxury Watch Collection",
        origin: "Geneva",
        destination: "Hong Kong",
        customer: "Amanda Anderson",
        weight_kg: 2.1,
        priority: Priority::High,
    },
    Sample {
        name: "Art Masterpiece",
        origin: "London",
        destination: "Dubai",
        customer: "Robert Wilson",
        weight_kg: 18.3,
        priority: Priority::High,
    },
];

const CANCELLED: &[Sample] = &[Sample {
    name: "Industrial Machinery",
    origin: "Chicago",
    destination: "São Paulo",
    customer: "TechCorp Ltd",
    weight_kg: 145.2,
    priority: Priority::Low,
}];

/// Creates the sample fleet through the tracker's public operations.
///
/// Delivered samples are settled to completion, so their history carries
/// the same milestones a live shipment would.
pub async fn seed_samples<Ctx: FreightViewContext>(tracker: &Tracker<Ctx>) -> Result<usize, CoreError> {
    for sample in IN_TRANSIT {
        tracker.create_shipment(&sample.request()).await?;
    }
    for sample in DELIVERED {
        let id = tracker.create_shipment(&sample.request()).await?.id();
        tracker.settle_shipment(id).await?;
    }
    for sample in CANCELLED {
        let id = tracker.create_shipment(&sample.request()).await?.id();
        tracker.cancel_shipment(id).await?;
    }

    info!(
        "Created {} In Transit, {} Delivered, {} Cancelled sample shipments",
        IN_TRANSIT.len(),
        DELIVERED.len(),
        CANCELLED.len()
    );
    Ok(IN_TRANSIT.len() + DELIVERED.len() + CANCELLED.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimContext;
    use freightview_core::{CityCatalog, Status, TrackerConfig};
    use freightview_env::SequentialIds;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sample_fleet_covers_every_status() {
        let tracker = Tracker::new(
            SimContext::shared(42),
            TrackerConfig::default(),
            Arc::new(CityCatalog::world()),
            Arc::new(SequentialIds::new()),
        )
        .unwrap();

        assert_eq!(seed_samples(&tracker).await.unwrap(), 8);

        let stats = tracker.compute_stats();
        assert_eq!(stats.total, 8);
        assert_eq!(stats.by_status.in_transit, 5);
        assert_eq!(stats.by_status.delivered, 2);
        assert_eq!(stats.by_status.cancelled, 1);
        assert_eq!(stats.by_priority.high, 5);
        assert_eq!(stats.by_priority.low, 1);

        let watch = tracker.list_shipments().into_iter().find(|s| s.name() == "Luxury Watch Collection").unwrap();
        assert_eq!(watch.status(), Status::Delivered);
        assert_eq!(watch.location(), watch.destination().location);
    }
}
