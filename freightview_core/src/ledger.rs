//! Per-shipment append-only event history.
//!
//! The ledger is both the audit trail shown to viewers and the idempotency
//! guard for milestone events: before a milestone is recorded the engine
//! asks the ledger whether it already holds one for that percentage.

use serde::{Deserialize, Serialize};

use crate::geodesy::Coordinate;
use crate::shipment::Status;

/// Progress percentages that earn a milestone event.
pub const MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// What an event records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Dispatched,
    Milestone { percent: u8 },
    Delivered,
    Cancelled { previous: Status, progress: u8 },
}

/// One entry in a shipment's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unix milliseconds
    pub timestamp_ms: u64,

    pub kind: EventKind,

    /// Human readable summary, e.g. "Journey 50% complete"
    pub description: String,

    /// Where the shipment was when the event happened
    pub location: Coordinate,

    /// Shipment status at the time of the event
    pub status: Status,

    /// Free-form details (customer, remaining distance, ...)
    pub details: String,
}

/// Ordered, append-only list of events.
///
/// Entries are never edited or removed once recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    events: Vec<Event>,
}

impl History {
    /// Appends an event.
    ///
    /// Timestamps never go backwards within a history: an event stamped
    /// earlier than its predecessor (wall clock stepped back) is re-stamped
    /// with the predecessor's time.
    pub(crate) fn append(&mut self, mut event: Event) {
        if let Some(last) = self.events.last() {
            event.timestamp_ms = event.timestamp_ms.max(last.timestamp_ms);
        }
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// True if a milestone for `percent` has already been recorded.
    pub fn has_milestone(&self, percent: u8) -> bool {
        self.events
            .iter()
            .any(|e| e.kind == EventKind::Milestone { percent })
    }

    /// Recorded milestone percentages in order.
    pub fn milestones(&self) -> impl Iterator<Item = u8> + '_ {
        self.events.iter().filter_map(|e| match e.kind {
            EventKind::Milestone { percent } => Some(percent),
            _ => None,
        })
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&EventKind) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.kind)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(timestamp_ms: u64, kind: EventKind) -> Event {
        Event {
            timestamp_ms,
            kind,
            description: String::new(),
            location: Coordinate { lat: 0.0, lng: 0.0 },
            status: Status::InTransit,
            details: String::new(),
        }
    }

    #[test]
    fn test_append_preserves_order() {
        let mut history = History::default();
        history.append(event(10, EventKind::Dispatched));
        history.append(event(20, EventKind::Milestone { percent: 25 }));

        assert_eq!(history.len(), 2);
        assert_eq!(history.first().unwrap().kind, EventKind::Dispatched);
        assert_eq!(history.last().unwrap().timestamp_ms, 20);
    }

    #[test]
    fn test_timestamps_never_go_backwards() {
        let mut history = History::default();
        history.append(event(100, EventKind::Dispatched));
        history.append(event(50, EventKind::Milestone { percent: 25 }));

        assert_eq!(history.last().unwrap().timestamp_ms, 100);
    }

    #[test]
    fn test_milestone_lookup() {
        let mut history = History::default();
        history.append(event(0, EventKind::Dispatched));
        history.append(event(1, EventKind::Milestone { percent: 25 }));
        history.append(event(2, EventKind::Milestone { percent: 50 }));

        assert!(history.has_milestone(25));
        assert!(history.has_milestone(50));
        assert!(!history.has_milestone(75));
        assert_eq!(history.milestones().collect::<Vec<_>>(), vec![25, 50]);
        assert_eq!(history.count(|k| matches!(k, EventKind::Milestone { .. })), 2);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let mut history = History::default();
        history.append(event(5, EventKind::Cancelled { previous: Status::InTransit, progress: 40 }));

        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["kind"]["type"], "cancelled");
        assert_eq!(json[0]["kind"]["previous"], "In Transit");
        assert_eq!(json[0]["timestampMs"], 5);
    }
}
