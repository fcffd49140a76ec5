//! Snapshot viewers.
//!
//! A viewer stands in for a connected client: it consumes the broadcast
//! channel, keeps only the newest snapshot it has seen and logs a short
//! live-progress line for each one.

use freightview_core::{Shipment, Snapshot, Status};
use freightview_env::FreightViewContext;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Shipments listed in a live-progress line.
const LIVE_LINE_LIMIT: usize = 3;

/// What a viewer has observed so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewerState {
    pub name: String,
    pub last_sequence: Option<u64>,
    pub received: u64,
    pub stale: u64,
    pub lagged: u64,
    pub in_transit: usize,
}

impl ViewerState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Applies a snapshot unless it is older than one already applied.
    pub fn accept(&mut self, snapshot: &Snapshot) -> bool {
        if self.last_sequence.is_some_and(|last| snapshot.sequence <= last) {
            self.stale += 1;
            return false;
        }
        self.last_sequence = Some(snapshot.sequence);
        self.received += 1;
        self.in_transit = snapshot
            .shipments
            .iter()
            .filter(|s| s.status() == Status::InTransit)
            .count();
        true
    }
}

/// `PKG001:37% (John Smith), PKG002:12% (...)` for the first few in-transit shipments.
pub fn live_line(shipments: &[Shipment]) -> String {
    shipments
        .iter()
        .filter(|s| s.status() == Status::InTransit)
        .take(LIVE_LINE_LIMIT)
        .map(|s| format!("{}:{}% ({})", s.id(), s.progress(), s.customer()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Consumes snapshots until the channel closes.
pub async fn run_viewer(name: String, mut rx: broadcast::Receiver<Arc<Snapshot>>) -> ViewerState {
    let mut state = ViewerState::new(name);
    loop {
        match rx.recv().await {
            Ok(snapshot) => {
                if state.accept(&snapshot) && state.in_transit > 0 {
                    info!("[{}] Live update: {}", state.name, live_line(&snapshot.shipments));
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                state.lagged += skipped;
                warn!("[{}] Lagged behind, skipped {} snapshots", state.name, skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!(
        "[{}] Viewer closed after {} snapshots ({} stale, {} lagged)",
        state.name, state.received, state.stale, state.lagged
    );
    state
}

/// Spawns a viewer on the context; its final state arrives on the returned channel.
pub fn spawn_viewer<Ctx: FreightViewContext>(
    context: &Ctx,
    name: impl Into<String>,
    rx: broadcast::Receiver<Arc<Snapshot>>,
) -> oneshot::Receiver<ViewerState> {
    let name = name.into();
    let label = format!("viewer-{name}");
    let (tx, done) = oneshot::channel();
    context.spawn(&label, async move {
        let state = run_viewer(name, rx).await;
        let _ = tx.send(state);
    });
    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(sequence: u64) -> Snapshot {
        Snapshot {
            sequence,
            taken_at_ms: 0,
            shipments: Vec::new(),
        }
    }

    #[test]
    fn test_viewer_drops_stale_snapshots() {
        let mut state = ViewerState::new("v");

        assert!(state.accept(&snapshot(2)));
        assert!(!state.accept(&snapshot(1)));
        assert!(!state.accept(&snapshot(2)));
        assert!(state.accept(&snapshot(5)));

        assert_eq!(state.last_sequence, Some(5));
        assert_eq!(state.received, 2);
        assert_eq!(state.stale, 2);
    }

    #[tokio::test]
    async fn test_run_viewer_counts_lag() {
        let (tx, rx) = broadcast::channel(2);
        for seq in 1..=5 {
            tx.send(Arc::new(snapshot(seq))).unwrap();
        }
        drop(tx);

        let state = run_viewer("slow".into(), rx).await;

        assert_eq!(state.lagged, 3);
        assert_eq!(state.received, 2);
        assert_eq!(state.last_sequence, Some(5));
    }

    proptest! {
        #[test]
        fn prop_accepted_sequences_strictly_increase(
            sequences in prop::collection::vec(0u64..50, 0..100),
        ) {
            let mut state = ViewerState::new("v");
            let mut accepted = Vec::new();
            for seq in &sequences {
                if state.accept(&snapshot(*seq)) {
                    accepted.push(*seq);
                }
            }

            prop_assert!(accepted.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(state.received + state.stale, sequences.len() as u64);
            prop_assert_eq!(state.last_sequence, sequences.iter().copied().max());
        }
    }
}
