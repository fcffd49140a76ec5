//! Snapshot sink abstraction for FreightView publishers.

use async_trait::async_trait;
use crate::error::EnvError;
use std::sync::Arc;

/// Abstraction for the "publish snapshot" side of the engine.
///
/// # Implementations
///
/// - **Broadcast**: `BroadcastSink` fans snapshots out to live viewers
/// - **Persistence**: `JsonFileStore` (in `freightview_sim`) writes them to disk
///
/// # Snapshot Flow
///
/// ```text
/// Tracker                    Sink                     Viewers
///   |                          |                         |
///   |-- publish(snapshot) ---->|                         |
///   |                          |-- clone Arc to each --->|
///   |                          |                         |-- recv() -> snapshot
/// ```
///
/// Publishing is fire-and-forget from the engine's point of view: an error is
/// logged by the caller and never rolls back the state that produced the
/// snapshot.
#[async_trait]
pub trait SnapshotSink<T>: Send + Sync + 'static
where
    T: Send + Sync + 'static,
{
    /// Publishes a full snapshot.
    ///
    /// # Returns
    /// * `Ok(())` - Snapshot handed off (delivery to every listener is not guaranteed)
    /// * `Err(EnvError)` - Immediate failure (closed channel, I/O error, ...)
    async fn publish(&self, snapshot: Arc<T>) -> Result<(), EnvError>;

    /// Short name for log lines.
    fn name(&self) -> &str;

    /// Number of listeners currently attached to this sink.
    ///
    /// Sinks without listeners (files, databases) report 0.
    fn subscriber_count(&self) -> usize {
        0
    }
}
