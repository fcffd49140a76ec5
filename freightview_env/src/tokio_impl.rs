//! Production implementations backed by Tokio.

use crate::{EnvError, FreightViewContext, SnapshotSink};
use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::broadcast;

/// Production context backed by Tokio and OS entropy.
///
/// This is the "real" implementation used when the tracker serves live
/// viewers. Time comes from the system clock, randomness from the OS.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FreightViewContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let _name = name.to_string(); // Would be used for tracing
        tokio::spawn(async move {
            future.await;
        });
    }

    fn rng(&self, _stream: u64) -> ChaCha8Rng {
        // In production every stream is independently entropy-seeded
        ChaCha8Rng::from_entropy()
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}

/// Snapshot sink that fans out to any number of live subscribers.
///
/// Wraps a `tokio::sync::broadcast` channel. Slow subscribers that fall more
/// than `capacity` snapshots behind observe a lag error on their side and
/// skip ahead; the publisher never blocks.
pub struct BroadcastSink<T> {
    /// Sending half, cloned into new subscriptions
    tx: broadcast::Sender<Arc<T>>,
}

impl<T> BroadcastSink<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a sink buffering up to `capacity` snapshots per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Attaches a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl<T> SnapshotSink<T> for BroadcastSink<T>
where
    T: Send + Sync + 'static,
{
    async fn publish(&self, snapshot: Arc<T>) -> Result<(), EnvError> {
        // A send with no receivers is not a failure: nobody is watching yet
        let _ = self.tx.send(snapshot);
        Ok(())
    }

    fn name(&self) -> &str {
        "broadcast"
    }

    fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
