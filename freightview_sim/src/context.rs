//! Simulation context implementing FreightViewContext for deterministic runs.

use async_trait::async_trait;
use freightview_env::FreightViewContext;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Simulation context backed by a virtual clock and seeded RNG streams.
///
/// This implements `FreightViewContext` using:
/// - A virtual clock that only moves when advanced or slept on
/// - One `ChaCha8Rng` per stream, derived from the master seed
///
/// Clones share the clock.
#[derive(Clone)]
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<AtomicU64>,

    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(AtomicU64::new(0)),
            epoch: UNIX_EPOCH + Duration::from_secs(1704067200), // 2024-01-01 00:00:00 UTC
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        self.virtual_time_ns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FreightViewContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        // Sleeping advances virtual time, then lets other tasks run
        self.advance_time(duration);
        tokio::task::yield_now().await;
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tracing::debug!("Spawning sim task '{}'", name);
        tokio::spawn(future);
    }

    fn rng(&self, stream: u64) -> ChaCha8Rng {
        // Combine master seed with stream for an independent, replayable sequence
        let combined_seed = self.seed.wrapping_mul(0x517cc1b727220a95) ^ stream;
        ChaCha8Rng::seed_from_u64(combined_seed)
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
