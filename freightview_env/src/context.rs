//! Core environment context trait for FreightView services.

use async_trait::async_trait;
use rand_chacha::ChaCha8Rng;
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that the FreightView engine can
/// run against the wall clock in production and against a virtual clock in
/// the simulation harness.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, entropy-seeded RNG
/// - **Simulation**: `SimContext` - manually advanced clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// Every source of non-determinism the engine touches (time, randomness)
/// goes through this trait, so a seeded context replays a run exactly.
#[async_trait]
pub trait FreightViewContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Used for scheduler timing and duration measurements.
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used for shipment timestamps.
    ///
    /// In simulation, this is derived from virtual clock + epoch offset.
    fn system_time(&self) -> SystemTime;

    /// Returns the wall-clock time as Unix milliseconds.
    ///
    /// Clocks set before the Unix epoch report 0.
    fn timestamp_ms(&self) -> u64 {
        self.system_time()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Returns an RNG for the given stream.
    ///
    /// Seeded contexts derive each stream from the master seed, so two
    /// streams never share a sequence but both replay identically.
    ///
    /// # Arguments
    /// * `stream` - A value to combine with the global seed
    fn rng(&self, stream: u64) -> ChaCha8Rng;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
