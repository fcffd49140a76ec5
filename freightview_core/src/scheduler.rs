//! Fixed-cadence driver for a [`Tracker`].
//!
//! The scheduler sleeps through the context, so under a simulated clock a
//! run of thousands of ticks completes instantly while under Tokio it paces
//! itself to the wall clock.

use freightview_env::{FreightViewContext, ShipmentId};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::tracker::{TickReport, Tracker};

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    /// Shipments delivered during the run, in delivery order
    pub delivered: Vec<ShipmentId>,
    /// Sequence of the last snapshot a tick published (0 if none did)
    pub last_sequence: u64,
}

impl RunSummary {
    fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.delivered.extend_from_slice(&report.delivered);
        if let Some(sequence) = report.published {
            self.last_sequence = sequence;
        }
    }
}

pub struct Scheduler<Ctx: FreightViewContext> {
    tracker: Arc<Tracker<Ctx>>,
}

impl<Ctx: FreightViewContext> Scheduler<Ctx> {
    pub fn new(tracker: Arc<Tracker<Ctx>>) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &Arc<Tracker<Ctx>> {
        &self.tracker
    }

    async fn wait_interval(&self) {
        let interval = self.tracker.config().tick_interval;
        self.tracker.context().sleep(interval).await;
    }

    async fn tick(&self) -> Result<TickReport, CoreError> {
        let report = self.tracker.tick().await?;
        if !report.delivered.is_empty() {
            debug!("Tick {}: {} delivered", report.tick, report.delivered.len());
        }
        Ok(report)
    }

    /// Runs exactly `ticks` ticks.
    pub async fn run_ticks(&self, ticks: u64) -> Result<RunSummary, CoreError> {
        let mut summary = RunSummary::default();
        for _ in 0..ticks {
            self.wait_interval().await;
            let report = self.tick().await?;
            summary.record(&report);
        }
        info!("Ran {} ticks, {} deliveries", summary.ticks, summary.delivered.len());
        Ok(summary)
    }

    /// Ticks until `shutdown` resolves.
    ///
    /// Shutdown is only observed while waiting for the next tick, so a tick
    /// that has started always completes and publishes.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunSummary, CoreError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut summary = RunSummary::default();
        info!(
            "Scheduler started ({:?} per tick, seed {})",
            self.tracker.config().tick_interval,
            self.tracker.context().seed()
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.wait_interval() => {}
            }
            let report = self.tick().await?;
            summary.record(&report);
        }

        info!(
            "Scheduler stopped after {} ticks, {} deliveries",
            summary.ticks,
            summary.delivered.len()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::tests::{tracker, ManualContext};
    use crate::validation::CreateShipment;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_ticks_advances_clock_and_counts() {
        let ctx = ManualContext::shared();
        let start = ctx.now();
        let scheduler = Scheduler::new(Arc::new(tracker(ctx.clone())));
        scheduler
            .tracker()
            .create_shipment(&CreateShipment::new("A", "Paris", "Rome"))
            .await
            .unwrap();

        let summary = scheduler.run_ticks(10).await.unwrap();

        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.last_sequence, 11);
        assert_eq!(scheduler.tracker().tick_count(), 10);
        assert_eq!(ctx.now() - start, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let ctx = ManualContext::shared();
        let scheduler = Scheduler::new(Arc::new(tracker(ctx)));

        let summary = scheduler.run_until(async {}).await.unwrap();

        assert_eq!(summary.ticks, 0);
    }

    #[tokio::test]
    async fn test_run_until_ticks_until_signalled() {
        let ctx = ManualContext::shared();
        let scheduler = Scheduler::new(Arc::new(tracker(ctx)));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let tracker = Arc::clone(scheduler.tracker());

        let watcher = tokio::spawn(async move {
            while tracker.tick_count() < 5 {
                tokio::task::yield_now().await;
            }
            let _ = tx.send(());
        });

        let summary = scheduler
            .run_until(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        watcher.await.unwrap();

        assert!(summary.ticks >= 5);
    }
}
