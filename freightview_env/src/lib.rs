//! FreightView Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the FreightView
//! engine to run against the **Production** clock (tokio) or a **Simulated**
//! clock without changing a line of engine code.
//!
//! # Core Concept: Everything the engine consumes is injected
//!
//! - Time (`now()`, `system_time()`, `sleep()`)
//! - Randomness (`rng(stream)`)
//! - Shipment ids (`IdGenerator`)
//! - Snapshot publication (`SnapshotSink`)
//!
//! By deriving all entropy from a single 64-bit seed, any simulation run
//! becomes reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use freightview_env::{FreightViewContext, SnapshotSink};
//!
//! async fn scheduler_loop<Ctx: FreightViewContext>(ctx: &Ctx, interval: Duration) {
//!     loop {
//!         ctx.sleep(interval).await;
//!         tick();
//!     }
//! }
//! ```

mod context;
mod sink;
mod types;
mod error;
mod tokio_impl;

pub use context::FreightViewContext;
pub use sink::SnapshotSink;
pub use types::{IdGenerator, ParseShipmentIdError, SequentialIds, ShipmentId};
pub use error::EnvError;
pub use tokio_impl::{BroadcastSink, TokioContext};
