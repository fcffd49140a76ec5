//! FreightView Simulation Harness
//!
//! Runs the shipment tracker against either the wall clock (serve mode) or
//! a virtual clock (headless mode), with broadcast viewers and optional JSON
//! file persistence attached.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Harness                            │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │ Context: SimContext (virtual) | TokioContext (wall)  │   │
//! │  └──────────────────────────────────────────────────────┘   │
//! │                             │                               │
//! │  ┌───────────┐        ┌─────▼─────┐                         │
//! │  │ Scheduler │──tick─►│  Tracker  │                         │
//! │  └───────────┘        └─────┬─────┘                         │
//! │                  Arc<Snapshot> per mutation                 │
//! │              ┌──────────────┴──────────────┐                │
//! │        ┌─────▼──────┐               ┌──────▼──────┐         │
//! │        │ Broadcast  │               │ JsonFileStore│        │
//! │        └─────┬──────┘               └─────────────┘         │
//! │     ┌────────┼────────┐                                     │
//! │  Viewer 1 Viewer 2   ...                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use freightview_sim::{run_headless, SimConfig};
//!
//! let report = run_headless(&SimConfig::default(), 1_000, 2).await?;
//! println!("{} delivered", report.delivered.len());
//! ```

mod config;
mod context;
mod error;
mod persistence;
mod runner;
mod samples;
mod viewer;

pub use config::SimConfig;
pub use context::SimContext;
pub use error::SimError;
pub use persistence::JsonFileStore;
pub use runner::{run_headless, Harness, HeadlessReport};
pub use samples::seed_samples;
pub use viewer::{live_line, run_viewer, spawn_viewer, ViewerState};
