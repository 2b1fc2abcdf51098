//! Block cadence observation for blockpulse.
//!
//! This crate is the monitor's core: it turns a stream of
//! (height, timestamp) status snapshots into per-block duration
//! observations, attributes each one to the validator that proposed the
//! block, and keeps rolling and lifetime latency statistics — globally
//! and per proposer. Rendering lives in [`report`]; all chain I/O goes
//! through the [`pulse_chain::ChainSource`] boundary.

pub mod directory;
pub mod monitor;
pub mod report;
pub mod stats;

pub use directory::{ValidatorDirectory, UNKNOWN_LABEL};
pub use monitor::{BlockMonitor, MonitorConfig, Observation};
pub use stats::{CadenceBook, CadenceStats, SlidingWindow, StatsConfig};
