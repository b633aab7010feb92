//! Runtime Module
//!
//! Wall-clock plumbing around the engine (non-deterministic).
//!
//! - `driver`: tokio task that advances an engine in real time

pub mod driver;

pub use driver::{DriverConfig, DriverError, RoundDriver, RoundDriverHandle};
