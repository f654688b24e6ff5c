//! System metrics collection.
//!
//! This module defines the [`Resource`] contract, the [`Collector`] that
//! drives a set of resources through start and stop, and the cpu, memory and
//! disk samplers the agent registers.

pub mod collector;
pub mod cpu;
pub mod data;
pub mod disk;
pub mod memory;
pub mod resource;
pub mod snapshot;
pub mod traits;

// Re-export commonly used items
pub use collector::{Collector, CollectorState};
pub use data::{Metric, MetricKind, Snapshot};
pub use resource::PeriodicResource;
pub use snapshot::take_snapshot;
pub use traits::{Resource, Sampler};
