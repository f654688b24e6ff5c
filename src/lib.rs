//! # system-stats - host metrics agent
//!
//! Periodically samples CPU, memory and disk utilization and forwards the
//! readings to a statsd daemon over UDP.
//!
//! ## Features
//!
//! - **Independent resources**: each sampler runs on its own interval and task
//! - **Namespacing**: metrics land under `<namespace>.<resource>.<metric>`
//! - **Graceful shutdown**: resources stop concurrently, then one final flush
//! - **Library + Binary**: embed the [`Collector`] or run `system-stats`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use system_stats::{CollectionParameters, Collector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let parameters = CollectionParameters::new("host1").with_statsd_address("127.0.0.1:8125");
//!     let mut collector = Collector::from_parameters(&parameters).await?;
//!
//!     collector.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     collector.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod shutdown;

use std::time::Duration;

// Re-export public API
pub use client::{MetricsClient, Namespaced, RecordingClient, StatsdClient};
pub use config::CollectionParameters;
pub use error::{Result, StatsError};
pub use metrics::{
    collector::{Collector, CollectorState},
    data::{Metric, MetricKind, Snapshot},
    resource::PeriodicResource,
    traits::{Resource, Sampler},
};

/// The default statsd address
pub const DEFAULT_STATSD_ADDRESS: &str = ":8125";

/// The default memory sampling interval
pub const DEFAULT_MEMORY_INTERVAL: Duration = Duration::from_secs(10);

/// The default cpu sampling interval
pub const DEFAULT_CPU_INTERVAL: Duration = Duration::from_secs(5);

/// The default disk sampling interval
pub const DEFAULT_DISK_INTERVAL: Duration = Duration::from_secs(30);
