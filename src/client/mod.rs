//! Metrics transport clients.
//!
//! A [`MetricsClient`] accepts metric points and forwards them somewhere: a
//! statsd daemon over UDP ([`StatsdClient`]), a parent client under a name
//! prefix ([`Namespaced`]), or an in-memory buffer ([`RecordingClient`]).

pub mod memory;
pub mod namespace;
pub mod statsd;

pub use memory::RecordingClient;
pub use namespace::Namespaced;
pub use statsd::StatsdClient;

use crate::error::Result;
use crate::metrics::data::Metric;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Emitter of counters, gauges and timers.
///
/// Implementations must be safe to share between the collector and the
/// resources it hands namespaced children to.
#[async_trait]
pub trait MetricsClient: Send + Sync {
    /// Queue a single metric point for delivery.
    async fn emit(&self, metric: Metric) -> Result<()>;

    /// Force any buffered metrics out.
    async fn flush(&self) -> Result<()>;

    /// Record a point-in-time value.
    async fn gauge(&self, name: &str, value: f64) -> Result<()> {
        self.emit(Metric::gauge(name, value)).await
    }

    /// Add `value` to a counter.
    async fn count(&self, name: &str, value: f64) -> Result<()> {
        self.emit(Metric::counter(name, value)).await
    }

    /// Increment a counter by one.
    async fn incr(&self, name: &str) -> Result<()> {
        self.count(name, 1.0).await
    }

    /// Record a duration in milliseconds.
    async fn timing(&self, name: &str, elapsed: Duration) -> Result<()> {
        self.emit(Metric::timer(name, elapsed)).await
    }
}

#[async_trait]
impl<T: MetricsClient + ?Sized> MetricsClient for Arc<T> {
    async fn emit(&self, metric: Metric) -> Result<()> {
        (**self).emit(metric).await
    }

    async fn flush(&self) -> Result<()> {
        (**self).flush().await
    }
}
