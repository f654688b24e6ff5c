//! In-memory client that keeps everything it is sent.

use super::MetricsClient;
use crate::error::Result;
use crate::metrics::data::Metric;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records emitted metrics and counts flushes instead of sending anything.
///
/// Backs the `snapshot` command and serves as a sink when embedding the
/// collector without a statsd daemon.
#[derive(Debug, Default)]
pub struct RecordingClient {
    metrics: Mutex<Vec<Metric>>,
    flushes: AtomicUsize,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// All metrics received so far, in arrival order.
    pub fn metrics(&self) -> Vec<Metric> {
        self.lock().clone()
    }

    /// Names of all metrics received so far, in arrival order.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|m| m.name.clone()).collect()
    }

    /// Remove and return everything received so far.
    pub fn take(&self) -> Vec<Metric> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of times `flush` has been called.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Metric>> {
        // A panic while holding the lock cannot leave the Vec half-written.
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MetricsClient for RecordingClient {
    async fn emit(&self, metric: Metric) -> Result<()> {
        self.lock().push(metric);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_records_in_order() {
        let client = RecordingClient::new();
        client.gauge("a", 1.0).await.unwrap();
        client.count("b", 2.0).await.unwrap();
        client.timing("c", Duration::from_millis(3)).await.unwrap();

        assert_eq!(client.names(), vec!["a", "b", "c"]);
        assert_eq!(client.flush_count(), 0);

        let taken = client.take();
        assert_eq!(taken.len(), 3);
        assert!(client.is_empty());
    }
}
