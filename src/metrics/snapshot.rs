//! One-off collection through the regular collector lifecycle.

use crate::client::RecordingClient;
use crate::config::CollectionParameters;
use crate::error::Result;
use crate::metrics::collector::Collector;
use crate::metrics::data::Snapshot;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Run the system resources against an in-memory client for `window`, stop
/// them, and return what they emitted.
///
/// Every resource samples once per `window`, so each contributes at least
/// one reading.
pub async fn take_snapshot(window: Duration, extended: bool) -> Result<Snapshot> {
    let parameters = CollectionParameters::default()
        .with_extended(extended)
        .with_interval(window);
    parameters.validate()?;

    let recorder = Arc::new(RecordingClient::new());
    let mut collector = Collector::with_system_resources(recorder.clone(), &parameters)?;

    collector.start().await?;
    // Wait past the first tick so slower resources still report.
    tokio::time::sleep(window + window / 2).await;
    collector.stop().await?;

    let metrics = recorder.take();
    debug!(count = metrics.len(), "Snapshot collected");
    Ok(Snapshot::from_metrics(metrics, window))
}
