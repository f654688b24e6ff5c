//! Traits for resources and the samplers that drive them.

use crate::client::MetricsClient;
use crate::error::Result;
use crate::metrics::data::Metric;
use async_trait::async_trait;

/// A named, independently scheduled source of metrics.
///
/// A resource moves through `Created -> Started -> Stopped` exactly once.
/// It owns the client handed to it by [`Resource::start`] and is the only
/// writer to it.
#[async_trait]
pub trait Resource: Send + 'static {
    /// Stable identifier used for namespacing and logging.
    fn name(&self) -> &str;

    /// Launch the resource's own sampling schedule and return without
    /// waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot begin sampling, e.g. the
    /// underlying OS query cannot be initialized or it was already started.
    async fn start(&mut self, client: Box<dyn MetricsClient>) -> Result<()>;

    /// Halt the schedule and wait until no further metric can be emitted.
    ///
    /// # Errors
    ///
    /// An error reports an unclean shutdown; the resource must still not
    /// emit after this returns.
    async fn stop(&mut self) -> Result<()>;
}

/// One OS query, turned into metric points relative to the resource name.
pub trait Sampler: Send + 'static {
    /// Name of the resource this sampler feeds.
    fn name(&self) -> &'static str;

    /// Initialize OS handles before the first sample.
    ///
    /// Called once when the owning resource starts.
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    /// Take one reading.
    fn sample(&mut self) -> Result<Vec<Metric>>;
}
