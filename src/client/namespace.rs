//! Name-prefixing client wrapper.

use super::MetricsClient;
use crate::error::Result;
use crate::metrics::data::Metric;
use async_trait::async_trait;
use std::sync::Arc;

/// A client that prefixes every metric name with `prefix.` and delegates
/// transmission and flushing to its parent.
///
/// Wrappers nest: a `Namespaced` around another `Namespaced` yields
/// `outer.inner.name`.
#[derive(Clone)]
pub struct Namespaced {
    parent: Arc<dyn MetricsClient>,
    prefix: String,
}

impl Namespaced {
    pub fn new(parent: Arc<dyn MetricsClient>, prefix: impl Into<String>) -> Self {
        Self {
            parent,
            prefix: prefix.into(),
        }
    }

    /// The prefix applied to emitted names.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl std::fmt::Debug for Namespaced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespaced")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetricsClient for Namespaced {
    async fn emit(&self, metric: Metric) -> Result<()> {
        self.parent.emit(metric.prefixed(&self.prefix)).await
    }

    async fn flush(&self) -> Result<()> {
        self.parent.flush().await
    }
}
