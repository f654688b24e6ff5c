//! Data structures for emitted metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// The statsd type of a metric point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Monotonic increment, `|c`
    Counter,
    /// Point-in-time value, `|g`
    Gauge,
    /// Duration in milliseconds, `|ms`
    Timer,
}

impl MetricKind {
    /// The statsd type suffix for this kind.
    pub fn statsd_suffix(&self) -> &'static str {
        match self {
            MetricKind::Counter => "c",
            MetricKind::Gauge => "g",
            MetricKind::Timer => "ms",
        }
    }
}

/// A single named measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Dotted metric name, relative to whatever namespace emits it
    pub name: String,
    /// Measured value
    pub value: f64,
    /// How the value should be interpreted by the aggregator
    pub kind: MetricKind,
}

impl Metric {
    /// Create a gauge point.
    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            kind: MetricKind::Gauge,
        }
    }

    /// Create a counter point.
    pub fn counter(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            kind: MetricKind::Counter,
        }
    }

    /// Create a timer point from a duration, recorded in milliseconds.
    pub fn timer(name: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            name: name.into(),
            value: elapsed.as_secs_f64() * 1000.0,
            kind: MetricKind::Timer,
        }
    }

    /// Return this metric with `prefix.` prepended to its name.
    ///
    /// An empty prefix leaves the name untouched.
    pub fn prefixed(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('.');
        if !prefix.is_empty() {
            self.name = format!("{}.{}", prefix, self.name);
        }
        self
    }
}

/// Metrics gathered during a one-off collection window, grouped by resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unix timestamp in milliseconds at which the window closed
    pub timestamp: i64,
    /// Length of the collection window in milliseconds
    pub window_ms: u64,
    /// Metrics keyed by the resource that emitted them, names relative to it
    pub resources: BTreeMap<String, Vec<Metric>>,
}

impl Snapshot {
    /// Group fully-qualified metrics by their first name segment.
    pub fn from_metrics(metrics: Vec<Metric>, window: Duration) -> Self {
        let mut resources: BTreeMap<String, Vec<Metric>> = BTreeMap::new();
        for metric in metrics {
            let (resource, rest) = match metric.name.split_once('.') {
                Some((resource, rest)) => (resource.to_string(), rest.to_string()),
                None => (String::new(), metric.name.clone()),
            };
            resources.entry(resource).or_default().push(Metric {
                name: rest,
                ..metric
            });
        }

        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            window_ms: window.as_millis() as u64,
            resources,
        }
    }

    /// Total number of metric points in the snapshot.
    pub fn len(&self) -> usize {
        self.resources.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Share of `part` in `total` as a percentage (0.0 to 100.0).
pub fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_names() {
        let metric = Metric::gauge("percent", 12.5).prefixed("host1.cpu");
        assert_eq!(metric.name, "host1.cpu.percent");

        let metric = Metric::gauge("percent", 12.5).prefixed("");
        assert_eq!(metric.name, "percent");

        let metric = Metric::gauge("percent", 12.5).prefixed("host1.");
        assert_eq!(metric.name, "host1.percent");
    }

    #[test]
    fn test_timer_in_milliseconds() {
        let metric = Metric::timer("tick", Duration::from_millis(1500));
        assert_eq!(metric.kind, MetricKind::Timer);
        assert!((metric.value - 1500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(10, 0), 0.0);
    }

    #[test]
    fn test_snapshot_grouping() {
        let metrics = vec![
            Metric::gauge("cpu.percent", 10.0),
            Metric::gauge("memory.used", 2048.0),
            Metric::gauge("memory.swap.used", 0.0),
        ];
        let snapshot = Snapshot::from_metrics(metrics, Duration::from_secs(1));

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.window_ms, 1000);
        assert_eq!(snapshot.resources["cpu"][0].name, "percent");
        assert_eq!(snapshot.resources["memory"][1].name, "swap.used");
    }
}
