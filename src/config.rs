//! Collection configuration.

use crate::client::statsd::normalize_address;
use crate::error::{Result, StatsError};
use std::time::Duration;

/// Settings consumed once when the collector is built.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionParameters {
    /// statsd `host:port`; `:port` means the local host
    pub statsd_address: String,
    /// Root prefix for every metric, usually the host name
    pub namespace: String,
    /// Emit the extended cpu and memory metrics
    pub extended: bool,
    /// How often memory is sampled
    pub memory_interval: Duration,
    /// How often cpu is sampled
    pub cpu_interval: Duration,
    /// How often disk usage is sampled
    pub disk_interval: Duration,
    /// How long shutdown waits for resources before flushing anyway
    pub stop_timeout: Option<Duration>,
}

impl Default for CollectionParameters {
    fn default() -> Self {
        Self {
            statsd_address: crate::DEFAULT_STATSD_ADDRESS.to_string(),
            namespace: String::new(),
            extended: false,
            memory_interval: crate::DEFAULT_MEMORY_INTERVAL,
            cpu_interval: crate::DEFAULT_CPU_INTERVAL,
            disk_interval: crate::DEFAULT_DISK_INTERVAL,
            stop_timeout: None,
        }
    }
}

impl CollectionParameters {
    /// Create parameters with default intervals under the given namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_statsd_address(mut self, address: impl Into<String>) -> Self {
        self.statsd_address = address.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    pub fn with_memory_interval(mut self, interval: Duration) -> Self {
        self.memory_interval = interval;
        self
    }

    pub fn with_cpu_interval(mut self, interval: Duration) -> Self {
        self.cpu_interval = interval;
        self
    }

    pub fn with_disk_interval(mut self, interval: Duration) -> Self {
        self.disk_interval = interval;
        self
    }

    /// Set every sampling interval at once.
    pub fn with_interval(self, interval: Duration) -> Self {
        self.with_memory_interval(interval)
            .with_cpu_interval(interval)
            .with_disk_interval(interval)
    }

    pub fn with_stop_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// The statsd address with the `:port` shorthand expanded.
    pub fn statsd_socket_address(&self) -> String {
        normalize_address(&self.statsd_address)
    }

    /// Reject values the collector cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.statsd_address.trim().is_empty() {
            return Err(StatsError::config_error("statsd address must not be empty"));
        }

        for (name, interval) in [
            ("memory", self.memory_interval),
            ("cpu", self.cpu_interval),
            ("disk", self.disk_interval),
        ] {
            if interval.is_zero() {
                return Err(StatsError::config_error(format!(
                    "{} interval must be greater than zero",
                    name
                )));
            }
        }

        if self.stop_timeout.is_some_and(|t| t.is_zero()) {
            return Err(StatsError::config_error(
                "stop timeout must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Resolve the node name used as the root namespace.
///
/// The literal `hostname` is replaced by this machine's host name.
pub fn resolve_namespace(name: &str) -> Result<String> {
    if name == "hostname" {
        sysinfo::System::host_name()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| StatsError::config_error("Unable to determine host name"))
    } else {
        Ok(name.to_string())
    }
}
