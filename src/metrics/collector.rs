//! Lifecycle coordination for a set of resources sharing one client.
//!
//! The [`Collector`] starts every registered resource in order, each under a
//! client namespaced by the resource name. Stopping fans out one task per
//! resource, waits for all of them, and only then flushes the root client, so
//! nothing a resource emitted before acknowledging its stop is left behind.

use crate::client::{MetricsClient, Namespaced, StatsdClient};
use crate::config::CollectionParameters;
use crate::error::{Result, StatsError};
use crate::metrics::{
    cpu::CpuSampler, disk::DiskSampler, memory::MemorySampler, resource::PeriodicResource,
    traits::Resource,
};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

/// Where the collector is in its one-way lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    NotStarted,
    Running,
    Stopped,
}

/// Owns the resources and the root client they report through.
pub struct Collector {
    resources: Vec<Box<dyn Resource>>,
    client: Arc<dyn MetricsClient>,
    state: CollectorState,
    stop_timeout: Option<Duration>,
}

impl Collector {
    /// Create an empty collector reporting through `client`.
    pub fn new(client: Arc<dyn MetricsClient>) -> Self {
        Self {
            resources: Vec::new(),
            client,
            state: CollectorState::NotStarted,
            stop_timeout: None,
        }
    }

    /// Dial statsd and register the memory, cpu and disk resources described
    /// by `parameters`.
    pub async fn from_parameters(parameters: &CollectionParameters) -> Result<Self> {
        parameters.validate()?;

        let statsd = StatsdClient::dial(&parameters.statsd_socket_address()).await?;
        info!(peer = %statsd.peer_addr(), namespace = %parameters.namespace, "Dialed statsd");

        let root = Namespaced::new(Arc::new(statsd), parameters.namespace.clone());
        Self::with_system_resources(Arc::new(root), parameters)
    }

    /// Register the memory, cpu and disk resources against an existing client.
    pub fn with_system_resources(
        client: Arc<dyn MetricsClient>,
        parameters: &CollectionParameters,
    ) -> Result<Self> {
        let mut collector = Self::new(client);
        collector.stop_timeout = parameters.stop_timeout;

        collector.add(PeriodicResource::new(
            MemorySampler::new(parameters.extended),
            parameters.memory_interval,
        ))?;
        collector.add(PeriodicResource::new(
            CpuSampler::new(parameters.extended),
            parameters.cpu_interval,
        ))?;
        collector.add(PeriodicResource::new(
            DiskSampler::new(),
            parameters.disk_interval,
        ))?;

        Ok(collector)
    }

    /// Give up on resources that have not stopped within `timeout`.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = Some(timeout);
        self
    }

    /// Register a resource. Only allowed before [`Collector::start`].
    pub fn add<R: Resource>(&mut self, resource: R) -> Result<()> {
        self.add_boxed(Box::new(resource))
    }

    pub fn add_boxed(&mut self, resource: Box<dyn Resource>) -> Result<()> {
        if self.state != CollectorState::NotStarted {
            return Err(StatsError::lifecycle_error(format!(
                "Cannot add {} after the collector has started",
                resource.name()
            )));
        }
        self.resources.push(resource);
        Ok(())
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Names of the registered resources, in start order.
    pub fn resource_names(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Start every resource in registration order, each with its own
    /// namespaced client.
    ///
    /// If a resource fails to start, the ones already running are stopped
    /// before its error is returned, and the collector ends up `Stopped`.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != CollectorState::NotStarted {
            return Err(StatsError::lifecycle_error(format!(
                "Collector cannot start from state {:?}",
                self.state
            )));
        }

        info!("Starting collector with {} resources", self.resources.len());

        for index in 0..self.resources.len() {
            let resource = &mut self.resources[index];
            let name = resource.name().to_string();
            info!(resource = %name, "Starting resource");

            let client = Namespaced::new(self.client.clone(), name.clone());
            let started = resource.start(Box::new(client)).await;
            if let Err(err) = started {
                error!(resource = %name, error = %err, "Failed to start resource");
                self.rollback(index).await;
                return Err(err);
            }
        }

        self.state = CollectorState::Running;
        Ok(())
    }

    /// Stop every resource concurrently, wait for all of them, then flush.
    ///
    /// Per-resource stop failures are logged and do not fail the call; the
    /// flush error, if any, is returned. With a stop timeout configured,
    /// resources that miss it are abandoned and reported as
    /// [`StatsError::StopTimeout`] after the flush.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != CollectorState::Running {
            return Err(StatsError::lifecycle_error(format!(
                "Collector cannot stop from state {:?}",
                self.state
            )));
        }

        info!("Stopping collector");
        let resources = std::mem::take(&mut self.resources);
        let stuck = stop_all(resources, self.stop_timeout).await;
        self.state = CollectorState::Stopped;

        info!("Flushing stats");
        self.client.flush().await?;

        if stuck.is_empty() {
            Ok(())
        } else {
            Err(StatsError::StopTimeout { resources: stuck })
        }
    }

    /// Stop the first `started` resources after a failed start.
    async fn rollback(&mut self, started: usize) {
        let resources: Vec<_> = self.resources.drain(..started).collect();
        self.resources.clear();
        self.state = CollectorState::Stopped;

        if resources.is_empty() {
            return;
        }

        warn!(count = resources.len(), "Rolling back started resources");
        let stuck = stop_all(resources, self.stop_timeout).await;
        if !stuck.is_empty() {
            warn!(resources = ?stuck, "Resources did not stop during rollback");
        }
        if let Err(err) = self.client.flush().await {
            warn!(error = %err, "Failed to flush stats during rollback");
        }
    }
}

/// Stop all `resources` concurrently and wait for each to acknowledge.
///
/// Returns the names of resources still stopping when `timeout` expired.
async fn stop_all(resources: Vec<Box<dyn Resource>>, timeout: Option<Duration>) -> Vec<String> {
    let mut pending: Vec<String> = resources.iter().map(|r| r.name().to_string()).collect();
    let mut tasks = JoinSet::new();

    for mut resource in resources {
        tasks.spawn(async move {
            let name = resource.name().to_string();
            info!(resource = %name, "Stopping resource");

            // A panicking stop still counts as a completion.
            match AssertUnwindSafe(resource.stop()).catch_unwind().await {
                Ok(Ok(())) => debug!(resource = %name, "Resource stopped"),
                Ok(Err(err)) => {
                    error!(resource = %name, error = %err, "Failed to gracefully stop resource")
                }
                Err(_) => error!(resource = %name, "Resource panicked while stopping"),
            }
            name
        });
    }

    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        let joined = match deadline {
            Some(deadline) => {
                let next = time::timeout_at(deadline, tasks.join_next()).await;
                match next {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(resources = ?pending, "Timed out waiting for resources to stop");
                        tasks.detach_all();
                        return pending;
                    }
                }
            }
            None => tasks.join_next().await,
        };

        match joined {
            Some(Ok(name)) => {
                if let Some(pos) = pending.iter().position(|p| *p == name) {
                    pending.remove(pos);
                }
            }
            Some(Err(err)) => error!(error = %err, "Stop task failed"),
            None => break,
        }
    }

    Vec::new()
}
