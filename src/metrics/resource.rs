//! Interval-driven [`Resource`] built around a [`Sampler`].

use crate::client::MetricsClient;
use crate::error::{Result, StatsError};
use crate::metrics::traits::{Resource, Sampler};
use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs a sampler on its own tokio task, once per interval, emitting every
/// reading through the client received at start.
pub struct PeriodicResource<S: Sampler> {
    name: &'static str,
    interval: Duration,
    state: State<S>,
}

enum State<S> {
    Created(S),
    Started {
        token: CancellationToken,
        handle: JoinHandle<()>,
    },
    Stopped,
}

impl<S: Sampler> PeriodicResource<S> {
    pub fn new(sampler: S, interval: Duration) -> Self {
        Self {
            name: sampler.name(),
            interval,
            state: State::Created(sampler),
        }
    }

    /// Configured sampling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Started { .. })
    }
}

#[async_trait]
impl<S: Sampler> Resource for PeriodicResource<S> {
    fn name(&self) -> &str {
        self.name
    }

    async fn start(&mut self, client: Box<dyn MetricsClient>) -> Result<()> {
        if self.interval.is_zero() {
            return Err(StatsError::config_error(format!(
                "{} interval must be greater than zero",
                self.name
            )));
        }

        let mut sampler = match std::mem::replace(&mut self.state, State::Stopped) {
            State::Created(sampler) => sampler,
            other => {
                self.state = other;
                return Err(StatsError::lifecycle_error(format!(
                    "{} has already been started",
                    self.name
                )));
            }
        };

        // A failed prepare leaves the resource in Created.
        if let Err(err) = sampler.prepare() {
            self.state = State::Created(sampler);
            return Err(err);
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            sampler,
            client,
            self.interval,
            token.clone(),
        ));

        debug!(resource = self.name, interval = ?self.interval, "Sampling loop launched");
        self.state = State::Started { token, handle };
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let (token, handle) = match std::mem::replace(&mut self.state, State::Stopped) {
            State::Started { token, handle } => (token, handle),
            other => {
                self.state = other;
                return Err(StatsError::lifecycle_error(format!(
                    "{} is not running",
                    self.name
                )));
            }
        };

        token.cancel();
        handle.await.map_err(|e| {
            StatsError::resource_error(self.name, format!("sampling loop ended abnormally: {}", e))
        })
    }
}

async fn run_loop<S: Sampler>(
    mut sampler: S,
    client: Box<dyn MetricsClient>,
    period: Duration,
    token: CancellationToken,
) {
    let name = sampler.name();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                // Runs to completion before cancellation is looked at again.
                match sampler.sample() {
                    Ok(metrics) => {
                        let count = metrics.len();
                        for metric in metrics {
                            if let Err(err) = client.emit(metric).await {
                                warn!(resource = name, error = %err, "Failed to emit metric");
                            }
                        }
                        debug!(resource = name, count, "Emitted sample");
                    }
                    Err(err) => warn!(resource = name, error = %err, "Failed to sample"),
                }
            }
        }
    }

    debug!(resource = name, "Sampling loop stopped");
}
