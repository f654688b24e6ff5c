//! Termination signal handling.

use crate::error::Result;
use std::fmt;

/// The signal that asked the agent to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Wait for SIGINT or SIGTERM (Ctrl-C only on non-unix platforms).
#[cfg(unix)]
pub async fn wait_for_signal() -> Result<ShutdownSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = terminate.recv() => Ok(ShutdownSignal::Terminate),
        _ = interrupt.recv() => Ok(ShutdownSignal::Interrupt),
    }
}

/// Wait for SIGINT or SIGTERM (Ctrl-C only on non-unix platforms).
#[cfg(not(unix))]
pub async fn wait_for_signal() -> Result<ShutdownSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}
