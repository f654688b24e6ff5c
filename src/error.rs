//! Error handling for the system-stats agent.

/// A specialized `Result` type for system-stats operations.
pub type Result<T> = std::result::Result<T, StatsError>;

/// The main error type for collection and transport operations.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid collection parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// The statsd transport could not be reached or written to
    #[error("Transport error: {0}")]
    Transport(String),

    /// A resource failed to start, stop or sample
    #[error("Resource {resource} failed: {message}")]
    Resource { resource: String, message: String },

    /// An operation was called in the wrong lifecycle state
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),

    /// Resources that did not acknowledge their stop before the deadline
    #[error("Timed out waiting for resources to stop: {}", resources.join(", "))]
    StopTimeout { resources: Vec<String> },
}

impl StatsError {
    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new transport error
    pub fn transport_error(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new error attributed to the named resource
    pub fn resource_error(resource: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Resource {
            resource: resource.into(),
            message: msg.into(),
        }
    }

    /// Create a new lifecycle error
    pub fn lifecycle_error(msg: impl Into<String>) -> Self {
        Self::Lifecycle(msg.into())
    }

    /// Whether this error reports resources stuck past the stop deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::StopTimeout { .. })
    }
}
