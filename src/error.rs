// Errors surfaced by the alert monitor, the stores and the notification sink

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// Registration rejected: id, device or level missing or unknown.
    #[error("invalid alert: {0}")]
    InvalidAlert(String),

    /// Node or app report rejected before storing.
    #[error("invalid report: {0}")]
    InvalidReport(String),

    /// Malformed query parameters, e.g. a time bound that is not RFC 3339.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Backing store failed or is unreachable. Not retried.
    #[error("repository error: {0}")]
    Repository(#[source] anyhow::Error),

    /// Email is enabled but host, port or sender address is missing.
    #[error("notification sink not configured: {0}")]
    SinkNotConfigured(String),

    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

impl MonitorError {
    pub fn repository(err: impl Into<anyhow::Error>) -> Self {
        MonitorError::Repository(err.into())
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
