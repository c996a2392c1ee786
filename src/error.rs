//! Error types surfaced to embedders.
//!
//! Per the broker's error handling policy, callers only ever observe two
//! kinds of fault: invalid configuration (fails at startup, the broker
//! never starts) and the broker actor having gone away. Everything else —
//! bad cancel handles, peer death, AQM drops — is absorbed internally and
//! turned into a normal [`crate::outcome::Outcome`] or a silent no-op.

use thiserror::Error;

/// Configuration rejected before the broker starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("queue capacity must be a positive integer, got {0}")]
    ZeroCapacity(u32),
    #[error("timeout algorithm requires T >= 1 ms, got {0}")]
    TimeoutTooSmall(u64),
    #[error("codel algorithm requires target >= 1 ms, got {0}")]
    CodelTargetTooSmall(u64),
    #[error("codel algorithm requires interval >= 1 ms, got {0}")]
    CodelIntervalTooSmall(u64),
    #[error("codel_timeout requires T ({timeout}) > target ({target})")]
    CodelTimeoutNotGreaterThanTarget { timeout: u64, target: u64 },
    #[error("broker interval_ms must be a positive integer, got {0}")]
    ZeroInterval(u64),
}

/// Failure to complete a request against a running broker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The broker actor has shut down (or been dropped) and can no longer
    /// accept requests. Any request already enqueued before shutdown still
    /// receives a `Dropped` outcome; this error is only returned when the
    /// request could not even be submitted.
    #[error("broker is no longer running")]
    Closed,
}
