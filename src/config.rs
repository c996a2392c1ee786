//! External configuration surface.
//!
//! The broker itself never parses configuration files — that belongs to
//! the embedder (see Non-goals) — but these types are `serde`-enabled so
//! an embedder can deserialize them directly from JSON or TOML, the way
//! the wire types in a typical client/server crate are.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which end of a queue `dequeue` serves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutMode {
    Fifo,
    Lifo,
}

/// Which end of a queue capacity overflow removes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropMode {
    Head,
    Tail,
}

/// An AQM strategy selection with its parameters, as supplied by the
/// embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Algorithm {
    Naive,
    Timeout {
        /// Age, in ms, at which an item becomes overdue.
        timeout_ms: u64,
    },
    Codel {
        /// Desired queueing latency, in ms.
        target_ms: u64,
        /// Window over which sojourn must stay above target before the
        /// controller starts dropping, in ms.
        interval_ms: u64,
    },
    CodelTimeout {
        target_ms: u64,
        interval_ms: u64,
        /// Hard age ceiling; codel_timeout drops at least as many items as
        /// plain `timeout(timeout_ms)` would.
        timeout_ms: u64,
    },
}

impl Algorithm {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Algorithm::Naive => Ok(()),
            Algorithm::Timeout { timeout_ms } => {
                if timeout_ms < 1 {
                    return Err(ConfigError::TimeoutTooSmall(timeout_ms));
                }
                Ok(())
            },
            Algorithm::Codel {
                target_ms,
                interval_ms,
            } => {
                if target_ms < 1 {
                    return Err(ConfigError::CodelTargetTooSmall(target_ms));
                }
                if interval_ms < 1 {
                    return Err(ConfigError::CodelIntervalTooSmall(interval_ms));
                }
                Ok(())
            },
            Algorithm::CodelTimeout {
                target_ms,
                interval_ms,
                timeout_ms,
            } => {
                if target_ms < 1 {
                    return Err(ConfigError::CodelTargetTooSmall(target_ms));
                }
                if interval_ms < 1 {
                    return Err(ConfigError::CodelIntervalTooSmall(interval_ms));
                }
                if timeout_ms <= target_ms {
                    return Err(ConfigError::CodelTimeoutNotGreaterThanTarget {
                        timeout: timeout_ms,
                        target: target_ms,
                    });
                }
                Ok(())
            },
        }
    }
}

/// Full specification of one side's managed queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub algorithm: Algorithm,
    pub out_mode: OutMode,
    pub capacity: u32,
    pub drop_mode: DropMode,
}

impl QueueSpec {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity(self.capacity));
        }
        self.algorithm.validate()
    }
}

/// Top-level broker configuration, supplied by the embedder at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub ask_queue: QueueSpec,
    pub ask_r_queue: QueueSpec,
    pub interval_ms: u64,
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval(self.interval_ms));
        }
        self.ask_queue.validate()?;
        self.ask_r_queue.validate()?;
        Ok(())
    }
}
