//! A sojourn broker: matches requests from two symmetric sides (`ask` and
//! `ask_r`) into pairs, applying active queue management on each side to
//! shed load before queueing latency collapses.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sojourn_broker::{
//!     Algorithm,
//!     BrokerConfig,
//!     BrokerHandle,
//!     DropMode,
//!     OutMode,
//!     QueueSpec,
//!     SystemClock,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let queue = QueueSpec {
//!     algorithm: Algorithm::Codel {
//!         target_ms: 5,
//!         interval_ms: 100,
//!     },
//!     out_mode: OutMode::Fifo,
//!     drop_mode: DropMode::Tail,
//!     capacity: 1_000,
//! };
//! let config = BrokerConfig {
//!     ask_queue: queue,
//!     ask_r_queue: queue,
//!     interval_ms: 100,
//! };
//! let broker = BrokerHandle::spawn(config, Arc::new(SystemClock::new()))?;
//! let outcome = broker.ask().await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod aqm;
mod broker;
mod config;
mod error;
mod item;
mod outcome;
mod queue;
mod time;

pub use broker::{BrokerHandle, Side};
pub use config::{Algorithm, BrokerConfig, DropMode, OutMode, QueueSpec};
pub use error::{BrokerError, ConfigError};
pub use item::{CorrelationHandle, MatchRef};
pub use outcome::Outcome;
pub use time::{Clock, Millis, SharedClock, SystemClock};

#[cfg(any(test, feature = "testing"))]
pub use time::testing::TestClock;
