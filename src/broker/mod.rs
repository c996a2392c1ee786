//! Caller-facing API: a cheaply-clonable [`BrokerHandle`] backed by one
//! long-lived actor task.
//!
//! A struct wrapping an `mpsc` sender plus an `Arc<JoinHandle<_>>`,
//! cloneable to share one broker, whose `Drop` impl aborts the
//! background task once the last handle disappears.

mod actor;
mod state;

use std::sync::Arc;

use tokio::{sync::{mpsc, oneshot}, task::JoinHandle};

pub use state::Side;

use crate::{
    config::BrokerConfig,
    error::{BrokerError, ConfigError},
    item::{CorrelationHandle, HandleAllocator},
    outcome::Outcome,
    time::SharedClock,
};

/// A handle to a running broker actor.
///
/// Clone it freely to share one broker across tasks; the actor is torn
/// down once the last clone (and its background task handle) is dropped.
pub struct BrokerHandle {
    requests: mpsc::UnboundedSender<actor::Request>,
    handles: Arc<HandleAllocator>,
    task: Option<Arc<JoinHandle<()>>>,
}

impl Clone for BrokerHandle {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            handles: Arc::clone(&self.handles),
            task: self.task.clone(),
        }
    }
}

impl Drop for BrokerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if let Ok(task) = Arc::try_unwrap(task) {
                task.abort();
            }
        }
    }
}

impl BrokerHandle {
    /// Validate `config`, start the broker actor on the current Tokio
    /// runtime, and return a handle to it.
    pub fn spawn(config: BrokerConfig, clock: SharedClock) -> Result<Self, ConfigError> {
        config.validate()?;

        let interval_ms = config.interval_ms;
        let state = state::BrokerState::new(config);
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(actor::run(state, clock, requests_rx, interval_ms));

        Ok(Self {
            requests: requests_tx,
            handles: Arc::new(HandleAllocator::new()),
            task: Some(Arc::new(task)),
        })
    }

    /// Synchronous `ask`: blocks until a terminal outcome is available.
    pub async fn ask(&self) -> Result<Outcome, BrokerError> {
        self.request_and_wait(Side::Ask).await
    }

    /// Synchronous `ask_r`, matched against `ask`ers.
    pub async fn ask_r(&self) -> Result<Outcome, BrokerError> {
        self.request_and_wait(Side::AskR).await
    }

    /// Asynchronous `ask`: returns a correlation handle immediately. The
    /// paired [`oneshot::Receiver`] resolves with the terminal outcome
    /// whenever it occurs.
    pub fn async_ask(&self) -> Result<(CorrelationHandle, oneshot::Receiver<Outcome>), BrokerError> {
        self.request(Side::Ask)
    }

    /// Asynchronous `ask_r`.
    pub fn async_ask_r(&self) -> Result<(CorrelationHandle, oneshot::Receiver<Outcome>), BrokerError> {
        self.request(Side::AskR)
    }

    /// Remove a still-pending request by its correlation handle. Always
    /// succeeds from the caller's point of view, whether or not the
    /// handle still identified a pending item, and whether or not the
    /// broker actor is even still running — a cancel against a broker
    /// that has already shut down is just as much a no-op as one against
    /// a handle that was never pending.
    pub fn cancel(&self, handle: CorrelationHandle) {
        let _ = self.requests.send(actor::Request::Cancel { handle });
    }

    fn request(
        &self,
        side: Side,
    ) -> Result<(CorrelationHandle, oneshot::Receiver<Outcome>), BrokerError> {
        let tag = self.handles.next();
        let (reply, receiver) = oneshot::channel();
        self.requests
            .send(actor::Request::Arrive { side, tag, reply })
            .map_err(|_| BrokerError::Closed)?;
        Ok((tag, receiver))
    }

    async fn request_and_wait(&self, side: Side) -> Result<Outcome, BrokerError> {
        let (_handle, receiver) = self.request(side)?;
        receiver.await.map_err(|_| BrokerError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::{Algorithm, DropMode, OutMode, QueueSpec},
        time::SystemClock,
    };

    fn naive_config(capacity: u32, interval_ms: u64) -> BrokerConfig {
        let queue = QueueSpec {
            algorithm: Algorithm::Naive,
            out_mode: OutMode::Fifo,
            drop_mode: DropMode::Tail,
            capacity,
        };
        BrokerConfig {
            ask_queue: queue,
            ask_r_queue: queue,
            interval_ms,
        }
    }

    #[tokio::test]
    async fn ask_and_ask_r_match_end_to_end() {
        let broker = BrokerHandle::spawn(naive_config(8, 50), Arc::new(SystemClock::new())).unwrap();

        let waiter = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.ask_r().await })
        };
        // Give the waiter a moment to enqueue before the active side arrives.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let active_outcome = broker.ask().await.unwrap();
        let passive_outcome = waiter.await.unwrap().unwrap();

        match (passive_outcome, active_outcome) {
            (
                Outcome::Matched { reference: r1, .. },
                Outcome::Matched {
                    reference: r2,
                    sojourn_ms: s2,
                },
            ) => {
                assert_eq!(r1, r2);
                assert_eq!(s2, 0);
            },
            other => panic!("expected two matches, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_timeout_drops_overdue_item_end_to_end() {
        let queue = QueueSpec {
            algorithm: Algorithm::Timeout { timeout_ms: 200 },
            out_mode: OutMode::Fifo,
            drop_mode: DropMode::Tail,
            capacity: 4,
        };
        let config = BrokerConfig {
            ask_queue: queue,
            ask_r_queue: queue,
            interval_ms: 50,
        };
        let broker = BrokerHandle::spawn(config, Arc::new(SystemClock::new())).unwrap();

        let waiter = {
            let broker = broker.clone();
            tokio::spawn(async move { broker.ask().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::time::advance(Duration::from_millis(250)).await;

        let outcome = waiter.await.unwrap().unwrap();
        assert!(matches!(outcome, Outcome::Dropped { .. }));
    }

    #[tokio::test]
    async fn dropping_handle_aborts_actor() {
        let broker = BrokerHandle::spawn(naive_config(4, 100), Arc::new(SystemClock::new())).unwrap();
        drop(broker);
        // Nothing to assert directly beyond "this doesn't hang or panic";
        // the actor task is aborted once the last handle disappears.
    }

    #[tokio::test]
    async fn cancel_is_fire_and_forget_even_for_an_unknown_handle() {
        let broker = BrokerHandle::spawn(naive_config(4, 100), Arc::new(SystemClock::new())).unwrap();
        broker.cancel(CorrelationHandle::from_raw(9_999));
    }

    /// Drives the actor loop directly (bypassing `BrokerHandle`, whose
    /// `Drop` aborts the task rather than closing its channel) so we can
    /// observe the graceful-shutdown path: closing the request channel
    /// makes the actor run `BrokerState::shutdown`, which must notify
    /// every still-pending caller with `Outcome::Dropped`, including ones
    /// the AQM `on_dequeue` hook itself removes along the way, rather than
    /// leaving their reply channel to resolve as a closed-channel error.
    #[tokio::test]
    async fn actor_shutdown_notifies_items_dropped_by_the_dequeue_hook() {
        use crate::time::testing::TestClock;

        let queue = QueueSpec {
            algorithm: Algorithm::Timeout { timeout_ms: 50 },
            out_mode: OutMode::Fifo,
            drop_mode: DropMode::Tail,
            capacity: 4,
        };
        let config = BrokerConfig {
            ask_queue: queue,
            ask_r_queue: queue,
            interval_ms: 1_000,
        };
        let interval_ms = config.interval_ms;

        let test_clock = TestClock::new();
        let clock: SharedClock = Arc::new(test_clock.clone());
        let state = state::BrokerState::new(config);
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(actor::run(state, clock, requests_rx, interval_ms));

        let (reply_a, mut rx_a) = oneshot::channel();
        requests_tx
            .send(actor::Request::Arrive {
                side: Side::Ask,
                tag: CorrelationHandle::from_raw(0),
                reply: reply_a,
            })
            .unwrap();
        // Let the actor pick up and enqueue item A at now=0 before the
        // clock moves, so its start_time is actually 0.
        tokio::task::yield_now().await;

        test_clock.set(10);
        let (reply_b, mut rx_b) = oneshot::channel();
        requests_tx
            .send(actor::Request::Arrive {
                side: Side::Ask,
                tag: CorrelationHandle::from_raw(1),
                reply: reply_b,
            })
            .unwrap();
        // Likewise for item B at now=10.
        tokio::task::yield_now().await;

        test_clock.set(100);
        drop(requests_tx);
        task.await.unwrap();

        assert_eq!(rx_a.try_recv().unwrap(), Outcome::dropped(100));
        assert_eq!(rx_b.try_recv().unwrap(), Outcome::dropped(90));
    }
}
