//! Active queue management strategies.
//!
//! Every strategy exposes the same four-hook contract over a queue of
//! [`Item`]s: `on_timeout`, `on_enqueue`, `on_dequeue`, `on_join`. Hooks
//! return the items they decided to drop (each carrying its own sojourn
//! time, computed by the caller) so the managed queue can notify callers.
//!
//! Strategies are dispatched through a single tagged enum rather than a
//! trait object: the set of strategies is closed (it's part of the wire
//! configuration in [`crate::config::Algorithm`]) and keeping them in one
//! enum lets `codel_timeout` hold its two sub-states side by side without
//! a second layer of dynamic dispatch.

mod codel;
mod codel_timeout;
mod naive;
mod timeout;

use std::collections::VecDeque;

pub use codel::CodelState;
pub use codel_timeout::CodelTimeoutState;
pub use naive::NaiveState;
pub use timeout::TimeoutState;

use crate::{config::Algorithm, item::Item, time::Millis};

/// Point in the managed queue's operation sequence at which a hook runs.
/// Distinct from `on_join`, which is a reset rather than a drop decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    Timeout,
    Enqueue,
    Dequeue,
}

/// Dispatching wrapper over the four concrete AQM strategies.
#[derive(Debug)]
pub enum AqmState {
    Naive(NaiveState),
    Timeout(TimeoutState),
    Codel(CodelState),
    CodelTimeout(CodelTimeoutState),
}

impl AqmState {
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Naive => AqmState::Naive(NaiveState::new()),
            Algorithm::Timeout { timeout_ms } => {
                AqmState::Timeout(TimeoutState::new(timeout_ms))
            },
            Algorithm::Codel {
                target_ms,
                interval_ms,
            } => AqmState::Codel(CodelState::new(target_ms, interval_ms)),
            Algorithm::CodelTimeout {
                target_ms,
                interval_ms,
                timeout_ms,
            } => AqmState::CodelTimeout(CodelTimeoutState::new(
                target_ms, interval_ms, timeout_ms,
            )),
        }
    }

    /// Run the hook for `point` on `now`, draining dropped items from the
    /// head of `queue` and returning them in drop order.
    pub fn run(&mut self, point: HookPoint, now: Millis, queue: &mut VecDeque<Item>) -> Vec<Item> {
        match self {
            AqmState::Naive(s) => s.run(point, now, queue),
            AqmState::Timeout(s) => s.run(point, now, queue),
            AqmState::Codel(s) => s.run(point, now, queue),
            AqmState::CodelTimeout(s) => s.run(point, now, queue),
        }
    }

    /// Reset hook fired when a queue transitions to empty. Never drops.
    pub fn on_join(&mut self, now: Millis) {
        match self {
            AqmState::Naive(s) => s.on_join(now),
            AqmState::Timeout(s) => s.on_join(now),
            AqmState::Codel(s) => s.on_join(now),
            AqmState::CodelTimeout(s) => s.on_join(now),
        }
    }
}

/// Shared helper: pop and collect items from the front of `queue` while
/// `should_drop` holds for the current front item.
pub(crate) fn drain_while(
    queue: &mut VecDeque<Item>,
    mut should_drop: impl FnMut(&Item) -> bool,
) -> Vec<Item> {
    let mut dropped = Vec::new();
    while let Some(front) = queue.front() {
        if should_drop(front) {
            dropped.push(queue.pop_front().expect("front just checked"));
        } else {
            break;
        }
    }
    dropped
}
