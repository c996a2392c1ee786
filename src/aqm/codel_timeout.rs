use std::collections::VecDeque;

use super::{codel::CodelState, timeout::TimeoutState, HookPoint};
use crate::{item::Item, time::Millis};

/// Composition of `codel` and `timeout(T)`: guarantees at least as many
/// drops as `timeout(T)` alone would produce, by always draining overdue
/// items first and then giving CoDel a pass at whatever remains.
///
/// This ordering — run the timeout sub-state to completion, then run
/// CoDel on what's left — makes the "at least `timeout(T)`'s drop count"
/// property hold by construction rather than by comparing two parallel
/// simulations: every item the plain `timeout(T)` strategy would remove
/// from the head is removed here too, and CoDel may remove more on top of
/// that from the remainder.
#[derive(Debug, Clone, Copy)]
pub struct CodelTimeoutState {
    timeout: TimeoutState,
    codel: CodelState,
}

impl CodelTimeoutState {
    pub fn new(target: Millis, interval: Millis, timeout_ms: Millis) -> Self {
        Self {
            timeout: TimeoutState::new(timeout_ms),
            codel: CodelState::new(target, interval),
        }
    }

    pub fn run(&mut self, point: HookPoint, now: Millis, queue: &mut VecDeque<Item>) -> Vec<Item> {
        let mut dropped = self.timeout.run(point, now, queue);
        dropped.extend(self.codel.run(point, now, queue));
        dropped
    }

    pub fn on_join(&mut self, now: Millis) {
        self.timeout.on_join(now);
        self.codel.on_join(now);
    }
}
