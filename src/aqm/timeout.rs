use std::collections::VecDeque;

use super::{drain_while, HookPoint};
use crate::{item::Item, time::Millis};

/// Age-based drop: anything overdue (`now - start_time >= timeout_ms`) is
/// dropped from the head. All three decision hooks (`on_timeout`,
/// `on_enqueue`, `on_dequeue`) share one routine and are required to agree
/// given the same `(now, queue, state)` — see [`crate::aqm`] module docs.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutState {
    timeout_ms: Millis,
    next_deadline: Millis,
}

impl TimeoutState {
    pub fn new(timeout_ms: Millis) -> Self {
        Self {
            timeout_ms,
            next_deadline: 0,
        }
    }

    pub fn run(&mut self, _point: HookPoint, now: Millis, queue: &mut VecDeque<Item>) -> Vec<Item> {
        if now < self.next_deadline {
            return Vec::new();
        }
        let timeout_ms = self.timeout_ms;
        let dropped = drain_while(queue, |item| now.saturating_sub(item.start_time) >= timeout_ms);
        self.next_deadline = match queue.front() {
            Some(front) => front.start_time + self.timeout_ms,
            None => now + self.timeout_ms,
        };
        dropped
    }

    pub fn on_join(&mut self, _now: Millis) {
        // Left as "empty implies reset" in the caller: managed queue only
        // invokes on_join when a side has fully drained, so unconditionally
        // resetting here matches the documented contract.
        self.next_deadline = 0;
    }
}
