use std::collections::VecDeque;

use super::HookPoint;
use crate::{item::Item, time::Millis};

/// The CoDel controller: drops from the head once sojourn time has stayed
/// above `target` for a continuous `interval`, then paces further drops by
/// the control law `interval / sqrt(count)`.
///
/// All three decision hooks funnel into [`CodelState::run`]; `on_join`
/// resets the controller to its non-dropping state, matching the
/// management-queue contract that a side which has fully drained starts
/// fresh.
#[derive(Debug, Clone, Copy)]
pub struct CodelState {
    target: Millis,
    interval: Millis,
    count: u32,
    drop_next: Millis,
    /// 0 means "not currently above target".
    first_above_time: Millis,
    dropping: bool,
}

impl CodelState {
    pub fn new(target: Millis, interval: Millis) -> Self {
        Self {
            target,
            interval,
            count: 0,
            drop_next: 0,
            first_above_time: 0,
            dropping: false,
        }
    }

    #[cfg(test)]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[cfg(test)]
    pub fn is_dropping(&self) -> bool {
        self.dropping
    }

    fn control_law(&self, t: Millis) -> Millis {
        t + (self.interval as f64 / (self.count.max(1) as f64).sqrt()).round() as Millis
    }

    pub fn run(&mut self, _point: HookPoint, now: Millis, queue: &mut VecDeque<Item>) -> Vec<Item> {
        let mut dropped = Vec::new();
        loop {
            let Some(front) = queue.front() else {
                self.first_above_time = 0;
                self.dropping = false;
                break;
            };

            let sojourn = now.saturating_sub(front.start_time);
            let above_for_full_interval = if sojourn < self.target {
                self.first_above_time = 0;
                false
            } else if self.first_above_time == 0 {
                self.first_above_time = now + self.interval;
                false
            } else {
                now >= self.first_above_time
            };

            if self.dropping {
                if !above_for_full_interval {
                    self.dropping = false;
                    break;
                }
                if now >= self.drop_next {
                    dropped.push(queue.pop_front().expect("front just checked"));
                    self.count += 1;
                    self.drop_next = self.control_law(self.drop_next);
                    continue;
                }
                break;
            } else if above_for_full_interval {
                dropped.push(queue.pop_front().expect("front just checked"));
                self.dropping = true;
                if now.saturating_sub(self.drop_next) < self.interval && self.count > 2 {
                    self.count -= 2;
                } else {
                    self.count = 1;
                }
                self.drop_next = self.control_law(now);
                continue;
            } else {
                break;
            }
        }
        dropped
    }

    pub fn on_join(&mut self, _now: Millis) {
        self.first_above_time = 0;
        self.dropping = false;
        self.count = 0;
        self.drop_next = 0;
    }
}
