//! A managed queue: an ordered sequence of [`Item`]s with an AQM strategy,
//! an `out_mode` determining the serve end, and a capacity enforced by
//! dropping from `drop_mode`'s end.

use std::collections::VecDeque;

use crate::{
    aqm::{AqmState, HookPoint},
    config::{DropMode, OutMode, QueueSpec},
    item::{CorrelationHandle, Item},
    time::Millis,
};

#[derive(Debug)]
pub struct ManagedQueue {
    items: VecDeque<Item>,
    out_mode: OutMode,
    drop_mode: DropMode,
    capacity: usize,
    aqm: AqmState,
}

impl ManagedQueue {
    pub fn new(spec: QueueSpec) -> Self {
        Self {
            items: VecDeque::new(),
            out_mode: spec.out_mode,
            drop_mode: spec.drop_mode,
            capacity: spec.capacity as usize,
            aqm: AqmState::new(spec.algorithm),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn peek(&self) -> Option<&Item> {
        self.items.front()
    }

    /// Read-only view over the items currently pending, in their internal
    /// `VecDeque` order (not necessarily `out_mode`'s serve order). For
    /// diagnostics and tests, not part of the broker's decision path.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Append `item`, run the AQM enqueue hook, then enforce capacity by
    /// dropping from `drop_mode`'s end until the queue fits again.
    ///
    /// Returns every item this call dropped, in the order they were
    /// dropped (AQM drops first, capacity drops last).
    pub fn enqueue(&mut self, now: Millis, item: Item) -> Vec<Item> {
        let was_empty = self.items.is_empty();
        self.items.push_back(item);

        let mut dropped = self.aqm.run(HookPoint::Enqueue, now, &mut self.items);
        while self.items.len() > self.capacity {
            let overflowed = match self.drop_mode {
                DropMode::Head => self.items.pop_front(),
                DropMode::Tail => self.items.pop_back(),
            };
            dropped.extend(overflowed);
        }

        self.maybe_join(now, was_empty);
        dropped
    }

    /// Run the AQM dequeue hook, then remove and return one item from
    /// `out_mode`'s end, if any remain.
    pub fn dequeue(&mut self, now: Millis) -> (Option<Item>, Vec<Item>) {
        let was_empty = self.items.is_empty();
        let dropped = self.aqm.run(HookPoint::Dequeue, now, &mut self.items);

        let served = match self.out_mode {
            OutMode::Fifo => self.items.pop_front(),
            OutMode::Lifo => self.items.pop_back(),
        };

        self.maybe_join(now, was_empty);
        (served, dropped)
    }

    /// Run the AQM timeout hook (periodic tick), returning whatever it
    /// dropped.
    pub fn timeout(&mut self, now: Millis) -> Vec<Item> {
        let was_empty = self.items.is_empty();
        let dropped = self.aqm.run(HookPoint::Timeout, now, &mut self.items);
        self.maybe_join(now, was_empty);
        dropped
    }

    /// Remove the item correlated with `handle`, if it is still pending.
    pub fn cancel(&mut self, now: Millis, handle: CorrelationHandle) -> Option<Item> {
        let was_empty = self.items.is_empty();
        let position = self.items.iter().position(|item| item.tag == handle)?;
        let removed = self.items.remove(position);
        self.maybe_join(now, was_empty);
        removed
    }

    /// Explicit AQM reset hook. Safe to call even when the queue is not
    /// empty (every strategy treats that as a no-op).
    pub fn join(&mut self, now: Millis) {
        self.aqm.on_join(now);
    }

    /// Silently remove items whose caller has already gone away (their
    /// reply channel's receiver was dropped). Not an AQM drop: no outcome
    /// is delivered, since there is nowhere left to deliver it to.
    pub fn sweep_dead(&mut self, now: Millis) -> usize {
        let was_empty = self.items.is_empty();
        let before = self.items.len();
        self.items.retain(|item| !item.reply.is_closed());
        let removed = before - self.items.len();
        self.maybe_join(now, was_empty);
        removed
    }

    fn maybe_join(&mut self, now: Millis, was_empty: bool) {
        if !was_empty && self.items.is_empty() {
            self.aqm.on_join(now);
        }
    }
}
