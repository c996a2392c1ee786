//! Pure broker state: the two managed queues, the matching rule, and the
//! periodic-timeout bookkeeping. No channel or task machinery lives here —
//! see [`super::actor`] for the surrounding actor loop — so this type can
//! be driven directly and deterministically from tests.

use tracing::{debug, warn};

use crate::{
    config::BrokerConfig,
    item::{CorrelationHandle, Item, MatchRefAllocator},
    outcome::Outcome,
    queue::ManagedQueue,
    time::Millis,
};

/// Which of the two symmetric sides a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Ask,
    AskR,
}

impl Side {
    fn opposite(self) -> Side {
        match self {
            Side::Ask => Side::AskR,
            Side::AskR => Side::Ask,
        }
    }
}

pub struct BrokerState {
    ask: ManagedQueue,
    ask_r: ManagedQueue,
    interval_ms: Millis,
    next_timeout_deadline: Millis,
    match_refs: MatchRefAllocator,
}

impl BrokerState {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            ask: ManagedQueue::new(config.ask_queue),
            ask_r: ManagedQueue::new(config.ask_r_queue),
            interval_ms: config.interval_ms,
            next_timeout_deadline: 0,
            match_refs: MatchRefAllocator::new(),
        }
    }

    fn queue_mut(&mut self, side: Side) -> &mut ManagedQueue {
        match side {
            Side::Ask => &mut self.ask,
            Side::AskR => &mut self.ask_r,
        }
    }

    pub fn queue_len(&self, side: Side) -> usize {
        match side {
            Side::Ask => self.ask.len(),
            Side::AskR => self.ask_r.len(),
        }
    }

    /// Run AQM's timeout hook on both queues if the periodic deadline has
    /// elapsed, and re-arm it. Called at the start of every operation.
    /// Delivers a `Dropped` outcome for everything this tick removes and
    /// returns how many items that was, for logging/tests.
    pub fn run_periodic_timeout(&mut self, now: Millis) -> usize {
        if now < self.next_timeout_deadline {
            return 0;
        }
        let mut dropped = self.ask.timeout(now);
        dropped.extend(self.ask_r.timeout(now));
        self.next_timeout_deadline = now + self.interval_ms;
        let drop_count = dropped.len();
        if drop_count > 0 {
            debug!(count = drop_count, "periodic AQM timeout dropped items");
        }
        for item in dropped {
            self.notify_dropped(now, item);
        }

        let dead = self.ask.sweep_dead(now) + self.ask_r.sweep_dead(now);
        if dead > 0 {
            debug!(count = dead, "removed dead peers from queues");
        }

        drop_count
    }

    /// Handle one arrival on `side`. Delivers every terminal outcome this
    /// call produces (the caller's own outcome, plus any AQM drops)
    /// directly to the relevant [`Item::deliver`]; the passive side (the
    /// one already waiting) is always notified before the active side.
    pub fn request(&mut self, now: Millis, side: Side, item: Item) {
        let opposite = side.opposite();

        let (waiter, dequeue_drops) = {
            let q = self.queue_mut(opposite);
            q.sweep_dead(now);
            q.dequeue(now)
        };

        for dropped in dequeue_drops {
            self.notify_dropped(now, dropped);
        }

        match waiter {
            Some(waiter) => {
                let reference = self.match_refs.next();
                let waiter_sojourn = waiter.sojourn(now);
                debug!(
                    %reference,
                    sojourn_ms = waiter_sojourn,
                    "matched"
                );
                // Passive side (the one that was already waiting) observes
                // the match no later than the active side.
                waiter.deliver(Outcome::matched(reference, waiter_sojourn));
                item.deliver(Outcome::matched(reference, 0));
            },
            None => {
                let dropped = {
                    let q = self.queue_mut(side);
                    q.enqueue(now, item)
                };
                for dropped in dropped {
                    self.notify_dropped(now, dropped);
                }
            },
        }
    }

    /// Remove a still-pending item by its correlation handle. A no-op
    /// (and still a success) if the handle no longer identifies a pending
    /// item.
    pub fn cancel(&mut self, now: Millis, handle: CorrelationHandle) {
        if self.ask.cancel(now, handle).is_some() || self.ask_r.cancel(now, handle).is_some() {
            debug!(%handle, "cancelled pending request");
        }
    }

    /// Transition into `terminating`: every pending item on both sides
    /// receives `Dropped` with its current sojourn time, including any
    /// items the AQM `on_dequeue` hook itself drops along the way.
    pub fn shutdown(&mut self, now: Millis) {
        loop {
            let (item, dropped) = self.ask.dequeue(now);
            for d in dropped {
                self.notify_dropped(now, d);
            }
            match item {
                Some(item) => self.notify_dropped(now, item),
                None => break,
            }
        }
        loop {
            let (item, dropped) = self.ask_r.dequeue(now);
            for d in dropped {
                self.notify_dropped(now, d);
            }
            match item {
                Some(item) => self.notify_dropped(now, item),
                None => break,
            }
        }
    }

    fn notify_dropped(&self, now: Millis, item: Item) {
        let sojourn = item.sojourn(now);
        warn!(tag = %item.tag, sojourn_ms = sojourn, "dropped by AQM");
        item.deliver(Outcome::dropped(sojourn));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    use super::*;
    use crate::{
        config::{Algorithm, DropMode, OutMode, QueueSpec},
        item::HandleAllocator,
    };

    fn naive_config(capacity: u32) -> BrokerConfig {
        let queue = QueueSpec {
            algorithm: Algorithm::Naive,
            out_mode: OutMode::Fifo,
            drop_mode: DropMode::Tail,
            capacity,
        };
        BrokerConfig {
            ask_queue: queue,
            ask_r_queue: queue,
            interval_ms: 100,
        }
    }

    #[test]
    fn basic_match_fifo() {
        let handles = HandleAllocator::new();
        let mut state = BrokerState::new(naive_config(4));

        let (tx_r, rx_r) = oneshot::channel();
        state.request(0, Side::AskR, Item::new(0, handles.next(), tx_r));

        let (tx_ask, rx_ask) = oneshot::channel();
        state.request(5, Side::Ask, Item::new(5, handles.next(), tx_ask));

        let passive_outcome = rx_r.try_recv().unwrap();
        let active_outcome = rx_ask.try_recv().unwrap();

        match (passive_outcome, active_outcome) {
            (
                Outcome::Matched {
                    reference: r1,
                    sojourn_ms: s1,
                },
                Outcome::Matched {
                    reference: r2,
                    sojourn_ms: s2,
                },
            ) => {
                assert_eq!(r1, r2);
                assert_eq!(s1, 5);
                assert_eq!(s2, 0);
            },
            other => panic!("expected two matches, got {other:?}"),
        }
    }

    #[test]
    fn capacity_overflow_head_drop() {
        let handles = HandleAllocator::new();
        let queue = QueueSpec {
            algorithm: Algorithm::Naive,
            out_mode: OutMode::Fifo,
            drop_mode: DropMode::Head,
            capacity: 2,
        };
        let config = BrokerConfig {
            ask_queue: queue,
            ask_r_queue: queue,
            interval_ms: 100,
        };
        let mut state = BrokerState::new(config);

        let (tx0, mut rx0) = oneshot::channel();
        state.request(0, Side::Ask, Item::new(0, handles.next(), tx0));
        let (tx1, _rx1) = oneshot::channel();
        state.request(1, Side::Ask, Item::new(1, handles.next(), tx1));
        let (tx2, _rx2) = oneshot::channel();
        state.request(2, Side::Ask, Item::new(2, handles.next(), tx2));

        let outcome = rx0.try_recv().unwrap();
        assert_eq!(outcome, Outcome::dropped(2));
        assert_eq!(state.queue_len(Side::Ask), 2);
    }

    #[test]
    fn cancel_before_match_then_opposite_arrival_enqueues() {
        let handles = HandleAllocator::new();
        let mut state = BrokerState::new(naive_config(4));

        let handle = handles.next();
        let (tx, mut rx) = oneshot::channel();
        state.request(0, Side::Ask, Item::new(0, handle, tx));
        state.cancel(1, handle);
        assert!(rx.try_recv().is_err());

        let (tx_r, mut rx_r) = oneshot::channel();
        state.request(5, Side::AskR, Item::new(5, handles.next(), tx_r));
        // No ask waiting anymore (cancelled), so ask_r enqueues instead of matching.
        assert!(rx_r.try_recv().is_err());
        assert_eq!(state.queue_len(Side::AskR), 1);
    }

    #[test]
    fn periodic_timeout_drops_overdue_item() {
        let handles = HandleAllocator::new();
        let queue = QueueSpec {
            algorithm: Algorithm::Timeout { timeout_ms: 200 },
            out_mode: OutMode::Fifo,
            drop_mode: DropMode::Tail,
            capacity: 4,
        };
        let config = BrokerConfig {
            ask_queue: queue,
            ask_r_queue: queue,
            interval_ms: 100,
        };
        let mut state = BrokerState::new(config);

        let (tx, mut rx) = oneshot::channel();
        state.request(0, Side::Ask, Item::new(0, handles.next(), tx));
        assert_eq!(state.run_periodic_timeout(100), 0);
        assert!(rx.try_recv().is_err());

        assert_eq!(state.run_periodic_timeout(200), 1);
        assert_eq!(rx.try_recv().unwrap(), Outcome::dropped(200));
    }

    #[test]
    fn shutdown_notifies_every_pending_caller_with_current_sojourn() {
        let handles = HandleAllocator::new();
        let mut state = BrokerState::new(naive_config(4));

        let (tx0, mut rx0) = oneshot::channel();
        state.request(0, Side::Ask, Item::new(0, handles.next(), tx0));
        let (tx1, mut rx1) = oneshot::channel();
        state.request(3, Side::Ask, Item::new(3, handles.next(), tx1));

        state.shutdown(10);

        assert_eq!(rx0.try_recv().unwrap(), Outcome::dropped(10));
        assert_eq!(rx1.try_recv().unwrap(), Outcome::dropped(7));
    }

    #[test]
    fn shutdown_notifies_items_dropped_by_the_dequeue_hook_too() {
        let handles = HandleAllocator::new();
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
        let mut state = BrokerState::new(config);

        let (tx_a, mut rx_a) = oneshot::channel();
        state.request(0, Side::Ask, Item::new(0, handles.next(), tx_a));
        // Enqueued before it is itself overdue, so on_enqueue doesn't drop
        // it yet; both items only become overdue by the time shutdown runs.
        let (tx_b, mut rx_b) = oneshot::channel();
        state.request(10, Side::Ask, Item::new(10, handles.next(), tx_b));

        // At t=100 both items are overdue, so `ManagedQueue::dequeue`'s own
        // `on_dequeue` hook drops them before `shutdown` ever sees a
        // `Some(item)` to notify directly. Both must still be notified.
        state.shutdown(100);

        assert_eq!(rx_a.try_recv().unwrap(), Outcome::dropped(100));
        assert_eq!(rx_b.try_recv().unwrap(), Outcome::dropped(90));
    }
}
