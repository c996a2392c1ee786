//! The record kept for every party waiting in a managed queue.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::oneshot;

use crate::{outcome::Outcome, time::Millis};

/// Opaque correlation token returned by the asynchronous API.
///
/// Monotonic for the lifetime of one [`crate::broker::BrokerHandle`];
/// values are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationHandle(u64);

impl std::fmt::Display for CorrelationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CorrelationHandle {
    /// Reconstruct a handle from its raw numeric form, e.g. one a caller
    /// round-tripped through a log line or a terminal. The broker itself
    /// never needs this; only callers that persist handles outside the
    /// process do.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

/// Issues [`CorrelationHandle`]s for a single broker actor.
#[derive(Debug, Default)]
pub struct HandleAllocator(AtomicU64);

impl HandleAllocator {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn next(&self) -> CorrelationHandle {
        CorrelationHandle(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// A shared reference assigned to exactly one match; both paired parties
/// receive the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchRef(u64);

#[derive(Debug, Default)]
pub struct MatchRefAllocator(AtomicU64);

impl MatchRefAllocator {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn next(&self) -> MatchRef {
        MatchRef(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for MatchRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque correlation value threaded through by asynchronous callers. The
/// broker never inspects it.
pub type Tag = CorrelationHandle;

/// How the broker delivers a terminal outcome to a waiting party. Synchronous
/// callers sit on the other end of a [`oneshot::Receiver`]; the broker never
/// distinguishes sync from async callers beyond this single field.
pub type OutcomeSender = oneshot::Sender<Outcome>;

/// A single item sitting in a managed queue.
///
/// `start_time` is fixed at enqueue and never mutated, per the
/// sojourn-time invariant: every queue decision is a pure function of
/// `(now, start_time)`.
#[derive(Debug)]
pub struct Item {
    pub start_time: Millis,
    pub tag: Tag,
    pub reply: OutcomeSender,
}

impl Item {
    pub fn new(start_time: Millis, tag: Tag, reply: OutcomeSender) -> Self {
        Self {
            start_time,
            tag,
            reply,
        }
    }

    pub fn sojourn(&self, now: Millis) -> Millis {
        now.saturating_sub(self.start_time)
    }

    /// Deliver a terminal outcome to the waiting caller. A failed send means
    /// the caller already dropped its receiver (e.g. cancelled via drop);
    /// that is not an error for the broker.
    pub fn deliver(self, outcome: Outcome) {
        let _ = self.reply.send(outcome);
    }
}
