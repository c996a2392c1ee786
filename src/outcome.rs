//! Terminal outcomes delivered to callers.

use crate::{item::MatchRef, time::Millis};

/// The terminal result of an `ask`/`ask_r` request (sync or async).
///
/// Exactly one `Outcome` is ever delivered per enqueued request, except
/// when the caller dies before a terminal event occurs, in which case
/// none is delivered (see the broker's liveness handling).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Paired with a peer on the opposite side. Both peers of one pairing
    /// share the same `reference`. `sojourn_ms` is *this recipient's own*
    /// wait time: the passive side (the one that was already queued)
    /// reports the wait that just ended, while the active side (the one
    /// that just arrived and triggered the match) always reports 0.
    Matched {
        reference: MatchRef,
        sojourn_ms: Millis,
    },
    /// Removed by AQM (including capacity overflow or broker shutdown)
    /// without ever being matched.
    Dropped { sojourn_ms: Millis },
}

impl Outcome {
    pub fn matched(reference: MatchRef, sojourn_ms: Millis) -> Self {
        Outcome::Matched {
            reference,
            sojourn_ms,
        }
    }

    pub fn dropped(sojourn_ms: Millis) -> Self {
        Outcome::Dropped { sojourn_ms }
    }
}
