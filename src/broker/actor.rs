//! The broker's run-to-completion actor loop.
//!
//! One task owns a [`BrokerState`] for the lifetime of the broker and
//! processes exactly one [`Request`] or one periodic timer tick at a
//! time, in arrival order: a loop around `tokio::select!` over an
//! inbound request channel and a timer, with no `.await` point inside a
//! single decision.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::info;

use super::state::{BrokerState, Side};
use crate::{
    item::{CorrelationHandle, Item, Tag},
    outcome::Outcome,
    time::SharedClock,
};

/// One message in the broker's mailbox.
pub enum Request {
    /// A request arriving on `side`. Used for both synchronous and
    /// asynchronous callers alike — the distinction lives entirely in
    /// whether [`super::BrokerHandle`] awaits `reply` inline or hands the
    /// receiver back to the caller.
    Arrive {
        side: Side,
        tag: Tag,
        reply: oneshot::Sender<Outcome>,
    },
    /// Remove a still-pending item. Always a fire-and-forget success from
    /// the caller's perspective; this variant carries no reply channel.
    Cancel { handle: CorrelationHandle },
}

/// Runs the broker until every clone of its [`super::BrokerHandle`] is
/// dropped (closing `requests`) or a shutdown is requested externally by
/// dropping the sender half.
pub async fn run(
    mut state: BrokerState,
    clock: SharedClock,
    mut requests: mpsc::UnboundedReceiver<Request>,
    interval_ms: u64,
) {
    info!("broker actor starting");
    let tick = Duration::from_millis(interval_ms.max(1));
    let mut timer = tokio::time::interval(tick);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            maybe_request = requests.recv() => {
                match maybe_request {
                    Some(request) => handle_request(&mut state, &clock, request),
                    None => break,
                }
            }
            _ = timer.tick() => {
                let now = clock.now_ms();
                state.run_periodic_timeout(now);
            }
        }
    }

    let now = clock.now_ms();
    state.shutdown(now);
    info!("broker actor shut down");
}

fn handle_request(state: &mut BrokerState, clock: &SharedClock, request: Request) {
    let now = clock.now_ms();
    state.run_periodic_timeout(now);

    match request {
        Request::Arrive { side, tag, reply } => {
            state.request(now, side, Item::new(now, tag, reply));
        },
        Request::Cancel { handle } => {
            state.cancel(now, handle);
        },
    }
}
