//! One-shot timers owned by seats.
//!
//! Expiry is delivered back to the session as an event carrying a
//! [`TimerTicket`]. Because delivery is asynchronous, an expiry can race a
//! cancel or a rearm; the queue hands out a new generation for every arming
//! and [`TimerQueue::take_expired`] rejects tickets from older ones.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::common::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(u32);

impl TimerId {
    pub const fn new(id: u32) -> Self { TimerId(id) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerTicket {
    pub id: TimerId,
    pub generation: u64,
}

pub trait TimerQueue {
    /// Arms `id` to fire once after `after`, replacing any pending arming.
    fn arm(&mut self, id: TimerId, after: Duration);

    fn cancel(&mut self, id: TimerId);

    /// Consumes a delivered expiry. Returns false when the ticket belongs to
    /// an arming that was cancelled or replaced in the meantime.
    fn take_expired(&mut self, ticket: TimerTicket) -> bool;
}

#[derive(Debug, Default)]
struct Armings {
    next_generation: u64,
    pending: HashMap<TimerId, (u64, Duration)>,
    arm_count: usize,
}

impl Armings {
    fn arm(&mut self, id: TimerId, after: Duration) -> TimerTicket {
        self.next_generation += 1;
        self.arm_count += 1;
        self.pending.insert(id, (self.next_generation, after));
        TimerTicket { id, generation: self.next_generation }
    }

    fn cancel(&mut self, id: TimerId) -> bool { self.pending.remove(&id).is_some() }

    fn take_expired(&mut self, ticket: TimerTicket) -> bool {
        match self.pending.get(&ticket.id) {
            Some(&(generation, _)) if generation == ticket.generation => {
                self.pending.remove(&ticket.id);
                true
            }
            _ => false,
        }
    }
}

/// Timers that only fire when told to. The session under test and the test
/// share the same state.
#[derive(Debug, Clone, Default)]
pub struct ManualTimers(Rc<RefCell<Armings>>);

impl ManualTimers {
    pub fn new() -> Self { Self::default() }

    /// Duration of the pending arming of `id`, if any.
    pub fn armed(&self, id: TimerId) -> Option<Duration> {
        self.0.borrow().pending.get(&id).map(|&(_, after)| after)
    }

    /// Total number of `arm` calls so far.
    pub fn arm_count(&self) -> usize { self.0.borrow().arm_count }

    /// The ticket an expiry of the current arming of `id` would carry.
    pub fn fire(&self, id: TimerId) -> Option<TimerTicket> {
        self.0
            .borrow()
            .pending
            .get(&id)
            .map(|&(generation, _)| TimerTicket { id, generation })
    }
}

impl TimerQueue for ManualTimers {
    fn arm(&mut self, id: TimerId, after: Duration) { self.0.borrow_mut().arm(id, after); }

    fn cancel(&mut self, id: TimerId) { self.0.borrow_mut().cancel(id); }

    fn take_expired(&mut self, ticket: TimerTicket) -> bool {
        self.0.borrow_mut().take_expired(ticket)
    }
}

pub type ExpiryCallback = Arc<dyn Fn(TimerTicket) + Send + Sync>;

/// Timers backed by the tokio runtime the session runs on.
pub struct TokioTimers {
    armings: Armings,
    tokens: HashMap<TimerId, CancellationToken>,
    on_expire: ExpiryCallback,
}

impl TokioTimers {
    pub fn new(on_expire: impl Fn(TimerTicket) + Send + Sync + 'static) -> Self {
        Self {
            armings: Armings::default(),
            tokens: HashMap::default(),
            on_expire: Arc::new(on_expire),
        }
    }
}

impl TimerQueue for TokioTimers {
    fn arm(&mut self, id: TimerId, after: Duration) {
        if let Some(token) = self.tokens.remove(&id) {
            token.cancel();
        }
        let ticket = self.armings.arm(id, after);
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let on_expire = self.on_expire.clone();
        trace!(?ticket, ?after, "arming timer");
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(after) => on_expire(ticket),
            }
        });
        self.tokens.insert(id, token);
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(token) = self.tokens.remove(&id) {
            token.cancel();
        }
        if self.armings.cancel(id) {
            trace!(?id, "cancelled timer");
        }
    }

    fn take_expired(&mut self, ticket: TimerTicket) -> bool {
        let live = self.armings.take_expired(ticket);
        if live {
            self.tokens.remove(&ticket.id);
        }
        live
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for token in self.tokens.values() {
            token.cancel();
        }
    }
}
