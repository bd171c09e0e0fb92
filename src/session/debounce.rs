//! Debounced single-slot task
//!
//! Holds at most one pending payload. Scheduling again replaces it and pushes
//! the deadline back; the payload is handed out by [`Debouncer::poll`] once
//! the interval has passed with no newer schedule.

use std::time::{Duration, Instant};

/// Identifies one scheduled task. Tickets increase with every schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    ticket: Ticket,
    due: Instant,
    payload: T,
}

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    interval: Duration,
    pending: Option<Scheduled<T>>,
    next_ticket: u64,
}

impl<T> Debouncer<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            next_ticket: 0,
        }
    }

    /// Schedule `payload` to fire `interval` after `now`, cancelling whatever
    /// was pending.
    pub fn schedule(&mut self, now: Instant, payload: T) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        if let Some(old) = self.pending.replace(Scheduled {
            ticket,
            due: now + self.interval,
            payload,
        }) {
            tracing::trace!(superseded = old.ticket.0, by = ticket.0, "debounce rescheduled");
        }
        ticket
    }

    /// Drop the pending task, returning its payload
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|s| s.payload)
    }

    /// Take the payload if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self.deadline()?;
        if now >= due {
            self.cancel()
        } else {
            None
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|s| s.due)
    }

    pub fn pending_ticket(&self) -> Option<Ticket> {
        self.pending.as_ref().map(|s| s.ticket)
    }
}
