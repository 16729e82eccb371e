//! Ordering of overlapping fetches.
//!
//! Every fetch takes a ticket before it starts. Only the completion carrying
//! the most recently issued ticket may update state; anything older is
//! discarded, so a slow response can never overwrite a newer one.

use serde::{Deserialize, Serialize};

/// Proof that a fetch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

/// Issues fetch tickets; the last issued ticket wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSequence {
    latest: u64,
    #[serde(default)]
    in_flight: bool,
}

impl FetchSequence {
    /// Start a new fetch, superseding any earlier one.
    pub fn issue(&mut self) -> FetchTicket {
        self.latest = self.latest.wrapping_add(1);
        self.in_flight = true;
        FetchTicket(self.latest)
    }

    /// Whether `ticket` belongs to the newest fetch.
    #[must_use]
    pub const fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Record a completion; returns `false` for a stale ticket.
    pub fn settle(&mut self, ticket: FetchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Whether the newest fetch has not completed yet.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight
    }
}

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result replaced local state.
    Applied,
    /// A newer fetch was started; the result was dropped.
    Stale,
}
