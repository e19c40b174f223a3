//! "Last response wins" bookkeeping for overlapping requests.
//!
//! Every request takes a [`Ticket`] before it is sent. When its response
//! arrives, [`RequestSequencer::complete`] reports whether it is still the
//! newest request of its kind; stale completions must be dropped.

use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKind {
    AvailableDates,
    Tiles,
    Features,
    Cages,
    Chart,
    Weather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    kind: RequestKind,
    seq: u64,
}

impl Ticket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: u64,
    latest: HashMap<RequestKind, u64>,
    in_flight: HashMap<RequestKind, usize>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request. Any earlier ticket of the same kind becomes stale.
    pub fn issue(&mut self, kind: RequestKind) -> Ticket {
        self.next += 1;
        self.latest.insert(kind, self.next);
        *self.in_flight.entry(kind).or_insert(0) += 1;
        Ticket {
            kind,
            seq: self.next,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.latest.get(&ticket.kind) == Some(&ticket.seq)
    }

    /// Finish a request. Returns true if its response should be applied.
    pub fn complete(&mut self, ticket: Ticket) -> bool {
        if let Some(count) = self.in_flight.get_mut(&ticket.kind) {
            *count = count.saturating_sub(1);
        }
        let current = self.is_current(&ticket);
        if !current {
            debug!(kind = ?ticket.kind, seq = ticket.seq, "Dropping stale response");
        }
        current
    }

    /// Whether any request of this kind is still outstanding.
    pub fn is_loading(&self, kind: RequestKind) -> bool {
        self.in_flight.get(&kind).copied().unwrap_or(0) > 0
    }

    pub fn any_loading(&self) -> bool {
        self.in_flight.values().any(|n| *n > 0)
    }
}
