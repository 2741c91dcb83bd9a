//! Discrete event queue.
//!
//! Events are ordered by tick; events scheduled for the same tick run in the order
//! they were scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::common::{CoreId, Tick};
use crate::dtu::DtuEvent;
use crate::soc::packet::Packet;

/// Something that happens at a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A scratchpad request reaches the scratchpad of `core`.
    SpmRequest {
        /// Tile of the scratchpad.
        core: CoreId,
        /// The request.
        pkt: Packet,
    },
    /// A scratchpad response reaches the DTU of `core`.
    SpmResponse {
        /// Tile of the unit.
        core: CoreId,
        /// The response.
        pkt: Packet,
    },
    /// A request enters the NoC.
    NocRequest {
        /// The request; routed by its NoC address.
        pkt: Packet,
    },
    /// A response enters the NoC.
    NocResponse {
        /// The response; routed to its source core.
        pkt: Packet,
    },
    /// A register access response reaches the core of `core`.
    CpuResponse {
        /// Tile of the core.
        core: CoreId,
        /// The response.
        pkt: Packet,
    },
    /// A deferred action of the DTU of `core`.
    Dtu {
        /// Tile of the unit.
        core: CoreId,
        /// The action.
        event: DtuEvent,
    },
}

#[derive(Debug)]
struct Scheduled {
    when: Tick,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        (self.when, self.seq) == (other.when, other.seq)
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.when, self.seq).cmp(&(other.when, other.seq))
    }
}

/// Time-ordered queue of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `event` at `when`.
    pub fn schedule(&mut self, when: Tick, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled { when, seq, event }));
    }

    /// Removes and returns the earliest event.
    pub fn pop(&mut self) -> Option<(Tick, Event)> {
        self.heap
            .pop()
            .map(|Reverse(s)| (s.when, s.event))
    }

    /// Tick of the earliest event.
    pub fn peek_tick(&self) -> Option<Tick> {
        self.heap.peek().map(|Reverse(s)| s.when)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
