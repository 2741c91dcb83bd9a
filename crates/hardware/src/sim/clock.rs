//! Clock domain arithmetic.
//!
//! Simulated time advances in ticks. A unit runs at a fixed period and only acts on
//! its clock edges; `clock_edge` converts a delay in cycles into the absolute tick
//! at which the unit acts.

use crate::common::{Cycles, Tick};

/// Clock of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clock {
    period: Tick,
}

impl Clock {
    /// Creates a clock; a zero period is treated as one tick.
    pub fn new(period: Tick) -> Self {
        Self {
            period: period.max(1),
        }
    }

    /// Clock period in ticks.
    #[inline]
    pub fn period(&self) -> Tick {
        self.period
    }

    /// First clock edge at or after `now`.
    #[inline]
    pub fn next_edge(&self, now: Tick) -> Tick {
        now.div_ceil(self.period) * self.period
    }

    /// Tick of the clock edge `cycles` cycles after the next edge at or after `now`.
    ///
    /// # Arguments
    ///
    /// * `now` - Current tick.
    /// * `cycles` - Delay in cycles.
    #[inline]
    pub fn clock_edge(&self, now: Tick, cycles: Cycles) -> Tick {
        self.next_edge(now)
            .saturating_add(self.cycles_to_ticks(cycles))
    }

    /// Converts ticks to cycles, rounding up.
    #[inline]
    pub fn ticks_to_cycles(&self, ticks: Tick) -> Cycles {
        ticks.div_ceil(self.period)
    }

    /// Converts cycles to ticks.
    #[inline]
    pub fn cycles_to_ticks(&self, cycles: Cycles) -> Tick {
        cycles.saturating_mul(self.period)
    }
}
