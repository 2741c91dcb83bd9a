//! Simulation statistics collection and reporting.
//!
//! This module tracks activity counters for the DTU platform. It provides:
//! 1. **Per-unit counters:** Commands, messages and bytes moved, ring releases and errors.
//! 2. **Platform summary:** Simulated time, processed events and recorded faults.

use std::ops::AddAssign;
use std::time::Instant;

use serde::Serialize;

/// Activity counters of one DTU.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DtuStats {
    /// Commands decoded and dispatched.
    pub commands_executed: u64,
    /// Message frames put on the NoC.
    pub messages_sent: u64,
    /// Payload bytes put on the NoC.
    pub bytes_sent: u64,
    /// Message frames committed to a receive ring.
    pub messages_received: u64,
    /// Frame bytes (header included) committed to a receive ring.
    pub bytes_received: u64,
    /// Receive slots released by the local core.
    pub read_ptr_increments: u64,
    /// Transmissions the receiving unit rejected.
    pub transfers_rejected: u64,
    /// Operations that ended in an error.
    pub errors: u64,
}

impl AddAssign<&Self> for DtuStats {
    fn add_assign(&mut self, rhs: &Self) {
        self.commands_executed += rhs.commands_executed;
        self.messages_sent += rhs.messages_sent;
        self.bytes_sent += rhs.bytes_sent;
        self.messages_received += rhs.messages_received;
        self.bytes_received += rhs.bytes_received;
        self.read_ptr_increments += rhs.read_ptr_increments;
        self.transfers_rejected += rhs.transfers_rejected;
        self.errors += rhs.errors;
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"transmit"`, `"receive"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "transmit", "receive"];

/// Platform-wide statistics.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Simulated time in ticks.
    pub ticks: u64,
    /// Clock period used to derive cycle counts.
    pub clock_period: u64,
    /// Events dispatched by the platform.
    pub events: u64,
    /// Errors recorded while processing events.
    pub faults: u64,
    /// Sum of all units' counters.
    pub dtu: DtuStats,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: 0,
            clock_period: 1,
            events: 0,
            faults: 0,
            dtu: DtuStats::default(),
        }
    }
}

impl SimStats {
    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cycles = self.ticks / self.clock_period.max(1);

        if want("summary") {
            let events_per_sec = if seconds > 0.0 {
                self.events as f64 / seconds
            } else {
                0.0
            };
            println!("\n==========================================================");
            println!("DTU PLATFORM SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_ticks                {}", self.ticks);
            println!("sim_cycles               {cycles}");
            println!("sim_events               {}", self.events);
            println!("sim_event_rate           {events_per_sec:.2} /s");
            println!("sim_faults               {}", self.faults);
            println!("dtu.commands             {}", self.dtu.commands_executed);
            println!("dtu.errors               {}", self.dtu.errors);
            println!("----------------------------------------------------------");
        }
        if want("transmit") {
            let avg = if self.dtu.messages_sent > 0 {
                self.dtu.bytes_sent as f64 / self.dtu.messages_sent as f64
            } else {
                0.0
            };
            println!("TRANSMIT");
            println!("  msg.sent               {}", self.dtu.messages_sent);
            println!("  msg.bytes              {}", self.dtu.bytes_sent);
            println!("  msg.avg_size           {avg:.2}");
            println!("  msg.rejected           {}", self.dtu.transfers_rejected);
            println!("----------------------------------------------------------");
        }
        if want("receive") {
            println!("RECEIVE");
            println!("  msg.received           {}", self.dtu.messages_received);
            println!("  msg.bytes              {}", self.dtu.bytes_received);
            println!("  ring.released          {}", self.dtu.read_ptr_increments);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
