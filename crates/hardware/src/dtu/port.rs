//! Outbound interface of a DTU.
//!
//! The unit never touches the scratchpad, the NoC or the event queue directly.
//! Everything it issues goes through a `DtuPort`, which the platform implements
//! for each tile and tests implement with a recording double.

use crate::common::{DtuError, EpId, Tick};
use crate::soc::packet::Packet;

/// Deferred actions a DTU schedules on itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DtuEvent {
    /// Decode and dispatch the command register.
    ExecuteCommand,
    /// Clear the command register and the busy flag.
    FinishMessageTransmission,
    /// Advance the write pointer of a receive ring.
    IncrementWritePtr(EpId),
}

/// Collaborators of a DTU: clock, scratchpad port, NoC ports, core port and
/// event scheduler.
pub trait DtuPort {
    /// Current simulated time.
    fn cur_tick(&self) -> Tick;

    /// Performs a scratchpad access immediately and returns its response.
    ///
    /// Out-of-range accesses come back as error responses.
    fn send_atomic_spm(&mut self, pkt: Packet) -> Packet;

    /// Delivers a NoC request to its destination immediately.
    ///
    /// # Returns
    ///
    /// The outcome of the remote unit's handling of the request.
    fn send_atomic_noc(&mut self, pkt: Packet) -> Result<(), DtuError>;

    /// Issues a scratchpad request at `when`.
    fn sched_spm_request(&mut self, pkt: Packet, when: Tick);

    /// Issues a NoC request at `when`.
    fn sched_noc_request(&mut self, pkt: Packet, when: Tick);

    /// Sends the response to a NoC request at `when`.
    fn sched_noc_response(&mut self, pkt: Packet, when: Tick);

    /// Sends the response to a local-core access at `when`.
    fn sched_cpu_response(&mut self, pkt: Packet, when: Tick);

    /// Schedules a deferred action on the issuing unit.
    fn schedule(&mut self, event: DtuEvent, when: Tick);
}
