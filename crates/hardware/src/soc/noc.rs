//! Network-on-chip.
//!
//! The NoC connects the DTUs of all tiles. It routes a request by the core id in its
//! NoC address and a response back to the core that issued the request. Routing is
//! instantaneous; the transport time is recorded in the packet's delay fields and
//! charged by the receiving unit.

use crate::common::{CoreId, NocAddr, Tick};
use crate::config::NocConfig;
use crate::sim::clock::Clock;
use crate::soc::packet::Packet;

/// Crossbar between all tiles.
#[derive(Clone, Debug)]
pub struct Noc {
    /// Link width in bytes per cycle.
    pub width_bytes: u64,
    /// Base latency in cycles per packet.
    pub latency_cycles: u64,
    ep_bits: u32,
    clock: Clock,
}

impl Noc {
    /// Creates a NoC.
    ///
    /// # Arguments
    ///
    /// * `config` - Link parameters.
    /// * `ep_bits` - Bits of a NoC address holding the endpoint id.
    /// * `clock` - Clock the link runs at.
    pub fn new(config: &NocConfig, ep_bits: u32, clock: Clock) -> Self {
        Self {
            width_bytes: config.width_bytes.max(1),
            latency_cycles: config.latency_cycles,
            ep_bits,
            clock,
        }
    }

    /// Bits of a NoC address holding the endpoint id.
    pub fn ep_bits(&self) -> u32 {
        self.ep_bits
    }

    /// Core a request is routed to.
    pub fn route(&self, pkt: &Packet) -> CoreId {
        NocAddr::decode(pkt.addr(), self.ep_bits).core_id
    }

    /// Returns the number of cycles to transfer the given number of bytes.
    ///
    /// # Returns
    ///
    /// Cycles = base latency plus ceiling(bytes / width_bytes) transfers.
    pub fn calculate_transit_time(&self, bytes: usize) -> u64 {
        self.latency_cycles + (bytes as u64).div_ceil(self.width_bytes)
    }

    /// Charges the transport of `pkt` to its delay fields.
    ///
    /// The header arrives after the base latency; the payload follows one transfer
    /// per link width.
    pub fn annotate(&self, pkt: &mut Packet) {
        let transfers = (pkt.size() as u64).div_ceil(self.width_bytes);
        pkt.header_delay = pkt
            .header_delay
            .saturating_add(self.clock.cycles_to_ticks(self.latency_cycles));
        pkt.payload_delay = pkt
            .payload_delay
            .saturating_add(self.clock.cycles_to_ticks(transfers));
    }

    /// Total transport time of `pkt` in ticks, as charged by `annotate`.
    pub fn transit_ticks(&self, pkt: &Packet) -> Tick {
        self.clock
            .cycles_to_ticks(self.calculate_transit_time(pkt.size()))
    }
}
