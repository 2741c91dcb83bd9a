//! NoC address type.
//!
//! A NoC address names one endpoint of one DTU. The endpoint id occupies the
//! low-order `ep_bits` bits and the core id the bits above them:
//!
//! ```text
//!   NOC ADDRESS                    0
//! |--------------------------------|
//! |      core id     |    ep id    |
//! |--------------------------------|
//! ```

use super::{CoreId, EpId};

/// Destination of a NoC packet: one endpoint at one core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NocAddr {
    /// Target core id.
    pub core_id: CoreId,
    /// Target endpoint id at that core.
    pub ep_id: EpId,
}

impl NocAddr {
    /// Creates a new NoC address.
    #[inline]
    pub fn new(core_id: CoreId, ep_id: EpId) -> Self {
        Self { core_id, ep_id }
    }

    /// Encodes the address into its raw packet form.
    ///
    /// # Arguments
    ///
    /// * `ep_bits` - Number of low-order bits holding the endpoint id.
    ///
    /// # Returns
    ///
    /// `core_id << ep_bits | ep_id`, with `ep_id` masked to `ep_bits`.
    pub fn encode(&self, ep_bits: u32) -> u64 {
        ((self.core_id as u64) << ep_bits) | (self.ep_id as u64 & Self::ep_mask(ep_bits))
    }

    /// Decodes a raw packet address.
    ///
    /// # Arguments
    ///
    /// * `raw` - Packet address.
    /// * `ep_bits` - Number of low-order bits holding the endpoint id.
    pub fn decode(raw: u64, ep_bits: u32) -> Self {
        Self {
            core_id: (raw >> ep_bits) as CoreId,
            ep_id: (raw & Self::ep_mask(ep_bits)) as EpId,
        }
    }

    /// Mask selecting the endpoint id bits.
    #[inline(always)]
    pub fn ep_mask(ep_bits: u32) -> u64 {
        (1u64 << ep_bits) - 1
    }
}
