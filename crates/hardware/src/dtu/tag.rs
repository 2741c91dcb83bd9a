//! Request correlation tags.
//!
//! A packet issued by the unit carries exactly one tag so that its completion can
//! be routed back to the right pipeline leg. The tag is consumed when the
//! completion is handled.

use crate::common::EpId;

/// Tag of a scratchpad request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpmTag {
    /// Read of the message to transmit from endpoint `ep`.
    LocalTransmit {
        /// Transmitting endpoint.
        ep: EpId,
    },
    /// Write of an inbound frame into the receive ring of endpoint `ep`.
    ForwardedReceive {
        /// Receiving endpoint.
        ep: EpId,
    },
}

/// Tag of a NoC request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NocTag {
    /// The packet is a message frame.
    Message,
    /// The packet is a raw memory access.
    MemoryAccess,
}

/// Correlation tag carried by a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    /// Scratchpad request tag.
    Spm(SpmTag),
    /// NoC request tag.
    Noc(NocTag),
}

impl From<SpmTag> for Tag {
    fn from(tag: SpmTag) -> Self {
        Self::Spm(tag)
    }
}

impl From<NocTag> for Tag {
    fn from(tag: NocTag) -> Self {
        Self::Noc(tag)
    }
}
