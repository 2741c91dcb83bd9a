//! Message header.
//!
//! Every NoC frame starts with a fixed 4-byte header naming the sender and the
//! payload length, followed by the payload bytes:
//!
//! ```text
//!  byte 0    byte 1    bytes 2..4
//! |--------|--------|-----------------|------------ ... --|
//! |  core  |   ep   |  length (LE16)  |      payload      |
//! |--------|--------|-----------------|------------ ... --|
//! ```
//!
//! The header is stored verbatim in the receive slot together with the payload.

use crate::common::constants::HEADER_SIZE;

/// Header prepended to every message frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    /// Core id of the sender.
    pub core_id: u8,
    /// Endpoint id of the sender.
    pub ep_id: u8,
    /// Payload length in bytes.
    pub length: u16,
}

impl MessageHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = HEADER_SIZE;

    /// Creates a header.
    pub fn new(core_id: u8, ep_id: u8, length: u16) -> Self {
        Self {
            core_id,
            ep_id,
            length,
        }
    }

    /// Encodes the header into its wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let len = self.length.to_le_bytes();
        [self.core_id, self.ep_id, len[0], len[1]]
    }

    /// Decodes a header from the start of a frame.
    ///
    /// # Returns
    ///
    /// `None` if the frame is shorter than a header.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [core_id, ep_id, lo, hi, ..] => Some(Self {
                core_id: *core_id,
                ep_id: *ep_id,
                length: u16::from_le_bytes([*lo, *hi]),
            }),
            _ => None,
        }
    }

    /// Builds a complete frame: this header followed by `payload`.
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.to_bytes());
        frame.extend_from_slice(payload);
        frame
    }
}
