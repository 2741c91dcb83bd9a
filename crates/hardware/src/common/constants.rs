//! Global System Constants.
//!
//! This module defines constants shared by the DTU, the scratchpad and the NoC. It includes:
//! 1. **Register Constants:** Register width and size of one register in the MMIO map.
//! 2. **Wire Constants:** Size of the message header that prefixes every NoC frame.
//! 3. **Simulation Constants:** Limits guarding runaway simulations.

/// Width of a DTU register in bits.
pub const REG_BITS: u32 = u64::BITS;

/// Size of one DTU register in the MMIO map, in bytes.
pub const REG_SIZE: u64 = 8;

/// Size of the `MessageHeader` prefix of every NoC frame, in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest core id a message header can carry.
pub const MAX_HEADER_CORE_ID: u64 = u8::MAX as u64;

/// Largest endpoint id a message header can carry.
pub const MAX_HEADER_EP_ID: u64 = u8::MAX as u64;

/// Number of events after which `Platform::run` gives up on a non-draining queue.
pub const MAX_EVENTS_PER_RUN: u64 = 10_000_000;
