//! System-on-Chip (SoC) Components.
//!
//! This module organizes the components of a tile and the fabric between tiles:
//! packets, the scratchpad memory with its controller, and the network-on-chip.

/// Scratchpad memory and its controller.
pub mod memory;

/// Network-on-chip routing and transit time.
pub mod noc;

/// Request/response packets.
pub mod packet;

/// Device trait definitions for memory access.
pub mod traits;

pub use memory::Scratchpad;
pub use noc::Noc;
pub use packet::Packet;
