//! Data Transfer Unit (DTU).
//!
//! This module implements the per-core unit that moves messages between cores. It includes:
//! 1. **Command:** Decoding of the command register into opcode, endpoint and offset.
//! 2. **Register File:** Unit-wide and per-endpoint registers exposed to the local core.
//! 3. **Wire Format:** The message header prefixed to every NoC frame.
//! 4. **Receive Rings:** Slot arithmetic of the per-endpoint receive buffers.
//! 5. **Correlation:** Tags that route completions back to the leg that issued them.
//! 6. **Unit:** The transmit and receive pipelines, in atomic and timed mode.

/// Command register decoding.
pub mod command;

/// Message header wire format.
pub mod header;

/// Outbound interface to scratchpad, NoC, core and scheduler.
pub mod port;

/// Register file and endpoint table.
pub mod regfile;

/// Receive ring arithmetic.
pub mod ringbuf;

/// Request correlation tags.
pub mod tag;

/// The unit and its pipelines.
pub mod unit;

pub use command::{Command, CommandLayout, CommandOpcode};
pub use header::MessageHeader;
pub use port::{DtuEvent, DtuPort};
pub use regfile::{DtuReg, EndpointConfig, EpMode, EpReg, RegFile};
pub use unit::Dtu;
