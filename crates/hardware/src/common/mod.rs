//! Common utilities and types used throughout the DTU simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Address Types:** NoC addresses naming an endpoint at a core.
//! 2. **Constants:** Register width, header size, and simulation limits.
//! 3. **Memory Commands:** Read/write request and response commands carried by packets.
//! 4. **Error Handling:** Runtime DTU errors and startup configuration errors.

/// NoC address type.
pub mod addr;

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory command definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::NocAddr;
pub use constants::{HEADER_SIZE, REG_BITS, REG_SIZE};
pub use data::MemCmd;
pub use error::{ConfigError, DtuError};

/// Simulated time in ticks.
pub type Tick = u64;

/// Simulated time in clock cycles of a unit.
pub type Cycles = u64;

/// Index of a core (and thus of its DTU and scratchpad) on the platform.
pub type CoreId = usize;

/// Index of an endpoint within one DTU.
pub type EpId = usize;
