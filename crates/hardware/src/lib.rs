//! DTU platform simulator library.
//!
//! This crate models the data transfer unit (DTU) of a tiled many-core system with the following:
//! 1. **DTU:** Command decoding, register file, endpoint table, transmit and receive pipelines.
//! 2. **SoC:** Scratchpad memories, packets, and the network-on-chip between tiles.
//! 3. **Simulation:** Clock arithmetic, event queue, and the multi-tile platform (atomic or timed).
//! 4. **Support:** Configuration, error types, and statistics.

/// Common types and constants (addresses, memory commands, errors).
pub mod common;
/// Simulator configuration (defaults, timing mode, hierarchical config structures).
pub mod config;
/// Data transfer unit (command, registers, header, rings, tags, pipelines).
pub mod dtu;
/// Clock, event queue and platform.
pub mod sim;
/// Tile components (packets, scratchpad, NoC, device trait).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load it from JSON.
pub use crate::config::Config;
/// The data transfer unit.
pub use crate::dtu::Dtu;
/// Multi-tile platform; construct with `Platform::new`.
pub use crate::sim::Platform;
