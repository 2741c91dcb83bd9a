//! Simulation driver.
//!
//! Provides the clock arithmetic, the discrete event queue and the multi-tile
//! platform that ties DTUs, scratchpads and the NoC together.

/// Clock domain arithmetic.
pub mod clock;

/// Discrete event queue.
pub mod event;

/// Multi-tile platform.
pub mod platform;

pub use clock::Clock;
pub use platform::{Fault, Platform};
