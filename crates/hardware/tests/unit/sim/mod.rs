//! Tests for the simulation driver.

/// Clock edge arithmetic.
pub mod clock;

/// Event queue ordering.
pub mod event;
