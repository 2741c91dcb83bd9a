//! Scratchpad controller latency models.
//!
//! This module provides:
//! 1. **MemoryController:** The latency hook consulted on every scratchpad access.
//! 2. **SimpleController:** Fixed latency per access.
//!
//! Controllers are `Send + Sync` so a platform can be moved across threads.

/// Trait for memory controller implementations that report access latency in cycles.
pub trait MemoryController: Send + Sync + std::fmt::Debug {
    /// Returns the number of cycles required for an access to the given address.
    ///
    /// # Arguments
    ///
    /// * `addr` - Scratchpad address being accessed.
    ///
    /// # Returns
    ///
    /// Latency in simulation cycles.
    fn access_latency(&mut self, addr: u64) -> u64;
}

/// Fixed-latency memory controller; every access takes the same number of cycles.
#[derive(Clone, Copy, Debug)]
pub struct SimpleController {
    latency: u64,
}

impl SimpleController {
    /// Creates a simple controller with the given fixed latency in cycles.
    ///
    /// # Arguments
    ///
    /// * `latency` - Cycles per access.
    pub fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: u64) -> u64 {
        self.latency
    }
}
