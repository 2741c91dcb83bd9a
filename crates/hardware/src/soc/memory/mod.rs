//! Scratchpad Memory (SPM).
//!
//! This module implements the per-tile scratchpad the DTU reads messages from and
//! writes receive rings into. It provides:
//! 1. **Storage:** A flat byte array addressed from zero.
//! 2. **Packet access:** Read and write requests turned into responses in place.
//! 3. **Controller:** Latency modeling for timed simulation.

/// Memory controller implementations for access latency modeling.
pub mod controller;

use tracing::trace;

use self::controller::{MemoryController, SimpleController};
use crate::common::{Cycles, MemCmd};
use crate::soc::packet::Packet;
use crate::soc::traits::Device;

/// Scratchpad of one tile.
#[derive(Debug)]
pub struct Scratchpad {
    data: Vec<u8>,
    controller: Box<dyn MemoryController>,
}

impl Scratchpad {
    /// Creates a zeroed scratchpad.
    ///
    /// # Arguments
    ///
    /// * `size` - Size in bytes.
    /// * `controller` - Latency model.
    pub fn new(size: usize, controller: Box<dyn MemoryController>) -> Self {
        Self {
            data: vec![0; size],
            controller,
        }
    }

    /// Creates a zeroed scratchpad with a fixed access latency.
    pub fn with_latency(size: usize, latency: Cycles) -> Self {
        Self::new(size, Box::new(SimpleController::new(latency)))
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` for a zero-sized scratchpad.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Loads a byte slice at a specific offset.
    ///
    /// Used for placing messages during setup; out-of-range loads are ignored.
    ///
    /// # Arguments
    ///
    /// * `data` - The data to write.
    /// * `offset` - The byte offset.
    pub fn load(&mut self, data: &[u8], offset: usize) {
        if let Some(dst) = offset
            .checked_add(data.len())
            .and_then(|end| self.data.get_mut(offset..end))
        {
            dst.copy_from_slice(data);
        }
    }

    /// Returns `len` bytes at `offset`, or `None` if the range leaves the scratchpad.
    pub fn slice(&self, offset: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        self.data.get(start..start.checked_add(len)?)
    }

    /// Performs a packet access and turns the packet into its response.
    ///
    /// Accesses leaving the scratchpad, and packets that are not requests, come back
    /// as error responses.
    ///
    /// # Returns
    ///
    /// Access latency in cycles.
    pub fn access(&mut self, pkt: &mut Packet) -> Cycles {
        let latency = self.controller.access_latency(pkt.addr());
        let addr = pkt.addr();
        let size = pkt.size();

        if !self.contains(addr, size) {
            trace!(addr = format_args!("{addr:#x}"), size, "scratchpad access out of range");
            pkt.make_error_response();
            return latency;
        }

        let start = addr as usize;
        match pkt.cmd() {
            MemCmd::ReadReq => {
                pkt.data_mut()
                    .copy_from_slice(&self.data[start..start + size]);
            }
            MemCmd::WriteReq => {
                self.data[start..start + size].copy_from_slice(pkt.data());
            }
            MemCmd::ReadResp | MemCmd::WriteResp => {
                pkt.make_error_response();
                return latency;
            }
        }
        pkt.make_response();
        latency
    }
}

impl Device for Scratchpad {
    fn name(&self) -> &str {
        "SPM"
    }

    fn address_range(&self) -> (u64, u64) {
        (0, self.data.len() as u64)
    }

    fn read_u8(&self, offset: u64) -> u8 {
        usize::try_from(offset)
            .ok()
            .and_then(|i| self.data.get(i))
            .copied()
            .unwrap_or(0)
    }

    fn write_u8(&mut self, offset: u64, val: u8) {
        if let Some(byte) = usize::try_from(offset)
            .ok()
            .and_then(|i| self.data.get_mut(i))
        {
            *byte = val;
        }
    }

    fn read_bytes(&self, offset: u64, buf: &mut [u8]) {
        match self.slice(offset, buf.len()) {
            Some(src) => buf.copy_from_slice(src),
            None => buf.fill(0),
        }
    }

    fn write_bytes(&mut self, offset: u64, data: &[u8]) {
        if let Ok(offset) = usize::try_from(offset) {
            self.load(data, offset);
        }
    }
}
