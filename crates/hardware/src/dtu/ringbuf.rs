//! Receive ring arithmetic.
//!
//! A receive endpoint owns a ring of fixed-size slots in the scratchpad. Each slot
//! is `max_message_size` bytes; the ring holds `slots` of them starting at the
//! buffer address. The write pointer names the next free slot and the read pointer
//! the oldest occupied one.
//!
//! Invariants maintained by `produce` and `consume`:
//!
//! * `0 <= count <= slots`
//! * both pointers stay in `[addr, addr + slots * slot_size)` and on a slot boundary

use super::regfile::{EpReg, RegFile};
use crate::common::{DtuError, EpId};

/// Advances a ring pointer by one slot, wrapping to the buffer start.
///
/// # Arguments
///
/// * `ptr` - Current pointer.
/// * `addr` - Buffer start.
/// * `slots` - Ring capacity in slots.
/// * `slot_size` - Slot size in bytes.
pub fn advance(ptr: u64, addr: u64, slots: u64, slot_size: u64) -> u64 {
    let next = ptr.wrapping_add(slot_size);
    let end = addr.saturating_add(slots.saturating_mul(slot_size));
    if next >= end { addr } else { next }
}

/// Snapshot of one endpoint's ring registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingState {
    /// Buffer start address.
    pub addr: u64,
    /// Capacity in slots.
    pub slots: u64,
    /// Oldest occupied slot.
    pub read_ptr: u64,
    /// Next free slot.
    pub write_ptr: u64,
    /// Number of occupied slots.
    pub count: u64,
}

impl RingState {
    /// Reads the ring registers of `ep`.
    pub fn load(regs: &RegFile, ep: EpId) -> Self {
        Self {
            addr: regs.read_ep_reg(ep, EpReg::BufferAddr),
            slots: regs.read_ep_reg(ep, EpReg::BufferSize),
            read_ptr: regs.read_ep_reg(ep, EpReg::BufferReadPtr),
            write_ptr: regs.read_ep_reg(ep, EpReg::BufferWritePtr),
            count: regs.read_ep_reg(ep, EpReg::BufferMessageCount),
        }
    }

    /// Writes the pointer and count registers of `ep` back.
    pub fn store(&self, regs: &mut RegFile, ep: EpId) {
        regs.set_ep_reg(ep, EpReg::BufferReadPtr, self.read_ptr);
        regs.set_ep_reg(ep, EpReg::BufferWritePtr, self.write_ptr);
        regs.set_ep_reg(ep, EpReg::BufferMessageCount, self.count);
    }

    /// Returns `true` when no slot is free.
    pub fn is_full(&self) -> bool {
        self.count >= self.slots
    }

    /// Returns `true` when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Address of the free slot `n` positions past the write pointer.
    pub fn free_slot(&self, n: u64, slot_size: u64) -> u64 {
        (0..n).fold(self.write_ptr, |ptr, _| {
            advance(ptr, self.addr, self.slots, slot_size)
        })
    }

    /// Marks the slot at the write pointer occupied.
    pub fn produce(&mut self, ep: EpId, slot_size: u64) -> Result<(), DtuError> {
        if self.is_full() {
            return Err(DtuError::BufferOverflow { ep });
        }
        self.write_ptr = advance(self.write_ptr, self.addr, self.slots, slot_size);
        self.count += 1;
        Ok(())
    }

    /// Releases the slot at the read pointer.
    pub fn consume(&mut self, ep: EpId, slot_size: u64) -> Result<(), DtuError> {
        if self.is_empty() {
            return Err(DtuError::BufferUnderflow { ep });
        }
        self.read_ptr = advance(self.read_ptr, self.addr, self.slots, slot_size);
        self.count -= 1;
        Ok(())
    }
}
