//! DTU register file.
//!
//! Holds the unit-wide registers (status and command) and the per-endpoint
//! register sets that make up the endpoint table. All state of the unit that is
//! visible to the local core lives here.
//!
//! # Memory Map
//!
//! Registers are 8 bytes wide and laid out contiguously from the unit's MMIO base:
//!
//! * `0x00`: STATUS (busy flag, read-only for the core)
//! * `0x08`: COMMAND
//! * `0x10 + (ep * NUM_EP_REGS + reg) * 8`: endpoint registers

use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::trace;

use crate::common::constants::REG_SIZE;
use crate::common::{DtuError, EpId, MemCmd};
use crate::soc::packet::Packet;

/// Unit-wide registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u64)]
pub enum DtuReg {
    /// Non-zero while a transmission is outstanding.
    Status,
    /// Command register; writing it triggers command execution.
    Command,
}

/// Number of unit-wide registers.
pub const NUM_DTU_REGS: usize = 2;

/// Per-endpoint registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u64)]
pub enum EpReg {
    /// Endpoint mode (`EpMode`).
    Mode,
    /// Scratchpad address of the message to transmit.
    MessageAddr,
    /// Size in bytes of the message to transmit.
    MessageSize,
    /// Scratchpad address of the receive ring.
    BufferAddr,
    /// Capacity of the receive ring in slots.
    BufferSize,
    /// Address of the oldest occupied slot.
    BufferReadPtr,
    /// Address of the next free slot.
    BufferWritePtr,
    /// Number of occupied slots.
    BufferMessageCount,
    /// Core that transmitted messages are sent to.
    TargetCoreId,
    /// Endpoint at the target core that transmitted messages are sent to.
    TargetEpId,
}

/// Number of registers per endpoint.
pub const NUM_EP_REGS: usize = 10;

/// Endpoint modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u64)]
pub enum EpMode {
    /// The endpoint owns a receive ring.
    ReceiveMessage,
    /// The endpoint transmits the message it points to.
    TransmitMessage,
}

/// Host-side endpoint setup, written straight into the register file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointConfig {
    /// Transmit endpoint.
    Transmit {
        /// Scratchpad address of the message.
        message_addr: u64,
        /// Message size in bytes.
        message_size: u64,
        /// Destination core.
        target_core: u64,
        /// Destination endpoint.
        target_ep: u64,
    },
    /// Receive endpoint with an empty ring.
    Receive {
        /// Scratchpad address of the ring.
        buffer_addr: u64,
        /// Ring capacity in slots.
        slots: u64,
    },
}

/// Register file of one DTU.
#[derive(Clone, Debug)]
pub struct RegFile {
    dtu_regs: [u64; NUM_DTU_REGS],
    ep_regs: Vec<[u64; NUM_EP_REGS]>,
}

impl RegFile {
    /// Creates a zeroed register file.
    ///
    /// All endpoints start in `ReceiveMessage` mode with an empty, zero-sized ring.
    ///
    /// # Arguments
    ///
    /// * `num_endpoints` - Number of endpoint register sets.
    pub fn new(num_endpoints: usize) -> Self {
        Self {
            dtu_regs: [0; NUM_DTU_REGS],
            ep_regs: vec![[0; NUM_EP_REGS]; num_endpoints],
        }
    }

    /// Number of endpoints.
    pub fn num_endpoints(&self) -> usize {
        self.ep_regs.len()
    }

    /// Size of the MMIO window in bytes.
    pub fn size(&self) -> u64 {
        (NUM_DTU_REGS + self.ep_regs.len() * NUM_EP_REGS) as u64 * REG_SIZE
    }

    /// Reads a unit-wide register.
    #[inline]
    pub fn read_dtu_reg(&self, reg: DtuReg) -> u64 {
        self.dtu_regs[reg as usize]
    }

    /// Writes a unit-wide register.
    #[inline]
    pub fn set_dtu_reg(&mut self, reg: DtuReg, value: u64) {
        self.dtu_regs[reg as usize] = value;
    }

    /// Reads an endpoint register. `ep` must be below `num_endpoints()`.
    #[inline]
    pub fn read_ep_reg(&self, ep: EpId, reg: EpReg) -> u64 {
        self.ep_regs[ep][reg as usize]
    }

    /// Writes an endpoint register. `ep` must be below `num_endpoints()`.
    #[inline]
    pub fn set_ep_reg(&mut self, ep: EpId, reg: EpReg, value: u64) {
        self.ep_regs[ep][reg as usize] = value;
    }

    /// Applies a host-side endpoint configuration.
    ///
    /// A receive configuration also resets the ring: both pointers to the buffer
    /// start and the message count to zero.
    pub fn configure_endpoint(&mut self, ep: EpId, config: &EndpointConfig) {
        match *config {
            EndpointConfig::Transmit {
                message_addr,
                message_size,
                target_core,
                target_ep,
            } => {
                self.set_ep_reg(ep, EpReg::Mode, EpMode::TransmitMessage.into());
                self.set_ep_reg(ep, EpReg::MessageAddr, message_addr);
                self.set_ep_reg(ep, EpReg::MessageSize, message_size);
                self.set_ep_reg(ep, EpReg::TargetCoreId, target_core);
                self.set_ep_reg(ep, EpReg::TargetEpId, target_ep);
            }
            EndpointConfig::Receive { buffer_addr, slots } => {
                self.set_ep_reg(ep, EpReg::Mode, EpMode::ReceiveMessage.into());
                self.set_ep_reg(ep, EpReg::BufferAddr, buffer_addr);
                self.set_ep_reg(ep, EpReg::BufferSize, slots);
                self.set_ep_reg(ep, EpReg::BufferReadPtr, buffer_addr);
                self.set_ep_reg(ep, EpReg::BufferWritePtr, buffer_addr);
                self.set_ep_reg(ep, EpReg::BufferMessageCount, 0);
            }
        }
    }

    /// MMIO offset of a unit-wide register.
    pub fn dtu_reg_offset(reg: DtuReg) -> u64 {
        u64::from(reg) * REG_SIZE
    }

    /// MMIO offset of an endpoint register.
    pub fn ep_reg_offset(ep: EpId, reg: EpReg) -> u64 {
        (NUM_DTU_REGS as u64 + (ep * NUM_EP_REGS) as u64 + u64::from(reg)) * REG_SIZE
    }

    /// Applies a local-core access to the register file.
    ///
    /// The packet address is relative to the MMIO base. Only aligned, register-sized
    /// accesses are accepted. On success the packet is turned into its response (read
    /// data filled in). Writes to STATUS are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the access wrote the command register.
    pub fn handle_request(&mut self, pkt: &mut Packet) -> Result<bool, DtuError> {
        let offset = pkt.addr();
        let size = pkt.size();
        if size as u64 != REG_SIZE || offset % REG_SIZE != 0 || offset >= self.size() {
            return Err(DtuError::InvalidRegisterAccess { offset, size });
        }

        let index = (offset / REG_SIZE) as usize;
        let slot = if index < NUM_DTU_REGS {
            &mut self.dtu_regs[index]
        } else {
            let rel = index - NUM_DTU_REGS;
            &mut self.ep_regs[rel / NUM_EP_REGS][rel % NUM_EP_REGS]
        };

        let mut command_written = false;
        match pkt.cmd() {
            MemCmd::ReadReq => {
                trace!(offset, value = *slot, "register read");
                pkt.data_mut().copy_from_slice(&slot.to_le_bytes());
            }
            MemCmd::WriteReq => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(pkt.data());
                let value = u64::from_le_bytes(bytes);
                trace!(offset, value, "register write");
                if index == DtuReg::Status as usize {
                    trace!("ignoring write to read-only status register");
                } else {
                    *slot = value;
                    command_written = index == DtuReg::Command as usize;
                }
            }
            MemCmd::ReadResp | MemCmd::WriteResp => {
                return Err(DtuError::UnexpectedCommand {
                    context: "register access",
                    found: pkt.cmd().name(),
                });
            }
        }

        pkt.make_response();
        Ok(command_written)
    }
}
