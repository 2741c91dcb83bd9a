//! Command register decoding.
//!
//! The local core starts every operation by writing one word into the command
//! register. The word is split into three fields, low to high:
//!
//! ```text
//!   COMMAND                        0
//! |--------------------------------|
//! |  offset  |   epid   |  opcode  |
//! |--------------------------------|
//! ```
//!
//! The field widths are configurable; `CommandLayout::new` rejects layouts that do
//! not fit into one register. Decoding is pure: the same raw value always yields the
//! same `Command`.

use crate::common::constants::REG_BITS;
use crate::common::{ConfigError, EpId};
use crate::config::DtuConfig;

/// Operation requested by the command register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOpcode {
    /// No operation.
    Idle,
    /// Starts the operation configured on the endpoint (message transmission).
    StartOperation,
    /// Releases the oldest slot of a receive ring.
    IncrementReadPtr,
    /// Any other opcode value; dispatching it fails.
    Invalid(u64),
}

impl CommandOpcode {
    /// Raw encoding of the opcode.
    pub fn bits(self) -> u64 {
        match self {
            Self::Idle => 0,
            Self::StartOperation => 1,
            Self::IncrementReadPtr => 2,
            Self::Invalid(raw) => raw,
        }
    }
}

impl From<u64> for CommandOpcode {
    fn from(raw: u64) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::StartOperation,
            2 => Self::IncrementReadPtr,
            other => Self::Invalid(other),
        }
    }
}

/// A decoded command. Not persisted; re-decoded from the register on every trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    /// Requested operation.
    pub opcode: CommandOpcode,
    /// Endpoint the operation applies to.
    pub ep_id: EpId,
    /// Operation-specific offset.
    pub offset: u64,
}

impl Command {
    /// Creates a command.
    pub fn new(opcode: CommandOpcode, ep_id: EpId, offset: u64) -> Self {
        Self {
            opcode,
            ep_id,
            offset,
        }
    }
}

/// Bit layout of the command register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandLayout {
    opcode_bits: u32,
    epid_bits: u32,
    offset_bits: u32,
}

impl CommandLayout {
    /// Creates a layout from field widths.
    ///
    /// # Arguments
    ///
    /// * `opcode_bits` - Width of the opcode field (at least one bit).
    /// * `epid_bits` - Width of the endpoint id field.
    /// * `offset_bits` - Width of the offset field.
    ///
    /// # Returns
    ///
    /// The layout, or `ConfigError::CommandLayout` if the fields exceed the register width.
    pub fn new(opcode_bits: u32, epid_bits: u32, offset_bits: u32) -> Result<Self, ConfigError> {
        let used = u64::from(opcode_bits) + u64::from(epid_bits) + u64::from(offset_bits);
        if opcode_bits == 0 || used > u64::from(REG_BITS) {
            return Err(ConfigError::CommandLayout {
                opcode: opcode_bits,
                epid: epid_bits,
                offset: offset_bits,
                width: REG_BITS,
            });
        }
        Ok(Self {
            opcode_bits,
            epid_bits,
            offset_bits,
        })
    }

    /// Creates the layout described by a unit configuration.
    pub fn from_config(config: &DtuConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.num_cmd_opcode_bits,
            config.num_cmd_epid_bits,
            config.num_cmd_offset_bits,
        )
    }

    /// Splits a raw command register value into its fields.
    pub fn decode(&self, raw: u64) -> Command {
        let epid_shift = self.opcode_bits;
        let offset_shift = self.opcode_bits + self.epid_bits;

        let opcode = raw & field_mask(self.opcode_bits);
        let ep_id = shr(raw, epid_shift) & field_mask(self.epid_bits);
        let offset = shr(raw, offset_shift) & field_mask(self.offset_bits);

        Command {
            opcode: CommandOpcode::from(opcode),
            ep_id: ep_id as EpId,
            offset,
        }
    }

    /// Packs a command into a raw register value.
    ///
    /// Fields wider than their slot are truncated, as the hardware would.
    pub fn encode(&self, cmd: &Command) -> u64 {
        let epid_shift = self.opcode_bits;
        let offset_shift = self.opcode_bits + self.epid_bits;

        (cmd.opcode.bits() & field_mask(self.opcode_bits))
            | shl(cmd.ep_id as u64 & field_mask(self.epid_bits), epid_shift)
            | shl(cmd.offset & field_mask(self.offset_bits), offset_shift)
    }

    /// Width of the opcode field.
    pub fn opcode_bits(&self) -> u32 {
        self.opcode_bits
    }

    /// Width of the endpoint id field.
    pub fn epid_bits(&self) -> u32 {
        self.epid_bits
    }

    /// Width of the offset field.
    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }
}

/// Mask of the low `bits` bits; a zero-width field selects nothing.
fn field_mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn shr(value: u64, shift: u32) -> u64 {
    value.checked_shr(shift).unwrap_or(0)
}

fn shl(value: u64, shift: u32) -> u64 {
    value.checked_shl(shift).unwrap_or(0)
}
