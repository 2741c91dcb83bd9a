//! DTU and configuration error definitions.
//!
//! This module defines the two failure families of the simulator. It provides:
//! 1. **Runtime errors:** `DtuError`, returned by every trigger of the unit (command
//!    dispatch, frame reception, completions). A misbehaving local program produces one
//!    of these instead of halting the simulation.
//! 2. **Startup errors:** `ConfigError`, returned while validating a `Config`. These are
//!    fatal for the platform being built but never occur once simulation has started.

use thiserror::Error;

use super::{CoreId, EpId};

/// Failure of a single DTU operation.
///
/// Every variant is a terminal outcome of the operation that produced it; nothing in the
/// unit retries. The busy flag visible to the local core is cleared before any error that
/// occurs after a transmission has started is reported.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DtuError {
    /// The command register holds an opcode outside `Idle`, `StartOperation` and
    /// `IncrementReadPtr`. The associated value is the raw opcode field.
    #[error("invalid opcode {0:#x}")]
    InvalidOpcode(u64),

    /// An endpoint id does not name one of the configured endpoints.
    #[error("endpoint {ep} out of range (unit has {num_endpoints} endpoints)")]
    EndpointOutOfRange {
        /// Requested endpoint id as decoded from the command or NoC address.
        ep: u64,
        /// Number of endpoints of the unit.
        num_endpoints: usize,
    },

    /// The operation does not match the endpoint's configured mode, or the mode register
    /// holds an unknown value.
    #[error("endpoint {ep}: operation not permitted in mode {mode:#x}")]
    InvalidEndpointMode {
        /// Endpoint id.
        ep: EpId,
        /// Raw value of the endpoint's mode register.
        mode: u64,
    },

    /// A transmission was started with a message size of zero.
    #[error("endpoint {ep}: message is empty")]
    EmptyMessage {
        /// Endpoint id.
        ep: EpId,
    },

    /// A message (plus its header) does not fit into one receive slot.
    #[error("endpoint {ep}: message of {size} bytes exceeds the limit of {max} bytes")]
    MessageTooLarge {
        /// Endpoint id.
        ep: EpId,
        /// Offending size in bytes (payload for transmit, whole frame for receive).
        size: u64,
        /// Configured maximum message size.
        max: u64,
    },

    /// An inbound frame targets a receive ring that has no free slot.
    #[error("endpoint {ep}: receive buffer full")]
    BufferOverflow {
        /// Endpoint id.
        ep: EpId,
    },

    /// `IncrementReadPtr` was issued on an empty receive ring.
    #[error("endpoint {ep}: receive buffer empty")]
    BufferUnderflow {
        /// Endpoint id.
        ep: EpId,
    },

    /// `StartOperation` was issued while the unit is still transmitting.
    #[error("endpoint {ep}: unit busy with an outstanding transmission")]
    EndpointBusy {
        /// Endpoint id of the rejected command.
        ep: EpId,
    },

    /// The request names a feature the unit does not implement.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    /// A local-core access does not map onto exactly one register.
    #[error("invalid register access at offset {offset:#x} ({size} bytes)")]
    InvalidRegisterAccess {
        /// Offset relative to the unit's MMIO base.
        offset: u64,
        /// Access size in bytes.
        size: usize,
    },

    /// A scratchpad access leaves the scratchpad.
    #[error("scratchpad access fault at {addr:#x} ({size} bytes)")]
    SpmAccessFault {
        /// Scratchpad address.
        addr: u64,
        /// Access size in bytes.
        size: usize,
    },

    /// A NoC packet names a core that is not part of the platform.
    #[error("no route to core {core}")]
    Unroutable {
        /// Destination core id.
        core: CoreId,
    },

    /// A request completed without the correlation tag its issuer attached.
    #[error("completion without correlation tag")]
    MissingTag,

    /// A completion carries a memory command the pipeline leg did not issue.
    #[error("unexpected {found} for {context}")]
    UnexpectedCommand {
        /// Pipeline leg that received the packet.
        context: &'static str,
        /// Command name of the received packet.
        found: &'static str,
    },

    /// The remote unit answered a message with an error response.
    #[error("transfer rejected by remote unit (sender endpoint {ep})")]
    TransferRejected {
        /// Sending endpoint id.
        ep: EpId,
    },
}

/// Invalid platform or unit configuration, detected before simulation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The command register fields do not fit into one register.
    #[error(
        "command layout needs {opcode} + {epid} + {offset} bits but the register has {width}"
    )]
    CommandLayout {
        /// Width of the opcode field.
        opcode: u32,
        /// Width of the endpoint id field.
        epid: u32,
        /// Width of the offset field.
        offset: u32,
        /// Register width in bits.
        width: u32,
    },

    /// A numeric parameter is outside its permitted range.
    #[error("{name} = {value} is invalid: {reason}")]
    InvalidValue {
        /// Parameter name (dotted path within the configuration).
        name: &'static str,
        /// Offending value.
        value: u64,
        /// Human-readable constraint.
        reason: &'static str,
    },

    /// The configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}
