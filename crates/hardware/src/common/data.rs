//! Memory Command Types.
//!
//! This module defines the command carried by every packet in the simulator.
//! These types are used for the following:
//! 1. **Direction:** Distinguishing reads from writes at the scratchpad and the NoC.
//! 2. **Request/Response Pairing:** A request is turned into its response in place once
//!    the target has handled it.
//! 3. **Validation:** Completion handlers reject packets whose command does not match
//!    the pipeline leg that issued them.

/// Command of a memory or NoC packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemCmd {
    /// Read request; the target fills the packet's data.
    ReadReq,
    /// Response to a read request carrying the read data.
    ReadResp,
    /// Write request carrying the data to store.
    WriteReq,
    /// Acknowledgement of a write request.
    WriteResp,
}

impl MemCmd {
    /// Returns `true` for `ReadReq` and `ReadResp`.
    #[inline]
    pub fn is_read(self) -> bool {
        matches!(self, Self::ReadReq | Self::ReadResp)
    }

    /// Returns `true` for `WriteReq` and `WriteResp`.
    #[inline]
    pub fn is_write(self) -> bool {
        !self.is_read()
    }

    /// Returns `true` for `ReadResp` and `WriteResp`.
    #[inline]
    pub fn is_response(self) -> bool {
        matches!(self, Self::ReadResp | Self::WriteResp)
    }

    /// Returns the response command matching this request.
    ///
    /// Responses map to themselves.
    pub fn response(self) -> Self {
        match self {
            Self::ReadReq | Self::ReadResp => Self::ReadResp,
            Self::WriteReq | Self::WriteResp => Self::WriteResp,
        }
    }

    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::ReadReq => "ReadReq",
            Self::ReadResp => "ReadResp",
            Self::WriteReq => "WriteReq",
            Self::WriteResp => "WriteResp",
        }
    }
}
