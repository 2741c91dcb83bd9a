//! Memory and NoC packets.
//!
//! A `Packet` is the unit of every transaction in the simulator: local-core register
//! accesses, scratchpad reads and writes, and NoC frames. A request is turned into
//! its response in place by the component that handles it, so the same packet
//! travels out and back.
//!
//! Every packet carries two accumulated delay fields. The NoC charges the time of
//! the header and of the payload separately; the receiving unit folds both into its
//! next scheduling decision and clears them.

use crate::common::{CoreId, MemCmd, Tick};
use crate::dtu::tag::Tag;

/// A request or response travelling between units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    addr: u64,
    cmd: MemCmd,
    data: Vec<u8>,
    error: bool,
    src_core: Option<CoreId>,
    tag: Option<Tag>,
    /// Delay until the header is available at the receiver, in ticks.
    pub header_delay: Tick,
    /// Additional delay until the last payload byte arrives, in ticks.
    pub payload_delay: Tick,
}

impl Packet {
    fn new(addr: u64, cmd: MemCmd, data: Vec<u8>) -> Self {
        Self {
            addr,
            cmd,
            data,
            error: false,
            src_core: None,
            tag: None,
            header_delay: 0,
            payload_delay: 0,
        }
    }

    /// Creates a read request for `size` bytes at `addr`.
    pub fn read_req(addr: u64, size: usize) -> Self {
        Self::new(addr, MemCmd::ReadReq, vec![0; size])
    }

    /// Creates a write request storing `data` at `addr`.
    pub fn write_req(addr: u64, data: Vec<u8>) -> Self {
        Self::new(addr, MemCmd::WriteReq, data)
    }

    /// Target address.
    #[inline]
    pub fn addr(&self) -> u64 {
        self.addr
    }

    /// Retargets the packet.
    #[inline]
    pub fn set_addr(&mut self, addr: u64) {
        self.addr = addr;
    }

    /// Memory command.
    #[inline]
    pub fn cmd(&self) -> MemCmd {
        self.cmd
    }

    /// Access size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable payload bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Drops everything past the first `len` payload bytes.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Consumes the packet, returning its payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Reads the payload as a little-endian register value.
    ///
    /// Payloads shorter than eight bytes are zero-extended.
    pub fn read_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        let len = self.data.len().min(8);
        bytes[..len].copy_from_slice(&self.data[..len]);
        u64::from_le_bytes(bytes)
    }

    /// Turns the request into its successful response.
    pub fn make_response(&mut self) {
        self.cmd = self.cmd.response();
    }

    /// Turns the request into an error response.
    pub fn make_error_response(&mut self) {
        self.make_response();
        self.error = true;
    }

    /// Returns `true` for error responses.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Core that issued the NoC request, if any.
    ///
    /// Responses are routed back to this core; requests without one came from
    /// outside the platform and their responses are collected by the platform.
    #[inline]
    pub fn src_core(&self) -> Option<CoreId> {
        self.src_core
    }

    /// Records the issuing core.
    pub fn set_src_core(&mut self, core: CoreId) {
        self.src_core = Some(core);
    }

    /// Attaches the correlation tag.
    ///
    /// A packet carries at most one tag; attaching replaces any stale one.
    pub fn attach_tag(&mut self, tag: Tag) {
        debug_assert!(self.tag.is_none(), "packet already tagged: {:?}", self.tag);
        self.tag = Some(tag);
    }

    /// Removes and returns the correlation tag.
    pub fn take_tag(&mut self) -> Option<Tag> {
        self.tag.take()
    }

    /// Returns the correlation tag without consuming it.
    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }
}
