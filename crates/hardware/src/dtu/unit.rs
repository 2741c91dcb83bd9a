//! The data transfer unit.
//!
//! A `Dtu` sits between its core, its scratchpad and the NoC. The core drives it by
//! writing the command register; the unit then moves messages between the local
//! scratchpad and remote receive rings without further involvement of the core.
//!
//! # Pipelines
//!
//! Transmit (sender side):
//! 1. `execute_command` decodes `StartOperation` and sets the busy flag.
//! 2. The message is read from the scratchpad (`LocalTransmit` tag).
//! 3. The read completes; header and payload go out as one NoC frame.
//! 4. The remote response arrives; the command register and busy flag are cleared.
//!
//! Receive (receiver side):
//! 1. A frame arrives; a ring slot is claimed and a scratchpad write issued
//!    (`ForwardedReceive` tag).
//! 2. The write completes; the write pointer advances and a response returns to the
//!    sender.
//!
//! In atomic mode every leg runs inline within the triggering call and nothing is
//! left pending when it returns. In timed mode each leg is scheduled through the
//! `DtuPort` at the clock edge its latency dictates.

use tracing::{debug, trace, warn};

use super::command::{Command, CommandLayout, CommandOpcode};
use super::header::MessageHeader;
use super::port::{DtuEvent, DtuPort};
use super::regfile::{DtuReg, EpMode, EpReg, RegFile};
use super::ringbuf::RingState;
use super::tag::{NocTag, SpmTag, Tag};
use crate::common::constants::HEADER_SIZE;
use crate::common::{ConfigError, CoreId, DtuError, EpId, MemCmd, NocAddr};
use crate::config::{Config, LatencyConfig, TimingMode};
use crate::sim::clock::Clock;
use crate::soc::packet::Packet;
use crate::stats::DtuStats;

/// One data transfer unit.
#[derive(Clone, Debug)]
pub struct Dtu {
    core_id: CoreId,
    atomic: bool,
    regs: RegFile,
    layout: CommandLayout,
    max_message_size: u64,
    noc_ep_addr_bits: u32,
    cpu_base_addr: u64,
    spm_size: u64,
    latency: LatencyConfig,
    clock: Clock,
    /// Per-endpoint count of claimed slots whose scratchpad write has not completed.
    reserved: Vec<u64>,
    stats: DtuStats,
}

impl Dtu {
    /// Creates the unit of core `core_id`.
    ///
    /// # Arguments
    ///
    /// * `core_id` - Core the unit belongs to.
    /// * `config` - Platform configuration; the `dtu` section sizes the unit.
    ///
    /// # Returns
    ///
    /// The unit with all registers zeroed, or the configuration error.
    pub fn new(core_id: CoreId, config: &Config) -> Result<Self, ConfigError> {
        config.dtu.validate()?;
        let layout = CommandLayout::from_config(&config.dtu)?;
        let num_endpoints = config.dtu.num_endpoints;
        Ok(Self {
            core_id,
            atomic: config.general.mode == TimingMode::Atomic,
            regs: RegFile::new(num_endpoints),
            layout,
            max_message_size: config.dtu.max_message_size,
            noc_ep_addr_bits: config.dtu.noc_ep_addr_bits,
            cpu_base_addr: config.dtu.cpu_base_addr,
            spm_size: config.spm.size as u64,
            latency: config.dtu.latency.clone(),
            clock: Clock::new(config.general.clock_period),
            reserved: vec![0; num_endpoints],
            stats: DtuStats::default(),
        })
    }

    /// Core the unit belongs to.
    pub fn core_id(&self) -> CoreId {
        self.core_id
    }

    /// Returns `true` in atomic mode.
    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    /// Register file.
    pub fn regs(&self) -> &RegFile {
        &self.regs
    }

    /// Mutable register file, for host-side setup.
    pub fn regs_mut(&mut self) -> &mut RegFile {
        &mut self.regs
    }

    /// Command register layout.
    pub fn layout(&self) -> &CommandLayout {
        &self.layout
    }

    /// Unit clock.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Activity counters.
    pub fn stats(&self) -> &DtuStats {
        &self.stats
    }

    /// Slot size of every receive ring.
    pub fn max_message_size(&self) -> u64 {
        self.max_message_size
    }

    /// Base address of the register file in the local core's address space.
    pub fn cpu_base_addr(&self) -> u64 {
        self.cpu_base_addr
    }

    /// Bits of a NoC address holding the endpoint id.
    pub fn noc_ep_addr_bits(&self) -> u32 {
        self.noc_ep_addr_bits
    }

    /// Current content of the command register, decoded.
    pub fn command(&self) -> Command {
        self.layout.decode(self.regs.read_dtu_reg(DtuReg::Command))
    }

    /// Returns `true` while a transmission is outstanding.
    pub fn is_busy(&self) -> bool {
        self.regs.read_dtu_reg(DtuReg::Status) != 0
    }

    /// Slots of `ep` claimed by in-flight frames.
    pub fn reserved_slots(&self, ep: EpId) -> u64 {
        self.reserved.get(ep).copied().unwrap_or(0)
    }

    fn set_busy(&mut self, busy: bool) {
        self.regs.set_dtu_reg(DtuReg::Status, u64::from(busy));
    }

    fn check_ep(&self, ep: u64) -> Result<EpId, DtuError> {
        let num_endpoints = self.regs.num_endpoints();
        if ep < num_endpoints as u64 {
            Ok(ep as EpId)
        } else {
            Err(DtuError::EndpointOutOfRange { ep, num_endpoints })
        }
    }

    fn tally<T>(&mut self, result: Result<T, DtuError>) -> Result<T, DtuError> {
        if let Err(e) = &result {
            self.stats.errors += 1;
            debug!(core = self.core_id, error = %e, "DTU operation failed");
        }
        result
    }

    /// Handles an access of the local core to the register file.
    ///
    /// The response goes back through the port; in timed mode it is delayed by the
    /// packet's transport delay plus the register access latency. A write to the
    /// command register triggers `execute_command`, inline in atomic mode and at the
    /// response tick in timed mode.
    ///
    /// # Returns
    ///
    /// The register access error, or in atomic mode the outcome of the command.
    pub fn handle_cpu_request(
        &mut self,
        mut pkt: Packet,
        port: &mut impl DtuPort,
    ) -> Result<(), DtuError> {
        let now = port.cur_tick();
        let when = if self.atomic {
            now
        } else {
            let transport = self
                .clock
                .ticks_to_cycles(pkt.header_delay + pkt.payload_delay);
            self.clock
                .clock_edge(now, transport + self.latency.register_access)
        };
        pkt.header_delay = 0;
        pkt.payload_delay = 0;

        let addr = pkt.addr();
        pkt.set_addr(addr.wrapping_sub(self.cpu_base_addr));
        let accessed = self.regs.handle_request(&mut pkt);
        pkt.set_addr(addr);

        let command_written = match accessed {
            Ok(written) => written,
            Err(e) => {
                pkt.make_error_response();
                port.sched_cpu_response(pkt, when);
                return self.tally(Err(e));
            }
        };
        port.sched_cpu_response(pkt, when);

        if !command_written {
            Ok(())
        } else if self.atomic {
            self.execute_command(port)
        } else {
            port.schedule(DtuEvent::ExecuteCommand, when);
            Ok(())
        }
    }

    /// Decodes the command register and dispatches the operation.
    pub fn execute_command(&mut self, port: &mut impl DtuPort) -> Result<(), DtuError> {
        let cmd = self.command();
        self.stats.commands_executed += 1;
        let result = self.dispatch(cmd, port);
        self.tally(result)
    }

    fn dispatch(&mut self, cmd: Command, port: &mut impl DtuPort) -> Result<(), DtuError> {
        let ep = self.check_ep(cmd.ep_id as u64)?;
        match cmd.opcode {
            CommandOpcode::Idle => Ok(()),
            CommandOpcode::StartOperation => self.start_operation(ep, port),
            CommandOpcode::IncrementReadPtr => self.increment_read_ptr(ep),
            CommandOpcode::Invalid(raw) => Err(DtuError::InvalidOpcode(raw)),
        }
    }

    fn start_operation(&mut self, ep: EpId, port: &mut impl DtuPort) -> Result<(), DtuError> {
        let mode = self.regs.read_ep_reg(ep, EpReg::Mode);
        match EpMode::try_from(mode) {
            Ok(EpMode::TransmitMessage) => self.start_message_transmission(ep, port),
            Ok(EpMode::ReceiveMessage) | Err(_) => {
                Err(DtuError::InvalidEndpointMode { ep, mode })
            }
        }
    }

    fn start_message_transmission(
        &mut self,
        ep: EpId,
        port: &mut impl DtuPort,
    ) -> Result<(), DtuError> {
        let message_addr = self.regs.read_ep_reg(ep, EpReg::MessageAddr);
        let message_size = self.regs.read_ep_reg(ep, EpReg::MessageSize);

        if self.is_busy() {
            return Err(DtuError::EndpointBusy { ep });
        }
        if message_size == 0 {
            return Err(DtuError::EmptyMessage { ep });
        }
        if message_size.saturating_add(HEADER_SIZE as u64) >= self.max_message_size {
            return Err(DtuError::MessageTooLarge {
                ep,
                size: message_size,
                max: self.max_message_size,
            });
        }
        let _ = self.target_addr(ep)?;

        debug!(
            core = self.core_id,
            ep,
            size = message_size,
            addr = format_args!("{message_addr:#x}"),
            "start transmission: read message from scratchpad"
        );
        self.set_busy(true);

        let mut pkt = Packet::read_req(message_addr, message_size as usize);
        pkt.attach_tag(SpmTag::LocalTransmit { ep }.into());

        if self.atomic {
            let resp = port.send_atomic_spm(pkt);
            self.spm_completion(resp, port)
        } else {
            let when = self
                .clock
                .clock_edge(port.cur_tick(), self.latency.command_to_spm_request);
            port.sched_spm_request(pkt, when);
            Ok(())
        }
    }

    /// Ends the outstanding transmission: clears the command register and the busy flag.
    pub fn finish_message_transmission(&mut self) {
        trace!(core = self.core_id, "transmission finished");
        self.regs.set_dtu_reg(DtuReg::Command, 0);
        self.set_busy(false);
    }

    fn increment_read_ptr(&mut self, ep: EpId) -> Result<(), DtuError> {
        let mut ring = RingState::load(&self.regs, ep);
        ring.consume(ep, self.max_message_size)?;
        ring.store(&mut self.regs, ep);
        self.stats.read_ptr_increments += 1;
        debug!(
            core = self.core_id,
            ep,
            read_ptr = format_args!("{:#x}", ring.read_ptr),
            count = ring.count,
            "released receive slot"
        );
        Ok(())
    }

    /// Commits the oldest claimed slot of `ep`: advances the write pointer and the
    /// message count.
    pub fn increment_write_ptr(&mut self, ep: EpId) -> Result<(), DtuError> {
        let result = self.commit_slot(ep);
        self.tally(result)
    }

    fn commit_slot(&mut self, ep: EpId) -> Result<(), DtuError> {
        let ep = self.check_ep(ep as u64)?;
        self.reserved[ep] = self.reserved[ep].saturating_sub(1);
        let mut ring = RingState::load(&self.regs, ep);
        ring.produce(ep, self.max_message_size)?;
        ring.store(&mut self.regs, ep);
        self.stats.messages_received += 1;
        debug!(
            core = self.core_id,
            ep,
            write_ptr = format_args!("{:#x}", ring.write_ptr),
            count = ring.count,
            "committed receive slot"
        );
        Ok(())
    }

    /// Handles a deferred action scheduled earlier through the port.
    pub fn handle_event(
        &mut self,
        event: DtuEvent,
        port: &mut impl DtuPort,
    ) -> Result<(), DtuError> {
        match event {
            DtuEvent::ExecuteCommand => self.execute_command(port),
            DtuEvent::FinishMessageTransmission => {
                self.finish_message_transmission();
                Ok(())
            }
            DtuEvent::IncrementWritePtr(ep) => self.increment_write_ptr(ep),
        }
    }

    /// Handles a scratchpad response, routed by the packet's tag.
    pub fn complete_spm_request(
        &mut self,
        pkt: Packet,
        port: &mut impl DtuPort,
    ) -> Result<(), DtuError> {
        let result = self.spm_completion(pkt, port);
        self.tally(result)
    }

    fn spm_completion(&mut self, mut pkt: Packet, port: &mut impl DtuPort) -> Result<(), DtuError> {
        trace!(core = self.core_id, "received response from scratchpad");
        match pkt.take_tag() {
            Some(Tag::Spm(SpmTag::LocalTransmit { ep })) => {
                self.complete_local_spm_request(pkt, ep, port)
            }
            Some(Tag::Spm(SpmTag::ForwardedReceive { ep })) => {
                self.complete_forwarded_spm_request(pkt, ep, port)
            }
            Some(Tag::Noc(_)) | None => Err(DtuError::MissingTag),
        }
    }

    fn complete_local_spm_request(
        &mut self,
        pkt: Packet,
        ep: EpId,
        port: &mut impl DtuPort,
    ) -> Result<(), DtuError> {
        if pkt.cmd() != MemCmd::ReadResp {
            self.finish_message_transmission();
            return Err(DtuError::UnexpectedCommand {
                context: "transmit read completion",
                found: pkt.cmd().name(),
            });
        }
        if pkt.is_error() {
            self.finish_message_transmission();
            return Err(DtuError::SpmAccessFault {
                addr: pkt.addr(),
                size: pkt.size(),
            });
        }

        let dest = match self.target_addr(ep) {
            Ok(dest) => dest,
            Err(e) => {
                self.finish_message_transmission();
                return Err(e);
            }
        };
        let NocAddr {
            core_id: target_core,
            ep_id: target_ep,
        } = dest;
        debug!(
            core = self.core_id,
            ep,
            size = pkt.size(),
            target_core,
            target_ep,
            "send message"
        );

        let header = MessageHeader::new(self.core_id as u8, ep as u8, pkt.size() as u16);
        let mut noc_pkt = Packet::write_req(
            dest.encode(self.noc_ep_addr_bits),
            header.frame(pkt.data()),
        );
        noc_pkt.set_src_core(self.core_id);
        noc_pkt.payload_delay = pkt.payload_delay;
        noc_pkt.attach_tag(NocTag::Message.into());
        self.stats.messages_sent += 1;
        self.stats.bytes_sent += pkt.size() as u64;

        if self.atomic {
            let delivered = if target_core == self.core_id {
                self.handle_noc_request(noc_pkt, port)
            } else {
                port.send_atomic_noc(noc_pkt)
            };
            self.finish_message_transmission();
            delivered.map_err(|cause| self.rejected(ep, Some(&cause)))
        } else {
            let delay = self.latency.spm_response_to_noc_request
                + self.clock.ticks_to_cycles(pkt.header_delay);
            let when = self.clock.clock_edge(port.cur_tick(), delay);
            port.sched_noc_request(noc_pkt, when);
            Ok(())
        }
    }

    /// Reads the destination of transmit endpoint `ep`.
    ///
    /// The target endpoint must be one of the configured endpoints and the target
    /// core must fit above the endpoint bits of a NoC address.
    fn target_addr(&self, ep: EpId) -> Result<NocAddr, DtuError> {
        let target_core = self.regs.read_ep_reg(ep, EpReg::TargetCoreId);
        let target_ep = self.regs.read_ep_reg(ep, EpReg::TargetEpId);
        let num_endpoints = self.regs.num_endpoints();
        if target_ep >= num_endpoints as u64 {
            return Err(DtuError::EndpointOutOfRange {
                ep: target_ep,
                num_endpoints,
            });
        }
        if target_core > u64::MAX >> self.noc_ep_addr_bits {
            return Err(DtuError::Unroutable {
                core: target_core as CoreId,
            });
        }
        Ok(NocAddr::new(target_core as CoreId, target_ep as EpId))
    }

    fn rejected(&mut self, ep: EpId, cause: Option<&DtuError>) -> DtuError {
        self.stats.transfers_rejected += 1;
        match cause {
            Some(cause) => {
                warn!(core = self.core_id, ep, %cause, "message rejected by receiver");
            }
            None => warn!(core = self.core_id, ep, "message rejected by receiver"),
        }
        DtuError::TransferRejected { ep }
    }

    /// Handles the response to a transmitted frame.
    ///
    /// The transmission finishes once the response's transport delay has elapsed. An
    /// error response means the receiver dropped the frame.
    pub fn complete_noc_request(
        &mut self,
        pkt: Packet,
        port: &mut impl DtuPort,
    ) -> Result<(), DtuError> {
        let result = self.noc_completion(&pkt, port);
        self.tally(result)
    }

    fn noc_completion(&mut self, pkt: &Packet, port: &mut impl DtuPort) -> Result<(), DtuError> {
        trace!(core = self.core_id, "received response from remote DTU");
        let delay = self
            .clock
            .ticks_to_cycles(pkt.header_delay + pkt.payload_delay);
        port.schedule(
            DtuEvent::FinishMessageTransmission,
            self.clock.clock_edge(port.cur_tick(), delay),
        );

        if pkt.cmd() != MemCmd::WriteResp {
            return Err(DtuError::UnexpectedCommand {
                context: "NoC response",
                found: pkt.cmd().name(),
            });
        }
        if pkt.is_error() {
            let header = MessageHeader::from_bytes(pkt.data()).ok_or(DtuError::MissingTag)?;
            return Err(self.rejected(header.ep_id as EpId, None));
        }
        Ok(())
    }

    /// Handles a NoC request addressed to this unit.
    ///
    /// Message frames enter the receive pipeline. Raw memory accesses are not
    /// supported. A rejected request is answered with an error response in timed
    /// mode; in atomic mode the error propagates to the sender's call.
    pub fn handle_noc_request(
        &mut self,
        mut pkt: Packet,
        port: &mut impl DtuPort,
    ) -> Result<(), DtuError> {
        let result = match pkt.take_tag() {
            Some(Tag::Noc(NocTag::Message)) => self.recv_noc_message(pkt, port),
            Some(Tag::Noc(NocTag::MemoryAccess)) => {
                self.reject_noc_request(pkt, port);
                Err(DtuError::Unsupported("memory access over the NoC"))
            }
            Some(Tag::Spm(_)) | None => {
                self.reject_noc_request(pkt, port);
                Err(DtuError::MissingTag)
            }
        };
        self.tally(result)
    }

    fn recv_noc_message(&mut self, mut pkt: Packet, port: &mut impl DtuPort) -> Result<(), DtuError> {
        let ep = NocAddr::decode(pkt.addr(), self.noc_ep_addr_bits).ep_id;
        let slot = match self.claim_receive_slot(ep, &pkt) {
            Ok(slot) => slot,
            Err(e) => {
                self.reject_noc_request(pkt, port);
                return Err(e);
            }
        };

        pkt.set_addr(slot);
        pkt.attach_tag(SpmTag::ForwardedReceive { ep }.into());

        if self.atomic {
            let resp = port.send_atomic_spm(pkt);
            self.spm_completion(resp, port)
        } else {
            let delay = self.clock.ticks_to_cycles(pkt.header_delay)
                + self.latency.noc_request_to_spm_request;
            pkt.header_delay = 0;
            let when = self.clock.clock_edge(port.cur_tick(), delay);
            port.sched_spm_request(pkt, when);
            Ok(())
        }
    }

    /// Validates an inbound frame and claims the next free slot of `ep`'s ring.
    fn claim_receive_slot(&mut self, ep: EpId, pkt: &Packet) -> Result<u64, DtuError> {
        let ep = self.check_ep(ep as u64)?;
        if pkt.cmd() != MemCmd::WriteReq {
            return Err(DtuError::UnexpectedCommand {
                context: "inbound message",
                found: pkt.cmd().name(),
            });
        }
        let header = MessageHeader::from_bytes(pkt.data()).ok_or(DtuError::EmptyMessage { ep })?;
        debug!(
            core = self.core_id,
            ep,
            size = header.length,
            src_core = header.core_id,
            src_ep = header.ep_id,
            "received message"
        );

        let mode = self.regs.read_ep_reg(ep, EpReg::Mode);
        if !matches!(EpMode::try_from(mode), Ok(EpMode::ReceiveMessage)) {
            return Err(DtuError::InvalidEndpointMode { ep, mode });
        }
        if pkt.size() as u64 > self.max_message_size {
            return Err(DtuError::MessageTooLarge {
                ep,
                size: pkt.size() as u64,
                max: self.max_message_size,
            });
        }

        let ring = RingState::load(&self.regs, ep);
        let pending = self.reserved[ep];
        if ring.count.saturating_add(pending) >= ring.slots {
            return Err(DtuError::BufferOverflow { ep });
        }
        // A claimed slot must be writable, or a later claim would commit over the hole.
        let slot = ring.free_slot(pending, self.max_message_size);
        if !slot
            .checked_add(pkt.size() as u64)
            .is_some_and(|end| end <= self.spm_size)
        {
            return Err(DtuError::SpmAccessFault {
                addr: slot,
                size: pkt.size(),
            });
        }
        self.reserved[ep] += 1;
        Ok(slot)
    }

    fn release_slot(&mut self, ep: EpId) {
        if let Some(pending) = self.reserved.get_mut(ep) {
            *pending = pending.saturating_sub(1);
        }
    }

    fn reject_noc_request(&self, mut pkt: Packet, port: &mut impl DtuPort) {
        if self.atomic {
            return;
        }
        pkt.truncate(HEADER_SIZE);
        pkt.make_error_response();
        let delay = self
            .clock
            .ticks_to_cycles(pkt.header_delay + pkt.payload_delay)
            + self.latency.spm_response_to_noc_response;
        pkt.header_delay = 0;
        pkt.payload_delay = 0;
        let when = self.clock.clock_edge(port.cur_tick(), delay);
        port.sched_noc_response(pkt, when);
    }

    fn complete_forwarded_spm_request(
        &mut self,
        mut pkt: Packet,
        ep: EpId,
        port: &mut impl DtuPort,
    ) -> Result<(), DtuError> {
        if pkt.cmd() != MemCmd::WriteResp || pkt.is_error() {
            self.release_slot(ep);
            let err = if pkt.is_error() {
                DtuError::SpmAccessFault {
                    addr: pkt.addr(),
                    size: pkt.size(),
                }
            } else {
                DtuError::UnexpectedCommand {
                    context: "receive write completion",
                    found: pkt.cmd().name(),
                }
            };
            self.reject_noc_request(pkt, port);
            return Err(err);
        }

        self.stats.bytes_received += pkt.size() as u64;
        if self.atomic {
            return self.commit_slot(ep);
        }

        if let Some(header) = MessageHeader::from_bytes(pkt.data()) {
            trace!(
                core = self.core_id,
                ep,
                src_core = header.core_id,
                src_ep = header.ep_id,
                "send response back to sender"
            );
        }
        let delay = self
            .clock
            .ticks_to_cycles(pkt.header_delay + pkt.payload_delay)
            + self.latency.spm_response_to_noc_response;
        pkt.header_delay = 0;
        pkt.payload_delay = 0;
        let when = self.clock.clock_edge(port.cur_tick(), delay);

        port.schedule(DtuEvent::IncrementWritePtr(ep), when);
        pkt.truncate(HEADER_SIZE);
        port.sched_noc_response(pkt, when);
        Ok(())
    }
}
