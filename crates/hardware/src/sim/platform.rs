//! Multi-tile platform.
//!
//! A `Platform` owns one tile per core (a DTU plus its scratchpad), the NoC between
//! them and the event queue that drives timed simulation. It implements the
//! `DtuPort` of every unit and offers the surfaces a test or driver uses:
//!
//! 1. **Local core:** register reads and writes at the unit's MMIO base.
//! 2. **Network:** injection of inbound frames from outside the platform.
//! 3. **Scheduling:** stepping and draining the event queue.
//!
//! In atomic mode every trigger runs to completion inside the call and the queue
//! stays empty. In timed mode failures raised while processing events are recorded
//! in a fault log.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use super::clock::Clock;
use super::event::{Event, EventQueue};
use crate::common::constants::{HEADER_SIZE, MAX_EVENTS_PER_RUN, REG_SIZE};
use crate::common::{ConfigError, CoreId, DtuError, EpId, NocAddr, Tick};
use crate::config::{Config, TimingMode};
use crate::dtu::header::MessageHeader;
use crate::dtu::tag::NocTag;
use crate::dtu::{Command, Dtu, DtuEvent, DtuPort, DtuReg, EndpointConfig, EpReg, RegFile};
use crate::soc::memory::Scratchpad;
use crate::soc::noc::Noc;
use crate::soc::packet::Packet;
use crate::stats::SimStats;

/// A failure raised while processing a scheduled event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    /// Tick of the event.
    pub tick: Tick,
    /// Core whose unit reported the failure.
    pub core: CoreId,
    /// The failure.
    pub error: DtuError,
}

/// One core's DTU and scratchpad.
#[derive(Debug)]
struct Tile {
    dtu: Dtu,
    spm: Scratchpad,
    cpu_responses: VecDeque<Packet>,
}

/// The tiles other than the one currently being driven.
#[derive(Default)]
struct Peers<'a> {
    before: &'a mut [Tile],
    after: &'a mut [Tile],
}

impl Peers<'_> {
    fn get(&mut self, own: CoreId, core: CoreId) -> Option<&mut Tile> {
        match core.cmp(&own) {
            std::cmp::Ordering::Less => self.before.get_mut(core),
            std::cmp::Ordering::Greater => self.after.get_mut(core - own - 1),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// `DtuPort` of one tile, borrowing the platform for the duration of a call.
struct TilePort<'a> {
    core: CoreId,
    now: Tick,
    spm: &'a mut Scratchpad,
    cpu_responses: &'a mut VecDeque<Packet>,
    events: &'a mut EventQueue,
    noc: &'a Noc,
    peers: Peers<'a>,
}

impl DtuPort for TilePort<'_> {
    fn cur_tick(&self) -> Tick {
        self.now
    }

    fn send_atomic_spm(&mut self, mut pkt: Packet) -> Packet {
        let _ = self.spm.access(&mut pkt);
        pkt
    }

    fn send_atomic_noc(&mut self, pkt: Packet) -> Result<(), DtuError> {
        let dest = self.noc.route(&pkt);
        let Some(tile) = self.peers.get(self.core, dest) else {
            return Err(DtuError::Unroutable { core: dest });
        };
        let Tile {
            dtu,
            spm,
            cpu_responses,
        } = tile;
        let mut port = TilePort {
            core: dest,
            now: self.now,
            spm,
            cpu_responses,
            events: &mut *self.events,
            noc: self.noc,
            peers: Peers::default(),
        };
        dtu.handle_noc_request(pkt, &mut port)
    }

    fn sched_spm_request(&mut self, pkt: Packet, when: Tick) {
        self.events.schedule(
            when,
            Event::SpmRequest {
                core: self.core,
                pkt,
            },
        );
    }

    fn sched_noc_request(&mut self, pkt: Packet, when: Tick) {
        self.events.schedule(when, Event::NocRequest { pkt });
    }

    fn sched_noc_response(&mut self, pkt: Packet, when: Tick) {
        self.events.schedule(when, Event::NocResponse { pkt });
    }

    fn sched_cpu_response(&mut self, pkt: Packet, when: Tick) {
        if when <= self.now {
            self.cpu_responses.push_back(pkt);
        } else {
            self.events.schedule(
                when,
                Event::CpuResponse {
                    core: self.core,
                    pkt,
                },
            );
        }
    }

    fn schedule(&mut self, event: DtuEvent, when: Tick) {
        self.events.schedule(
            when,
            Event::Dtu {
                core: self.core,
                event,
            },
        );
    }
}

/// All tiles, the NoC and the event queue.
#[derive(Debug)]
pub struct Platform {
    tiles: Vec<Tile>,
    noc: Noc,
    events: EventQueue,
    clock: Clock,
    now: Tick,
    atomic: bool,
    cpu_base_addr: u64,
    faults: Vec<Fault>,
    external_responses: Vec<Packet>,
    events_processed: u64,
}

impl Platform {
    /// Builds the platform described by `config`.
    ///
    /// # Returns
    ///
    /// One tile per configured core, or the configuration error.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = Clock::new(config.general.clock_period);
        let tiles = (0..config.system.num_cores)
            .map(|core| -> Result<Tile, ConfigError> {
                Ok(Tile {
                    dtu: Dtu::new(core, config)?,
                    spm: Scratchpad::with_latency(config.spm.size, config.spm.latency),
                    cpu_responses: VecDeque::new(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        info!(
            cores = tiles.len(),
            mode = ?config.general.mode,
            endpoints = config.dtu.num_endpoints,
            "platform created"
        );

        Ok(Self {
            tiles,
            noc: Noc::new(&config.noc, config.dtu.noc_ep_addr_bits, clock),
            events: EventQueue::new(),
            clock,
            now: 0,
            atomic: config.general.mode == TimingMode::Atomic,
            cpu_base_addr: config.dtu.cpu_base_addr,
            faults: Vec::new(),
            external_responses: Vec::new(),
            events_processed: 0,
        })
    }

    /// Number of tiles.
    pub fn num_cores(&self) -> usize {
        self.tiles.len()
    }

    /// Current simulated time.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Returns `true` in atomic mode.
    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    /// Platform clock.
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// The NoC.
    pub fn noc(&self) -> &Noc {
        &self.noc
    }

    /// DTU of `core`.
    pub fn dtu(&self, core: CoreId) -> Option<&Dtu> {
        self.tiles.get(core).map(|t| &t.dtu)
    }

    /// Mutable DTU of `core`.
    pub fn dtu_mut(&mut self, core: CoreId) -> Option<&mut Dtu> {
        self.tiles.get_mut(core).map(|t| &mut t.dtu)
    }

    /// Scratchpad of `core`.
    pub fn spm(&self, core: CoreId) -> Option<&Scratchpad> {
        self.tiles.get(core).map(|t| &t.spm)
    }

    /// Mutable scratchpad of `core`.
    pub fn spm_mut(&mut self, core: CoreId) -> Option<&mut Scratchpad> {
        self.tiles.get_mut(core).map(|t| &mut t.spm)
    }

    /// Number of pending events.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Failures recorded while processing events, oldest first.
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// Removes and returns the recorded failures.
    pub fn take_faults(&mut self) -> Vec<Fault> {
        std::mem::take(&mut self.faults)
    }

    /// Removes and returns the register access responses delivered to `core`.
    pub fn take_cpu_responses(&mut self, core: CoreId) -> Vec<Packet> {
        self.tiles
            .get_mut(core)
            .map(|t| t.cpu_responses.drain(..).collect())
            .unwrap_or_default()
    }

    /// Removes and returns NoC responses to injected requests.
    pub fn take_external_responses(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.external_responses)
    }

    /// Address of a unit-wide register in the local core's address space.
    pub fn dtu_reg_addr(&self, reg: DtuReg) -> u64 {
        self.cpu_base_addr + RegFile::dtu_reg_offset(reg)
    }

    /// Address of an endpoint register in the local core's address space.
    pub fn ep_reg_addr(&self, ep: EpId, reg: EpReg) -> u64 {
        self.cpu_base_addr + RegFile::ep_reg_offset(ep, reg)
    }

    /// Aggregated statistics of all units.
    pub fn stats(&self) -> SimStats {
        let mut stats = SimStats::default();
        stats.ticks = self.now;
        stats.clock_period = self.clock.period();
        stats.events = self.events_processed;
        stats.faults = self.faults.len() as u64;
        for tile in &self.tiles {
            stats.dtu += tile.dtu.stats();
        }
        stats
    }

    /// Runs `f` on the unit of `core` with the port of its tile.
    fn with_port<R>(
        &mut self,
        core: CoreId,
        f: impl FnOnce(&mut Dtu, &mut TilePort<'_>) -> R,
    ) -> Option<R> {
        if core >= self.tiles.len() {
            return None;
        }
        let (before, rest) = self.tiles.split_at_mut(core);
        let (tile, after) = rest.split_first_mut()?;
        let Tile {
            dtu,
            spm,
            cpu_responses,
        } = tile;
        let mut port = TilePort {
            core,
            now: self.now,
            spm,
            cpu_responses,
            events: &mut self.events,
            noc: &self.noc,
            peers: Peers { before, after },
        };
        Some(f(dtu, &mut port))
    }

    fn call(
        &mut self,
        core: CoreId,
        f: impl FnOnce(&mut Dtu, &mut TilePort<'_>) -> Result<(), DtuError>,
    ) -> Result<(), DtuError> {
        self.with_port(core, f)
            .unwrap_or(Err(DtuError::Unroutable { core }))
    }

    /// Applies a host-side endpoint configuration to the unit of `core`.
    pub fn configure_endpoint(
        &mut self,
        core: CoreId,
        ep: EpId,
        config: &EndpointConfig,
    ) -> Result<(), DtuError> {
        let dtu = self
            .dtu_mut(core)
            .ok_or(DtuError::Unroutable { core })?;
        let num_endpoints = dtu.regs().num_endpoints();
        if ep >= num_endpoints {
            return Err(DtuError::EndpointOutOfRange {
                ep: ep as u64,
                num_endpoints,
            });
        }
        dtu.regs_mut().configure_endpoint(ep, config);
        Ok(())
    }

    /// Issues a register access of the local core without waiting for its response.
    pub fn cpu_access(&mut self, core: CoreId, pkt: Packet) -> Result<(), DtuError> {
        self.call(core, |dtu, port| dtu.handle_cpu_request(pkt, port))
    }

    /// Writes a register of the unit of `core` from its local core.
    ///
    /// Blocks until the response arrives; in timed mode events up to the response
    /// are processed. A command written here executes inline in atomic mode and at the
    /// response tick in timed mode.
    ///
    /// # Returns
    ///
    /// The register access error, or in atomic mode the outcome of the command.
    pub fn cpu_write(&mut self, core: CoreId, addr: u64, value: u64) -> Result<(), DtuError> {
        let pkt = Packet::write_req(addr, value.to_le_bytes().to_vec());
        let result = self.cpu_access(core, pkt);
        let _ = self.await_cpu_response(core);
        result
    }

    /// Reads a register of the unit of `core` from its local core.
    ///
    /// Blocks until the response arrives, like `cpu_write`.
    pub fn cpu_read(&mut self, core: CoreId, addr: u64) -> Result<u64, DtuError> {
        let pkt = Packet::read_req(addr, REG_SIZE as usize);
        let result = self.cpu_access(core, pkt);
        let response = self.await_cpu_response(core);
        result?;
        Ok(response.map_or(0, |pkt| pkt.read_u64()))
    }

    fn await_cpu_response(&mut self, core: CoreId) -> Option<Packet> {
        loop {
            if let Some(pkt) = self.tiles.get_mut(core)?.cpu_responses.pop_front() {
                return Some(pkt);
            }
            if !self.step() {
                return None;
            }
        }
    }

    /// Writes `cmd` into the command register of `core`.
    pub fn write_command(&mut self, core: CoreId, cmd: &Command) -> Result<(), DtuError> {
        let raw = self
            .dtu(core)
            .ok_or(DtuError::Unroutable { core })?
            .layout()
            .encode(cmd);
        self.cpu_write(core, self.dtu_reg_addr(DtuReg::Command), raw)
    }

    /// Reads the status register of `core`.
    pub fn status(&mut self, core: CoreId) -> Result<u64, DtuError> {
        self.cpu_read(core, self.dtu_reg_addr(DtuReg::Status))
    }

    /// Delivers a message frame from outside the platform to `dest_ep` at `dest_core`.
    ///
    /// The frame carries the given source in its header. Responses to it are collected
    /// by `take_external_responses`.
    ///
    /// # Returns
    ///
    /// The receiving unit's verdict on the frame's arrival. In atomic mode this covers
    /// the whole receive pipeline.
    pub fn inject_message(
        &mut self,
        dest_core: CoreId,
        dest_ep: EpId,
        src_core: u8,
        src_ep: u8,
        payload: &[u8],
    ) -> Result<(), DtuError> {
        let header = MessageHeader::new(src_core, src_ep, payload.len() as u16);
        let addr = NocAddr::new(dest_core, dest_ep).encode(self.noc.ep_bits());
        let mut pkt = Packet::write_req(addr, header.frame(payload));
        pkt.attach_tag(NocTag::Message.into());
        self.deliver_external(dest_core, pkt)
    }

    /// Delivers a raw memory access from outside the platform to `dest_core`.
    ///
    /// The unit does not support raw memory accesses over the NoC; the request is
    /// always rejected with `DtuError::Unsupported`.
    pub fn inject_memory_request(
        &mut self,
        dest_core: CoreId,
        mut pkt: Packet,
    ) -> Result<(), DtuError> {
        pkt.set_addr(NocAddr::new(dest_core, 0).encode(self.noc.ep_bits()));
        pkt.attach_tag(NocTag::MemoryAccess.into());
        self.deliver_external(dest_core, pkt)
    }

    fn deliver_external(&mut self, core: CoreId, mut pkt: Packet) -> Result<(), DtuError> {
        if !self.atomic {
            self.noc.annotate(&mut pkt);
        }
        self.call(core, |dtu, port| dtu.handle_noc_request(pkt, port))
    }

    /// Processes the earliest pending event.
    ///
    /// # Returns
    ///
    /// `false` if no event was pending.
    pub fn step(&mut self) -> bool {
        let Some((when, event)) = self.events.pop() else {
            return false;
        };
        self.now = self.now.max(when);
        self.events_processed += 1;
        self.dispatch(event);
        true
    }

    /// Processes events until the queue is empty.
    ///
    /// # Returns
    ///
    /// Number of events processed.
    pub fn run(&mut self) -> u64 {
        let mut processed = 0;
        while processed < MAX_EVENTS_PER_RUN && self.step() {
            processed += 1;
        }
        if !self.events.is_empty() {
            warn!(
                pending = self.events.len(),
                tick = self.now,
                "event limit reached, queue not drained"
            );
        }
        processed
    }

    /// Processes all events scheduled up to and including `tick`, then advances the
    /// clock to `tick`.
    ///
    /// # Returns
    ///
    /// Number of events processed.
    pub fn run_until(&mut self, tick: Tick) -> u64 {
        let mut processed = 0;
        while self.events.peek_tick().is_some_and(|t| t <= tick) && self.step() {
            processed += 1;
        }
        self.now = self.now.max(tick);
        processed
    }

    fn dispatch(&mut self, event: Event) {
        let (core, result) = match event {
            Event::SpmRequest { core, mut pkt } => {
                let Some(tile) = self.tiles.get_mut(core) else {
                    self.record_fault(core, DtuError::Unroutable { core });
                    return;
                };
                let latency = tile.spm.access(&mut pkt);
                let when = self.clock.clock_edge(self.now, latency);
                self.events.schedule(when, Event::SpmResponse { core, pkt });
                return;
            }
            Event::SpmResponse { core, pkt } => (
                core,
                self.call(core, |dtu, port| dtu.complete_spm_request(pkt, port)),
            ),
            Event::NocRequest { mut pkt } => {
                let dest = self.noc.route(&pkt);
                if dest >= self.tiles.len() {
                    let src = pkt.src_core().unwrap_or(dest);
                    self.bounce(pkt);
                    (src, Err(DtuError::Unroutable { core: dest }))
                } else {
                    self.noc.annotate(&mut pkt);
                    (
                        dest,
                        self.call(dest, |dtu, port| dtu.handle_noc_request(pkt, port)),
                    )
                }
            }
            Event::NocResponse { mut pkt } => {
                self.noc.annotate(&mut pkt);
                match pkt.src_core() {
                    Some(src) => (
                        src,
                        self.call(src, |dtu, port| dtu.complete_noc_request(pkt, port)),
                    ),
                    None => {
                        debug!(error = pkt.is_error(), "response to injected request");
                        self.external_responses.push(pkt);
                        return;
                    }
                }
            }
            Event::CpuResponse { core, pkt } => {
                if let Some(tile) = self.tiles.get_mut(core) {
                    tile.cpu_responses.push_back(pkt);
                }
                return;
            }
            Event::Dtu { core, event } => (
                core,
                self.call(core, |dtu, port| dtu.handle_event(event, port)),
            ),
        };

        if let Err(error) = result {
            self.record_fault(core, error);
        }
    }

    /// Answers an undeliverable NoC request with an error response.
    fn bounce(&mut self, mut pkt: Packet) {
        let _ = pkt.take_tag();
        pkt.truncate(HEADER_SIZE);
        pkt.make_error_response();
        self.events.schedule(self.now, Event::NocResponse { pkt });
    }

    fn record_fault(&mut self, core: CoreId, error: DtuError) {
        warn!(tick = self.now, core, %error, "DTU fault");
        self.faults.push(Fault {
            tick: self.now,
            core,
            error,
        });
    }
}
