//! Transmit Pipeline Tests.
//!
//! Drives a single unit against a recording port and checks what it issues at
//! each leg: the command response, the scratchpad read, the NoC frame and the
//! completion, in both timing modes.

use dtusim_core::Dtu;
use dtusim_core::common::{DtuError, MemCmd, NocAddr};
use dtusim_core::config::TimingMode;
use dtusim_core::dtu::tag::{NocTag, SpmTag, Tag};
use dtusim_core::dtu::{
    Command, CommandOpcode, DtuEvent, DtuReg, EndpointConfig, EpReg, MessageHeader,
};
use dtusim_core::soc::packet::Packet;
use dtusim_core::soc::traits::Device;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::test_config;
use crate::common::mocks::port::{Call, RecordingPort, spm_tag};

const MESSAGE_ADDR: u64 = 0x100;
const COMMAND_ADDR: u64 = 0xF000_0008;

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8 ^ 0x5A).collect()
}

/// Unit of core 0 with endpoint 0 transmitting `len` bytes to core 1, endpoint 2.
fn setup(mode: TimingMode, len: usize) -> (Dtu, RecordingPort) {
    let config = test_config(mode);
    let mut dtu = Dtu::new(0, &config).unwrap();
    let mut port = RecordingPort::new(config.spm.size);
    port.spm.write_bytes(MESSAGE_ADDR, &payload(len));
    dtu.regs_mut().configure_endpoint(
        0,
        &EndpointConfig::Transmit {
            message_addr: MESSAGE_ADDR,
            message_size: len as u64,
            target_core: 1,
            target_ep: 2,
        },
    );
    (dtu, port)
}

fn command_write(dtu: &Dtu, opcode: CommandOpcode, ep: usize) -> Packet {
    let raw = dtu.layout().encode(&Command::new(opcode, ep, 0));
    Packet::write_req(COMMAND_ADDR, raw.to_le_bytes().to_vec())
}

fn start(dtu: &mut Dtu, port: &mut RecordingPort, ep: usize) -> Result<(), DtuError> {
    let raw = dtu.layout().encode(&Command::new(CommandOpcode::StartOperation, ep, 0));
    dtu.regs_mut().set_dtu_reg(DtuReg::Command, raw);
    dtu.execute_command(port)
}

// ══════════════════════════════════════════════════════════
// 1. Timed mode
// ══════════════════════════════════════════════════════════

#[test]
fn command_write_schedules_response_and_execution() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 16);
    let pkt = command_write(&dtu, CommandOpcode::StartOperation, 0);
    dtu.handle_cpu_request(pkt, &mut port).unwrap();

    let calls = port.take_calls();
    assert_eq!(calls.len(), 2);
    match &calls[0] {
        Call::CpuResponse { pkt, when } => {
            assert_eq!(*when, 1000);
            assert_eq!(pkt.cmd(), MemCmd::WriteResp);
            assert_eq!(pkt.addr(), COMMAND_ADDR);
            assert!(!pkt.is_error());
        }
        other => panic!("expected the register response first, got {other:?}"),
    }
    assert_eq!(
        calls[1],
        Call::Schedule {
            event: DtuEvent::ExecuteCommand,
            when: 1000
        }
    );
    assert!(!dtu.is_busy());
}

#[test]
fn register_response_includes_transport_delay() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 16);
    let mut pkt = Packet::read_req(0xF000_0000, 8);
    pkt.header_delay = 1500;
    dtu.handle_cpu_request(pkt, &mut port).unwrap();

    match port.take_calls().as_slice() {
        [Call::CpuResponse { pkt, when }] => {
            assert_eq!(*when, 3000);
            assert_eq!(pkt.header_delay, 0);
            assert_eq!(pkt.read_u64(), 0);
        }
        other => panic!("unexpected calls {other:?}"),
    }
}

#[test]
fn full_timed_transmission() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 16);

    port.now = 1000;
    start(&mut dtu, &mut port, 0).unwrap();
    assert!(dtu.is_busy());
    let (read, when) = port.spm_requests()[0];
    assert_eq!(when, 2000);
    assert_eq!((read.addr(), read.size(), read.cmd()), (MESSAGE_ADDR, 16, MemCmd::ReadReq));
    assert_eq!(spm_tag(read), SpmTag::LocalTransmit { ep: 0 });

    let resp = port.serve_spm_request().unwrap();
    port.now = 4000;
    dtu.complete_spm_request(resp, &mut port).unwrap();

    let (frame, when) = port.noc_requests()[0];
    assert_eq!(when, 5000);
    assert_eq!(frame.addr(), NocAddr::new(1, 2).encode(8));
    assert_eq!(frame.cmd(), MemCmd::WriteReq);
    assert_eq!(frame.src_core(), Some(0));
    assert_eq!(frame.tag(), Some(&Tag::Noc(NocTag::Message)));
    assert_eq!(frame.data(), MessageHeader::new(0, 0, 16).frame(&payload(16)).as_slice());

    let mut response = frame.clone();
    let _ = response.take_tag();
    response.truncate(MessageHeader::SIZE);
    response.make_response();
    response.header_delay = 4000;
    response.payload_delay = 1000;
    port.calls.clear();
    port.now = 15000;
    dtu.complete_noc_request(response, &mut port).unwrap();

    assert_eq!(
        port.scheduled(),
        vec![(DtuEvent::FinishMessageTransmission, 20000)]
    );
    assert!(dtu.is_busy());

    dtu.handle_event(DtuEvent::FinishMessageTransmission, &mut port)
        .unwrap();
    assert!(!dtu.is_busy());
    assert_eq!(dtu.command().opcode, CommandOpcode::Idle);
    assert_eq!(dtu.stats().messages_sent, 1);
    assert_eq!(dtu.stats().bytes_sent, 16);
    assert_eq!(dtu.stats().errors, 0);
}

#[test]
fn scratchpad_read_aligns_to_clock_edge() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 8);
    port.now = 1500;
    start(&mut dtu, &mut port, 0).unwrap();
    assert_eq!(port.spm_requests()[0].1, 3000);
}

#[test]
fn error_response_rejects_transfer() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 16);
    start(&mut dtu, &mut port, 0).unwrap();

    let mut response = Packet::write_req(0x102, MessageHeader::new(0, 0, 16).to_bytes().to_vec());
    response.make_error_response();
    port.now = 9000;

    assert_eq!(
        dtu.complete_noc_request(response, &mut port),
        Err(DtuError::TransferRejected { ep: 0 })
    );
    assert!(
        port.scheduled()
            .contains(&(DtuEvent::FinishMessageTransmission, 9000))
    );
    assert_eq!(dtu.stats().transfers_rejected, 1);
    assert_eq!(dtu.stats().errors, 1);
}

#[test]
fn untagged_completion_is_rejected() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 16);
    let mut pkt = Packet::read_req(MESSAGE_ADDR, 16);
    pkt.make_response();
    assert_eq!(
        dtu.complete_spm_request(pkt, &mut port),
        Err(DtuError::MissingTag)
    );
}

// ══════════════════════════════════════════════════════════
// 2. Atomic mode
// ══════════════════════════════════════════════════════════

#[test]
fn atomic_transmission_completes_inline() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 16);
    let pkt = command_write(&dtu, CommandOpcode::StartOperation, 0);
    dtu.handle_cpu_request(pkt, &mut port).unwrap();

    assert!(!dtu.is_busy());
    assert_eq!(dtu.command().opcode, CommandOpcode::Idle);
    match port.calls.as_slice() {
        [Call::CpuResponse { when: 0, .. }, Call::AtomicNoc { pkt }] => {
            assert_eq!(pkt.addr(), NocAddr::new(1, 2).encode(8));
            assert_eq!(
                pkt.data(),
                MessageHeader::new(0, 0, 16).frame(&payload(16)).as_slice()
            );
        }
        other => panic!("unexpected calls {other:?}"),
    }
    assert!(port.scheduled().is_empty());
}

#[test]
fn atomic_remote_failure_rejects_transfer() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 16);
    port.noc_outcome = Err(DtuError::BufferOverflow { ep: 2 });

    assert_eq!(
        start(&mut dtu, &mut port, 0),
        Err(DtuError::TransferRejected { ep: 0 })
    );
    assert!(!dtu.is_busy());
    assert_eq!(dtu.stats().transfers_rejected, 1);
    assert_eq!(dtu.stats().messages_sent, 1);
}

#[test]
fn message_outside_scratchpad_faults() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 16);
    dtu.regs_mut().configure_endpoint(
        0,
        &EndpointConfig::Transmit {
            message_addr: 0x3FF8,
            message_size: 16,
            target_core: 1,
            target_ep: 2,
        },
    );
    assert_eq!(
        start(&mut dtu, &mut port, 0),
        Err(DtuError::SpmAccessFault {
            addr: 0x3FF8,
            size: 16
        })
    );
    assert!(!dtu.is_busy());
    assert!(port.noc_requests().is_empty());
}

// ══════════════════════════════════════════════════════════
// 3. Command validation
// ══════════════════════════════════════════════════════════

#[test]
fn busy_unit_rejects_second_start() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 16);
    start(&mut dtu, &mut port, 0).unwrap();
    assert_eq!(
        start(&mut dtu, &mut port, 0),
        Err(DtuError::EndpointBusy { ep: 0 })
    );
    assert!(dtu.is_busy());
    assert_eq!(port.spm_requests().len(), 1);
}

#[test]
fn empty_message_is_rejected() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 0);
    assert_eq!(
        start(&mut dtu, &mut port, 0),
        Err(DtuError::EmptyMessage { ep: 0 })
    );
    assert!(!dtu.is_busy());
}

#[test]
fn message_must_leave_room_for_header() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 124);
    assert_eq!(
        start(&mut dtu, &mut port, 0),
        Err(DtuError::MessageTooLarge {
            ep: 0,
            size: 124,
            max: 128
        })
    );

    let (mut dtu, mut port) = setup(TimingMode::Atomic, 123);
    assert_eq!(start(&mut dtu, &mut port, 0), Ok(()));
}

#[test]
fn receive_endpoint_cannot_transmit() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 16);
    assert_eq!(
        start(&mut dtu, &mut port, 1),
        Err(DtuError::InvalidEndpointMode { ep: 1, mode: 0 })
    );
}

#[test]
fn endpoint_out_of_range() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 16);
    assert_eq!(
        start(&mut dtu, &mut port, 4),
        Err(DtuError::EndpointOutOfRange {
            ep: 4,
            num_endpoints: 4
        })
    );
}

#[rstest]
#[case::atomic(TimingMode::Atomic)]
#[case::timed(TimingMode::Timed)]
fn target_endpoint_out_of_range(#[case] mode: TimingMode) {
    let (mut dtu, mut port) = setup(mode, 16);
    dtu.regs_mut().set_ep_reg(0, EpReg::TargetEpId, 257);
    assert_eq!(
        start(&mut dtu, &mut port, 0),
        Err(DtuError::EndpointOutOfRange {
            ep: 257,
            num_endpoints: 4
        })
    );
    assert!(!dtu.is_busy());
    assert!(port.calls.is_empty());
}

#[rstest]
#[case::atomic(TimingMode::Atomic)]
#[case::timed(TimingMode::Timed)]
fn target_core_must_fit_noc_address(#[case] mode: TimingMode) {
    let (mut dtu, mut port) = setup(mode, 16);
    dtu.regs_mut().set_ep_reg(0, EpReg::TargetCoreId, (1 << 56) | 1);
    assert_eq!(
        start(&mut dtu, &mut port, 0),
        Err(DtuError::Unroutable {
            core: (1 << 56) | 1
        })
    );
    assert!(!dtu.is_busy());
    assert!(port.calls.is_empty());

    dtu.regs_mut().set_ep_reg(0, EpReg::TargetCoreId, (1 << 56) - 1);
    assert_eq!(start(&mut dtu, &mut port, 0), Ok(()));
}

#[test]
fn target_rewritten_during_read_finishes_with_error() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 16);
    start(&mut dtu, &mut port, 0).unwrap();
    dtu.regs_mut().set_ep_reg(0, EpReg::TargetEpId, 9);

    let resp = port.serve_spm_request().unwrap();
    port.calls.clear();
    assert_eq!(
        dtu.complete_spm_request(resp, &mut port),
        Err(DtuError::EndpointOutOfRange {
            ep: 9,
            num_endpoints: 4
        })
    );
    assert!(!dtu.is_busy());
    assert!(port.noc_requests().is_empty());
    assert_eq!(dtu.stats().messages_sent, 0);
}

#[test]
fn invalid_opcode_is_reported() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 16);
    dtu.regs_mut().set_dtu_reg(DtuReg::Command, 0x3);
    assert_eq!(dtu.execute_command(&mut port), Err(DtuError::InvalidOpcode(3)));
    assert_eq!(dtu.stats().commands_executed, 1);
    assert_eq!(dtu.stats().errors, 1);
}

#[test]
fn idle_command_does_nothing() {
    let (mut dtu, mut port) = setup(TimingMode::Atomic, 16);
    dtu.regs_mut().set_dtu_reg(DtuReg::Command, 0);
    assert_eq!(dtu.execute_command(&mut port), Ok(()));
    assert!(port.calls.is_empty());
}

#[test]
fn bad_register_access_returns_error_response() {
    let (mut dtu, mut port) = setup(TimingMode::Timed, 16);
    let pkt = Packet::read_req(0xF000_0004, 8);
    assert_eq!(
        dtu.handle_cpu_request(pkt, &mut port),
        Err(DtuError::InvalidRegisterAccess {
            offset: 0x4,
            size: 8
        })
    );
    match port.calls.as_slice() {
        [Call::CpuResponse { pkt, .. }] => {
            assert!(pkt.is_error());
            assert_eq!(pkt.addr(), 0xF000_0004);
        }
        other => panic!("unexpected calls {other:?}"),
    }
}
