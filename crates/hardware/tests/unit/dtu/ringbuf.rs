//! Receive Ring Tests.
//!
//! Verifies pointer wraparound, full/empty accounting and the ring invariants
//! under arbitrary produce/consume sequences.

use dtusim_core::common::DtuError;
use dtusim_core::dtu::ringbuf::{RingState, advance};
use dtusim_core::dtu::{EndpointConfig, EpReg, RegFile};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const SLOT: u64 = 64;

fn ring(addr: u64, slots: u64) -> RingState {
    RingState {
        addr,
        slots,
        read_ptr: addr,
        write_ptr: addr,
        count: 0,
    }
}

#[test]
fn advance_wraps_at_end() {
    assert_eq!(advance(0x1000, 0x1000, 3, SLOT), 0x1040);
    assert_eq!(advance(0x1040, 0x1000, 3, SLOT), 0x1080);
    assert_eq!(advance(0x1080, 0x1000, 3, SLOT), 0x1000);
}

#[test]
fn single_slot_ring_stays_put() {
    assert_eq!(advance(0x200, 0x200, 1, SLOT), 0x200);
}

#[test]
fn produce_until_full() {
    let mut r = ring(0, 2);
    r.produce(4, SLOT).unwrap();
    r.produce(4, SLOT).unwrap();
    assert!(r.is_full());
    assert_eq!(r.write_ptr, 0);
    assert_eq!(r.produce(4, SLOT), Err(DtuError::BufferOverflow { ep: 4 }));
    assert_eq!(r.count, 2);
}

#[test]
fn consume_empty_ring_underflows() {
    let mut r = ring(0x100, 4);
    assert!(r.is_empty());
    assert_eq!(r.consume(1, SLOT), Err(DtuError::BufferUnderflow { ep: 1 }));
    assert_eq!(r.read_ptr, 0x100);
}

#[test]
fn zero_slot_ring_is_always_full() {
    let r = ring(0, 0);
    assert!(r.is_full());
    assert!(r.is_empty());
}

#[test]
fn free_slot_looks_ahead() {
    let mut r = ring(0x1000, 3);
    r.write_ptr = 0x1040;
    assert_eq!(r.free_slot(0, SLOT), 0x1040);
    assert_eq!(r.free_slot(1, SLOT), 0x1080);
    assert_eq!(r.free_slot(2, SLOT), 0x1000);
}

#[test]
fn load_and_store_use_endpoint_registers() {
    let mut regs = RegFile::new(2);
    regs.configure_endpoint(1, &EndpointConfig::Receive { buffer_addr: 0x400, slots: 2 });
    let mut r = RingState::load(&regs, 1);
    assert_eq!(r, ring(0x400, 2));

    r.produce(1, SLOT).unwrap();
    r.store(&mut regs, 1);
    assert_eq!(regs.read_ep_reg(1, EpReg::BufferWritePtr), 0x440);
    assert_eq!(regs.read_ep_reg(1, EpReg::BufferMessageCount), 1);
    assert_eq!(regs.read_ep_reg(1, EpReg::BufferReadPtr), 0x400);
}

proptest! {
    #[test]
    fn invariants_hold_for_any_sequence(
        slots in 1u64..8,
        ops in proptest::collection::vec(any::<bool>(), 0..64),
    ) {
        let addr = 0x2000;
        let end = addr + slots * SLOT;
        let mut r = ring(addr, slots);
        for produce in ops {
            let before = r.count;
            let result = if produce { r.produce(0, SLOT) } else { r.consume(0, SLOT) };
            match (produce, result) {
                (true, Ok(())) => prop_assert_eq!(r.count, before + 1),
                (false, Ok(())) => prop_assert_eq!(r.count, before - 1),
                (_, Err(_)) => prop_assert_eq!(r.count, before),
            }
            prop_assert!(r.count <= slots);
            for ptr in [r.read_ptr, r.write_ptr] {
                prop_assert!(ptr >= addr && ptr < end);
                prop_assert_eq!((ptr - addr) % SLOT, 0);
            }
            let distance = (r.write_ptr + slots * SLOT - r.read_ptr) % (slots * SLOT);
            prop_assert_eq!(distance / SLOT, r.count % slots);
        }
    }
}
