//! Command Register Tests.
//!
//! Verifies field extraction for the default and custom layouts, opcode
//! classification and layout validation.

use dtusim_core::common::ConfigError;
use dtusim_core::config::DtuConfig;
use dtusim_core::dtu::{Command, CommandLayout, CommandOpcode};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

fn default_layout() -> CommandLayout {
    CommandLayout::from_config(&DtuConfig::default()).unwrap()
}

// ══════════════════════════════════════════════════════════
// 1. Decoding
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::idle(0x0, CommandOpcode::Idle, 0, 0)]
#[case::start_ep0(0x1, CommandOpcode::StartOperation, 0, 0)]
#[case::start_ep3((0x10 << 10) | (3 << 2) | 1, CommandOpcode::StartOperation, 3, 0x10)]
#[case::increment_ep7((7 << 2) | 2, CommandOpcode::IncrementReadPtr, 7, 0)]
#[case::invalid_opcode(0x3, CommandOpcode::Invalid(3), 0, 0)]
#[case::max_ep(255 << 2, CommandOpcode::Idle, 255, 0)]
fn decode_default_layout(
    #[case] raw: u64,
    #[case] opcode: CommandOpcode,
    #[case] ep_id: usize,
    #[case] offset: u64,
) {
    assert_eq!(
        default_layout().decode(raw),
        Command::new(opcode, ep_id, offset)
    );
}

#[test]
fn decode_ignores_bits_above_the_layout() {
    let layout = default_layout();
    let raw = (1u64 << 63) | (5 << 2) | 1;
    let cmd = layout.decode(raw);
    assert_eq!(cmd.opcode, CommandOpcode::StartOperation);
    assert_eq!(cmd.ep_id, 5);
    assert_eq!(cmd.offset, 0);
}

#[test]
fn custom_layout_moves_fields() {
    let layout = CommandLayout::new(4, 4, 8).unwrap();
    let raw = (0xAB << 8) | (0x6 << 4) | 0x2;
    assert_eq!(
        layout.decode(raw),
        Command::new(CommandOpcode::IncrementReadPtr, 6, 0xAB)
    );
}

#[test]
fn wide_opcode_field_reports_raw_value() {
    let layout = CommandLayout::new(4, 8, 32).unwrap();
    assert_eq!(layout.decode(0xF).opcode, CommandOpcode::Invalid(0xF));
}

// ══════════════════════════════════════════════════════════
// 2. Encoding
// ══════════════════════════════════════════════════════════

#[test]
fn encode_places_fields() {
    let raw = default_layout().encode(&Command::new(CommandOpcode::StartOperation, 3, 0x10));
    assert_eq!(raw, (0x10 << 10) | (3 << 2) | 1);
}

#[test]
fn encode_truncates_oversized_fields() {
    let layout = CommandLayout::new(2, 2, 4).unwrap();
    let raw = layout.encode(&Command::new(CommandOpcode::StartOperation, 0x7, 0x1F));
    assert_eq!(layout.decode(raw), Command::new(CommandOpcode::StartOperation, 0x3, 0xF));
}

proptest! {
    #[test]
    fn fields_within_width_survive_encoding(
        opcode in 0u64..4,
        ep in 0usize..256,
        offset in 0u64..(1 << 32),
    ) {
        let layout = default_layout();
        let cmd = Command::new(CommandOpcode::from(opcode), ep, offset);
        prop_assert_eq!(layout.decode(layout.encode(&cmd)), cmd);
    }
}

// ══════════════════════════════════════════════════════════
// 3. Layout validation
// ══════════════════════════════════════════════════════════

#[test]
fn layout_exactly_filling_register_is_accepted() {
    let layout = CommandLayout::new(2, 30, 32).unwrap();
    assert_eq!(
        (layout.opcode_bits(), layout.epid_bits(), layout.offset_bits()),
        (2, 30, 32)
    );
}

#[rstest]
#[case::too_wide(2, 31, 32)]
#[case::no_opcode(0, 8, 32)]
fn bad_layouts_are_rejected(#[case] opcode: u32, #[case] epid: u32, #[case] offset: u32) {
    let err = CommandLayout::new(opcode, epid, offset).unwrap_err();
    assert!(matches!(err, ConfigError::CommandLayout { width: 64, .. }));
}

#[test]
fn opcode_bits_round_trip() {
    for raw in 0..8 {
        assert_eq!(CommandOpcode::from(raw).bits(), raw);
    }
}
