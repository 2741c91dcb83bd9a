//! Statistics Tests.

use dtusim_core::stats::{DtuStats, SimStats};
use pretty_assertions::assert_eq;

#[test]
fn dtu_stats_accumulate() {
    let mut total = DtuStats::default();
    let a = DtuStats {
        messages_sent: 2,
        bytes_sent: 100,
        errors: 1,
        ..DtuStats::default()
    };
    let b = DtuStats {
        messages_received: 2,
        bytes_received: 108,
        read_ptr_increments: 1,
        ..DtuStats::default()
    };
    total += &a;
    total += &b;
    assert_eq!(
        total,
        DtuStats {
            messages_sent: 2,
            bytes_sent: 100,
            messages_received: 2,
            bytes_received: 108,
            read_ptr_increments: 1,
            errors: 1,
            ..DtuStats::default()
        }
    );
}

#[test]
fn dtu_stats_serialize_to_json() {
    let stats = DtuStats {
        commands_executed: 4,
        ..DtuStats::default()
    };
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["commands_executed"], 4);
    assert_eq!(json["transfers_rejected"], 0);
}

#[test]
fn print_handles_empty_stats() {
    SimStats::default().print();
    SimStats::default().print_sections(&["transmit".to_string()]);
}
