//! Clock Tests.

use dtusim_core::sim::Clock;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case::on_edge(2000, 0, 2000)]
#[case::between_edges(2001, 0, 3000)]
#[case::delay_from_edge(2000, 3, 5000)]
#[case::delay_between_edges(2500, 1, 4000)]
fn clock_edge(#[case] now: u64, #[case] cycles: u64, #[case] expected: u64) {
    assert_eq!(Clock::new(1000).clock_edge(now, cycles), expected);
}

#[test]
fn conversions() {
    let clk = Clock::new(250);
    assert_eq!(clk.period(), 250);
    assert_eq!(clk.cycles_to_ticks(4), 1000);
    assert_eq!(clk.ticks_to_cycles(1001), 5);
    assert_eq!(clk.next_edge(1), 250);
}

#[test]
fn zero_period_is_one_tick() {
    let clk = Clock::new(0);
    assert_eq!(clk.period(), 1);
    assert_eq!(clk.clock_edge(7, 2), 9);
}
