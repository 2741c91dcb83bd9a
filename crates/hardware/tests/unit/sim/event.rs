//! Event Queue Tests.

use dtusim_core::dtu::DtuEvent;
use dtusim_core::sim::event::{Event, EventQueue};
use pretty_assertions::assert_eq;

fn dtu_event(core: usize) -> Event {
    Event::Dtu {
        core,
        event: DtuEvent::FinishMessageTransmission,
    }
}

#[test]
fn pops_in_tick_order() {
    let mut q = EventQueue::new();
    q.schedule(30, dtu_event(3));
    q.schedule(10, dtu_event(1));
    q.schedule(20, dtu_event(2));

    assert_eq!(q.len(), 3);
    assert_eq!(q.peek_tick(), Some(10));
    assert_eq!(q.pop(), Some((10, dtu_event(1))));
    assert_eq!(q.pop(), Some((20, dtu_event(2))));
    assert_eq!(q.pop(), Some((30, dtu_event(3))));
    assert!(q.is_empty());
    assert_eq!(q.pop(), None);
}

#[test]
fn same_tick_keeps_schedule_order() {
    let mut q = EventQueue::new();
    for core in 0..5 {
        q.schedule(100, dtu_event(core));
    }
    let order: Vec<_> = std::iter::from_fn(|| q.pop()).map(|(_, e)| e).collect();
    assert_eq!(order, (0..5).map(dtu_event).collect::<Vec<_>>());
}
