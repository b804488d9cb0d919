use hostpool_core::{EventQueue, SimTime};

#[derive(Clone, Debug, PartialEq)]
enum Action {
    Ping(u32),
    Chain { left: u32 },
}

fn drain(queue: &mut EventQueue<Action>, until: SimTime, log: &mut Vec<(SimTime, Action)>) {
    while let Some(event) = queue.pop_due(until) {
        log.push((event.time, event.data.clone()));
        if let Action::Chain { left } = event.data {
            if left > 0 {
                queue.schedule_now(Action::Chain { left: left - 1 });
            }
        }
    }
}

#[test]
fn test_same_time_events_fire_in_scheduling_order() {
    let mut queue = EventQueue::new(0);
    queue.schedule(10, Action::Ping(1));
    queue.schedule(5, Action::Ping(2));
    queue.schedule(10, Action::Ping(3));
    queue.schedule(5, Action::Ping(4));

    let mut log = Vec::new();
    drain(&mut queue, 100, &mut log);
    assert_eq!(
        log,
        vec![
            (5, Action::Ping(2)),
            (5, Action::Ping(4)),
            (10, Action::Ping(1)),
            (10, Action::Ping(3)),
        ]
    );
    assert!(queue.is_empty());
    assert_eq!(queue.event_count(), 4);
}

#[test]
fn test_pop_due_stops_at_bound_and_tracks_event_time() {
    let mut queue = EventQueue::new(0);
    queue.schedule(3, Action::Ping(1));
    queue.schedule(7, Action::Ping(2));

    let first = queue.pop_due(5).unwrap();
    assert_eq!(first.time, 3);
    // the clock follows the event, not the drain bound
    assert_eq!(queue.time(), 3);
    assert!(queue.pop_due(5).is_none());
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.next_time(), Some(7));

    queue.set_time(5);
    assert_eq!(queue.time(), 5);
    assert_eq!(queue.pop_next().unwrap().data, Action::Ping(2));
    assert_eq!(queue.time(), 7);
}

#[test]
fn test_chain_reaction_settles_before_later_events() {
    let mut queue = EventQueue::new(0);
    queue.schedule(10, Action::Chain { left: 3 });
    queue.schedule(10, Action::Ping(1));
    queue.schedule(11, Action::Ping(2));

    let mut log = Vec::new();
    drain(&mut queue, 20, &mut log);
    assert_eq!(
        log,
        vec![
            (10, Action::Chain { left: 3 }),
            (10, Action::Ping(1)),
            (10, Action::Chain { left: 2 }),
            (10, Action::Chain { left: 1 }),
            (10, Action::Chain { left: 0 }),
            (11, Action::Ping(2)),
        ]
    );
}

#[test]
fn test_schedule_in_is_relative_to_clock() {
    let mut queue = EventQueue::new(100);
    queue.schedule_in(20, Action::Ping(1));
    queue.schedule_now(Action::Ping(2));
    let pending: Vec<_> = queue.pending_events().map(|e| (e.time, e.data.clone())).collect();
    assert_eq!(pending, vec![(100, Action::Ping(2)), (120, Action::Ping(1))]);
}

#[test]
#[should_panic]
fn test_scheduling_in_the_past_panics() {
    let mut queue = EventQueue::new(50);
    queue.schedule(10, Action::Ping(1));
}

#[test]
#[should_panic]
fn test_clock_cannot_skip_pending_events() {
    let mut queue = EventQueue::new(0);
    queue.schedule(10, Action::Ping(1));
    queue.set_time(20);
}
