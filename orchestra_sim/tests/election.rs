//! End-to-end election runs over the real conductor and channel transport.
//!
//! All tests run on tokio's paused clock, so heartbeat and lease timing is
//! deterministic and the five-second performances take no wall time.

use std::collections::HashSet;
use std::time::Duration;

use orchestra_core::{Position, ProtocolConfig, Roster, RosterEntry};
use orchestra_env::MusicianId;
use orchestra_sim::{Orchestra, PerformerEvent, PerformerEventKind};

fn m(index: usize) -> MusicianId {
    MusicianId::from_index(index)
}

fn entry(index: usize, x: i64, y: i64, priority_value: u64) -> RosterEntry {
    RosterEntry {
        id: m(index),
        position: Position::new(x, y),
        priority_value,
    }
}

/// Collects events until `done` says the picture is complete.
async fn collect_until(
    orchestra: &mut Orchestra,
    done: impl Fn(&[PerformerEvent]) -> bool,
) -> Vec<PerformerEvent> {
    let mut events = Vec::new();
    while !done(&events) {
        match tokio::time::timeout(Duration::from_secs(120), orchestra.next_event()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) => panic!("orchestra shut down early; saw {events:?}"),
            Err(_) => panic!("timed out waiting for events; saw {events:?}"),
        }
    }
    events
}

fn ids_with(events: &[PerformerEvent], kind: PerformerEventKind) -> HashSet<MusicianId> {
    events
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| e.id)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn line_of_three_elects_middle_and_losers_restart() {
    // A(5) - B(9) - C(3); A,C out of range of each other.
    let roster = Roster::from_entries(vec![
        entry(0, 0, 0, 5),
        entry(1, 2, 0, 9),
        entry(2, 4, 0, 3),
    ]);
    let mut orchestra = Orchestra::start(&roster, ProtocolConfig::default());

    let events = collect_until(&mut orchestra, |events| {
        // Winner confirmed, both losers yielded, performance over, and both
        // losers restarted the round after the lease ran out.
        ids_with(events, PerformerEventKind::PerformanceFinished).contains(&m(1))
            && ids_with(events, PerformerEventKind::RoundRestarted).len() == 2
    })
    .await;

    assert_eq!(
        ids_with(&events, PerformerEventKind::BecameWinner),
        HashSet::from([m(1)])
    );
    assert_eq!(
        ids_with(&events, PerformerEventKind::BecameLoser),
        HashSet::from([m(0), m(2)])
    );
    assert_eq!(
        ids_with(&events, PerformerEventKind::RoundRestarted),
        HashSet::from([m(0), m(2)])
    );

    // The losers restart only after the winner's lease ran dry, never
    // mid-performance.
    let finished_at = events
        .iter()
        .position(|e| e.kind == PerformerEventKind::PerformanceFinished)
        .unwrap();
    let first_restart = events
        .iter()
        .position(|e| e.kind == PerformerEventKind::RoundRestarted)
        .unwrap();
    assert!(first_restart > finished_at);

    orchestra.shutdown();
}

#[tokio::test(start_paused = true)]
async fn fully_connected_group_has_exactly_one_winner() {
    // Everyone within range of everyone: the global maximum wins, all
    // others yield.
    let roster = Roster::from_entries(vec![
        entry(0, 0, 0, 10),
        entry(1, 1, 0, 20),
        entry(2, 0, 1, 30),
        entry(3, 1, 1, 40),
    ]);
    let mut orchestra = Orchestra::start(&roster, ProtocolConfig::default());

    let events = collect_until(&mut orchestra, |events| {
        ids_with(events, PerformerEventKind::BecameLoser).len() == 3
    })
    .await;

    assert_eq!(
        ids_with(&events, PerformerEventKind::BecameWinner),
        HashSet::from([m(3)])
    );
    assert_eq!(
        ids_with(&events, PerformerEventKind::BecameLoser),
        HashSet::from([m(0), m(1), m(2)])
    );

    orchestra.shutdown();
}

#[tokio::test(start_paused = true)]
async fn equal_priority_neighbors_stall_under_literal_policy() {
    // The documented liveness gap: strict `>` makes equal-valued neighbors
    // mutually reject and both sit in Unknown forever. The run produces no
    // transition events at all.
    let roster = Roster::from_entries(vec![entry(0, 0, 0, 7), entry(1, 1, 0, 7)]);
    let mut orchestra = Orchestra::start(&roster, ProtocolConfig::default());

    let outcome =
        tokio::time::timeout(Duration::from_secs(300), orchestra.next_event()).await;
    assert!(outcome.is_err(), "expected a stall, got {outcome:?}");

    orchestra.shutdown();
}

#[tokio::test(start_paused = true)]
async fn id_tie_break_resolves_equal_priorities_when_enabled() {
    let roster = Roster::from_entries(vec![entry(0, 0, 0, 7), entry(1, 1, 0, 7)]);
    let config = ProtocolConfig {
        tie_break_by_id: true,
        ..Default::default()
    };
    let mut orchestra = Orchestra::start(&roster, config);

    let events = collect_until(&mut orchestra, |events| {
        !ids_with(events, PerformerEventKind::BecameLoser).is_empty()
    })
    .await;

    // Higher id wins the tie.
    assert_eq!(
        ids_with(&events, PerformerEventKind::BecameWinner),
        HashSet::from([m(1)])
    );
    assert_eq!(
        ids_with(&events, PerformerEventKind::BecameLoser),
        HashSet::from([m(0)])
    );

    orchestra.shutdown();
}

#[tokio::test(start_paused = true)]
async fn seeded_roster_reaches_a_performance() {
    // Full pipeline: parse text, draw seeded priorities, elect. With three
    // musicians drawing from 0..81, seed 42 gives distinct values, so some
    // local maximum must win and perform.
    let roster = Roster::parse("3\n0 0\n2 0\n4 0\n", 42).unwrap();

    // The literal tie policy stalls equal-valued neighbors; this test is
    // about the happy path, so bail out on the (tiny) chance the seed drew
    // a tie on an edge of the line.
    let values: Vec<u64> = roster.entries().iter().map(|e| e.priority_value).collect();
    if values[0] == values[1] || values[1] == values[2] {
        return;
    }

    let mut orchestra = Orchestra::start(&roster, ProtocolConfig::default());

    let events = collect_until(&mut orchestra, |events| {
        !ids_with(events, PerformerEventKind::PerformanceFinished).is_empty()
    })
    .await;

    let winners = ids_with(&events, PerformerEventKind::BecameWinner);
    assert!(!winners.is_empty());

    orchestra.shutdown();
}
