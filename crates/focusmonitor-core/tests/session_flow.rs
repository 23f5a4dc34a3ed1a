//! End-to-end flow tests: state machine -> record store -> aggregator.
//!
//! These drive the same path the CLI takes, against an in-memory store.

use chrono::{DateTime, Duration, Utc};
use focusmonitor_core::history::{self, DayLabel, DayStats};
use focusmonitor_core::{Event, FocusMachine, RecordStore, StoreError, TimerStatus, UserSettings};

fn t0() -> DateTime<Utc> {
    "2026-03-10T09:00:00Z".parse().unwrap()
}

/// Drive a machine to completion and return the emitted record.
fn run_to_completion(
    machine: &mut FocusMachine,
    duration_min: u32,
    start: DateTime<Utc>,
) -> focusmonitor_core::FocusRecord {
    machine.start_instant(duration_min, start).unwrap();
    let ticks = u64::from(duration_min) * 60;
    for i in 0..ticks {
        if let Some(Event::SessionCompleted { record, .. }) =
            machine.tick(start + Duration::seconds(i as i64 + 1))
        {
            return record;
        }
    }
    panic!("countdown never completed");
}

#[test]
fn completed_session_lands_in_the_store() {
    let store = RecordStore::open_memory().unwrap();
    let mut machine = FocusMachine::new();

    let record = run_to_completion(&mut machine, 25, t0());
    store.append(&record).unwrap();

    // The machine is back to empty/idle regardless of what storage did.
    assert!(machine.is_empty());
    assert_eq!(machine.timer().remaining_secs, 0);
    assert_eq!(machine.timer().status, TimerStatus::Idle);

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].actual_duration_min, 25);
    assert_eq!(all[0].date, t0() + Duration::seconds(1500));
}

#[test]
fn duplicate_append_is_surfaced_but_machine_already_moved_on() {
    let store = RecordStore::open_memory().unwrap();
    let mut machine = FocusMachine::new();

    let record = run_to_completion(&mut machine, 1, t0());
    store.append(&record).unwrap();
    // A second append of the same record is the caller's error to report;
    // the machine finished its transition long ago.
    assert!(matches!(
        store.append(&record),
        Err(StoreError::DuplicateId(_))
    ));
    assert!(machine.is_empty());
}

#[test]
fn two_sessions_roll_up_into_day_stats() {
    let store = RecordStore::open_memory().unwrap();
    let mut machine = FocusMachine::new();

    let first = run_to_completion(&mut machine, 25, t0());
    store.append(&first).unwrap();
    let second = run_to_completion(&mut machine, 10, t0() + Duration::hours(2));
    store.append(&second).unwrap();

    let records = store.list_all().unwrap();
    let stats = history::stats_for_day(&records, t0().date_naive());
    assert_eq!(
        stats,
        DayStats {
            total_min: 35,
            session_count: 2
        }
    );

    let settings = UserSettings::default();
    assert_eq!(history::goal_progress(stats, &settings), 29); // 35 of 120
}

#[test]
fn history_buckets_span_today_and_yesterday() {
    let store = RecordStore::open_memory().unwrap();
    let mut machine = FocusMachine::new();

    let yesterday = run_to_completion(&mut machine, 10, t0() - Duration::days(1));
    store.append(&yesterday).unwrap();
    let today = run_to_completion(&mut machine, 25, t0());
    store.append(&today).unwrap();

    let records = store.list_all().unwrap();
    let buckets = history::group_by_day(&records, t0().date_naive());
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].label, DayLabel::Today);
    assert_eq!(buckets[0].records[0].actual_duration_min, 25);
    assert_eq!(buckets[1].label, DayLabel::Yesterday);
}

#[test]
fn scheduled_session_completes_via_catch_up() {
    let store = RecordStore::open_memory().unwrap();
    let mut machine = FocusMachine::new();

    let start_at = t0() + Duration::minutes(5);
    machine.schedule(10, start_at, t0()).unwrap();

    // Come back an hour later: the session started at its instant and ran
    // out ten minutes after.
    let events = machine.catch_up(t0() + Duration::hours(1));
    let mut appended = 0;
    for event in events {
        if let Event::SessionCompleted { record, .. } = event {
            store.append(&record).unwrap();
            appended += 1;
            assert_eq!(record.date, start_at + Duration::minutes(10));
        }
    }
    assert_eq!(appended, 1);
    assert!(machine.is_empty());
}

#[test]
fn stopped_session_leaves_no_trace_in_history() {
    let store = RecordStore::open_memory().unwrap();
    let mut machine = FocusMachine::new();

    machine.start_instant(25, t0()).unwrap();
    for i in 0..600 {
        machine.tick(t0() + Duration::seconds(i + 1));
    }
    machine.stop(t0() + Duration::seconds(601)).unwrap();

    assert!(store.list_all().unwrap().is_empty());
    let stats = history::stats_for_day(&store.list_all().unwrap(), t0().date_naive());
    assert_eq!(stats.session_count, 0);
}

#[test]
fn machine_survives_kv_round_trip_mid_session() {
    let store = RecordStore::open_memory().unwrap();
    let mut machine = FocusMachine::new();
    machine.start_instant(25, t0()).unwrap();
    for i in 0..100 {
        machine.tick(t0() + Duration::seconds(i + 1));
    }

    let json = serde_json::to_string(&machine).unwrap();
    store.kv_set("focus_machine", &json).unwrap();

    let restored: FocusMachine =
        serde_json::from_str(&store.kv_get("focus_machine").unwrap().unwrap()).unwrap();
    assert_eq!(restored.timer().remaining_secs, 1400);
    assert_eq!(restored.timer().status, TimerStatus::Running);
}
