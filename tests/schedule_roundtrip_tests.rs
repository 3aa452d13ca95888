//! End-to-end scheduling tests against the real in-process timer backend.
//!
//! These exercise the scheduler the way the daemon uses it: arm pairs into
//! `InProcessTimers`, observe the armed table through an inspector handle,
//! and verify the idempotence and isolation guarantees.

use chrono::{Duration, Local, Timelike};
use dawnr::backend::InProcessTimers;
use dawnr::backend::timers::TimerInspector;
use dawnr::scheduler::AlarmScheduler;
use dawnr::store::{Alarm, AlarmStore};
use dawnr::trigger::Meridiem;
use tempfile::tempdir;

/// An alarm two hours from the real clock, so nothing fires during a test.
fn alarm_two_hours_out(id: &str) -> Alarm {
    let target = Local::now() + Duration::hours(2);
    let (hour, minute) = (target.hour(), target.minute());
    let (hour12, meridiem) = match hour {
        0 => (12, Meridiem::Am),
        1..=11 => (hour, Meridiem::Am),
        12 => (12, Meridiem::Pm),
        _ => (hour - 12, Meridiem::Pm),
    };
    Alarm {
        id: id.to_string(),
        hour: hour12,
        minute,
        am_pm: meridiem,
        sound: "naturalsound_birds".to_string(),
        theme: String::new(),
        enabled: true,
        repeat_days: vec![],
    }
}

fn scheduler_with_inspector() -> (AlarmScheduler, TimerInspector) {
    // The scheduler logs every armed pair; keep the test run quiet.
    dawnr::logger::Log::set_enabled(false);
    let timers = InProcessTimers::new(Box::new(|_| {}));
    let inspector = timers.inspector();
    (
        AlarmScheduler::new(Box::new(timers), Duration::minutes(20)),
        inspector,
    )
}

fn sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort();
    ids
}

#[test]
fn schedule_arms_exactly_one_pair() {
    let (mut scheduler, inspector) = scheduler_with_inspector();

    let outcome = scheduler.schedule(&alarm_two_hours_out("41")).unwrap();
    assert!(outcome.exact);
    assert_eq!(sorted(inspector.armed_request_ids()), vec![82, 83]);
}

#[test]
fn cancel_after_schedule_leaves_nothing_armed() {
    let (mut scheduler, inspector) = scheduler_with_inspector();

    scheduler.schedule(&alarm_two_hours_out("7")).unwrap();
    assert_eq!(inspector.armed_request_ids().len(), 2);

    scheduler.cancel(7);
    assert!(inspector.armed_request_ids().is_empty());

    // cancel is idempotent
    scheduler.cancel(7);
    assert!(inspector.armed_request_ids().is_empty());
}

#[test]
fn rescheduling_replaces_rather_than_accumulates() {
    let (mut scheduler, inspector) = scheduler_with_inspector();

    scheduler.schedule(&alarm_two_hours_out("3")).unwrap();
    scheduler.schedule(&alarm_two_hours_out("3")).unwrap();
    scheduler.schedule(&alarm_two_hours_out("3")).unwrap();

    assert_eq!(sorted(inspector.armed_request_ids()), vec![6, 7]);
}

#[test]
fn rearm_all_arms_enabled_alarms_and_skips_the_rest() {
    let dir = tempdir().unwrap();
    let store = AlarmStore::open(dir.path().join("alarms.json")).unwrap();

    store.upsert(&alarm_two_hours_out("1")).unwrap();
    store.upsert(&alarm_two_hours_out("2")).unwrap();
    let mut disabled = alarm_two_hours_out("3");
    disabled.enabled = false;
    store.upsert(&disabled).unwrap();
    let mut malformed = alarm_two_hours_out("not-numeric");
    malformed.id = "not-numeric".to_string();
    store.upsert(&malformed).unwrap();

    let (mut scheduler, inspector) = scheduler_with_inspector();
    let armed = scheduler.rearm_all(&store).unwrap();

    assert_eq!(armed, 2);
    assert_eq!(sorted(inspector.armed_request_ids()), vec![2, 3, 4, 5]);
}

#[test]
fn distinct_alarms_occupy_distinct_slots() {
    let (mut scheduler, inspector) = scheduler_with_inspector();

    scheduler.schedule(&alarm_two_hours_out("1")).unwrap();
    scheduler.schedule(&alarm_two_hours_out("2")).unwrap();
    assert_eq!(sorted(inspector.armed_request_ids()), vec![2, 3, 4, 5]);

    scheduler.cancel(1);
    assert_eq!(sorted(inspector.armed_request_ids()), vec![4, 5]);
}
