//! Integration tests for the session engine lifecycle.
//!
//! These tests drive the engine with a simulated clock through complete
//! work/break cycles and verify:
//! - End-of-interval transitions and their alerts
//! - Long-break cadence across many loops
//! - Nag alarm teardown on every popup-dismissing path
//! - State recovery across an engine restart

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use kyukei::alert::MockAlerter;
use kyukei::store::StateStore;
use kyukei::types::{Awaiting, ConfigParams, Mode};
use kyukei::SessionEngine;

// ============================================================================
// Test Helpers
// ============================================================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
}

fn after_minutes(minutes: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(minutes)
}

fn create_engine() -> (SessionEngine, Arc<MockAlerter>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::with_dir(dir.path());
    let alerter = Arc::new(MockAlerter::new());
    let engine = SessionEngine::new(store, alerter.clone());
    (engine, alerter, dir)
}

// ============================================================================
// Complete Cycle
// ============================================================================

/// A full loop: work, break reminder, break, back-to-work reminder, work.
#[tokio::test]
async fn test_complete_work_break_cycle() {
    let (mut engine, alerter, _dir) = create_engine();

    // Work interval
    engine.start(t0());
    assert!(engine.is_running());
    assert_eq!(engine.session().mode, Mode::Work);

    // Work expires
    engine.tick(after_minutes(26));
    assert_eq!(engine.awaiting(), Awaiting::Break);
    assert!(!engine.is_running());
    assert!(engine.nag_active());

    // User confirms the break with a task note
    engine.commit_break("write report", after_minutes(27));
    assert_eq!(engine.session().mode, Mode::Break);
    assert!(engine.is_running());
    assert!(!engine.nag_active());

    // Break expires
    engine.tick(after_minutes(33));
    assert_eq!(engine.awaiting(), Awaiting::Work);
    assert!(engine.nag_active());

    // The break-end alert surfaces the captured task
    let notifications = alerter.notifications();
    let last = notifications.last().unwrap();
    assert_eq!(last.0, "休憩終了");
    assert_eq!(last.1, "次のタスク: write report");

    // User confirms work; the note is consumed
    engine.commit_work(after_minutes(33));
    assert_eq!(engine.session().mode, Mode::Work);
    assert!(engine.is_running());
    assert!(engine.session().next_task.is_empty());
    assert!(!engine.nag_active());
}

/// An overdue tick collapses to a single transition and a single alert.
#[tokio::test]
async fn test_overdue_expiry_alerts_once() {
    let (mut engine, alerter, _dir) = create_engine();
    engine.start(t0());

    // Several hours late, then more ticks.
    engine.tick(after_minutes(300));
    engine.tick(after_minutes(301));
    engine.tick(after_minutes(302));

    assert_eq!(alerter.notifications().len(), 1);
    assert_eq!(alerter.sound_count(), 1);
}

// ============================================================================
// Long-Break Cadence
// ============================================================================

/// Every 4th committed loop gets the long break; the counter then resets.
#[tokio::test]
async fn test_long_break_every_fourth_loop() {
    let (mut engine, _alerter, _dir) = create_engine();
    let mut now = t0();
    let mut long_breaks = Vec::new();

    for _ in 0..8 {
        engine.start(now);
        now += Duration::minutes(30);
        engine.tick(now);
        assert_eq!(engine.awaiting(), Awaiting::Break);
        long_breaks.push(engine.session().next_break_long);

        engine.commit_break("", now);
        now += Duration::minutes(30);
        engine.tick(now);
        engine.commit_work(now);
        now += Duration::minutes(1);
        engine.pause(now);
        engine.reset();
    }

    assert_eq!(
        long_breaks,
        vec![false, false, false, true, false, false, false, true]
    );
    assert_eq!(engine.session().loops_since_long_break, 0);
}

/// A snoozed reminder neither advances nor resets the cadence.
#[tokio::test]
async fn test_snooze_leaves_cadence_alone() {
    let (mut engine, _alerter, _dir) = create_engine();

    // Two committed loops first.
    let mut now = t0();
    for _ in 0..2 {
        engine.start(now);
        now += Duration::minutes(30);
        engine.tick(now);
        engine.commit_break("", now);
        now += Duration::minutes(30);
        engine.tick(now);
        engine.commit_work(now);
        now += Duration::minutes(1);
        engine.pause(now);
        engine.reset();
    }
    assert_eq!(engine.session().loops_since_long_break, 2);

    // Third work interval expires but is snoozed away, twice.
    engine.start(now);
    now += Duration::minutes(30);
    engine.tick(now);
    engine.snooze(5, now);
    now += Duration::minutes(6);
    engine.tick(now);
    engine.snooze(5, now);

    assert_eq!(engine.session().loops_since_long_break, 2);
}

// ============================================================================
// Nag Alarm Guarantees
// ============================================================================

/// The nag alarm must die on every path that dismisses the popup.
#[tokio::test]
async fn test_nag_stops_on_every_dismissal_path() {
    type Dismiss = fn(&mut SessionEngine, DateTime<Utc>);
    let paths: Vec<(&str, Dismiss)> = vec![
        ("commit_break", |e, now| e.commit_break("", now)),
        ("commit_work", |e, now| e.commit_work(now)),
        ("snooze", |e, now| e.snooze(5, now)),
        ("start", |e, now| e.start(now)),
        ("reset_session", |e, _| e.reset_session()),
    ];

    for (name, dismiss) in paths {
        let (mut engine, _alerter, _dir) = create_engine();
        engine.start(t0());
        engine.tick(after_minutes(26));
        assert!(engine.nag_active(), "nag not started before {}", name);

        dismiss(&mut engine, after_minutes(27));

        assert!(!engine.nag_active(), "nag still active after {}", name);
        assert_eq!(engine.awaiting(), Awaiting::None, "popup open after {}", name);
    }
}

/// Reset puts time back on the clock but does not dismiss the popup, so
/// the nag keeps going.
#[tokio::test]
async fn test_reset_does_not_dismiss_popup() {
    let (mut engine, _alerter, _dir) = create_engine();
    engine.start(t0());
    engine.tick(after_minutes(26));
    assert!(engine.nag_active());

    engine.reset();

    assert_eq!(engine.awaiting(), Awaiting::Break);
    assert!(engine.nag_active());
}

/// Shutdown tears the nag down.
#[tokio::test]
async fn test_shutdown_stops_nag() {
    let (mut engine, _alerter, _dir) = create_engine();
    engine.start(t0());
    engine.tick(after_minutes(26));
    assert!(engine.nag_active());

    engine.shutdown();

    assert!(!engine.nag_active());
}

// ============================================================================
// Restart Recovery
// ============================================================================

/// A running countdown survives a daemon restart by its absolute deadline.
#[tokio::test]
async fn test_running_countdown_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let alerter: Arc<MockAlerter> = Arc::new(MockAlerter::new());

    let deadline = {
        let store = StateStore::with_dir(dir.path());
        let mut engine = SessionEngine::new(store, alerter.clone());
        engine.start(t0());
        engine.session().ends_at.unwrap()
    };

    let store = StateStore::with_dir(dir.path());
    let mut engine = SessionEngine::new(store, alerter);
    assert!(engine.is_running());
    assert_eq!(engine.session().ends_at, Some(deadline));

    // The restarted engine still fires the transition at the deadline.
    engine.tick(deadline + Duration::seconds(1));
    assert_eq!(engine.awaiting(), Awaiting::Break);
}

/// A parked popup state survives a restart without normalization.
#[tokio::test]
async fn test_parked_popup_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let alerter: Arc<MockAlerter> = Arc::new(MockAlerter::new());

    {
        let store = StateStore::with_dir(dir.path());
        let mut engine = SessionEngine::new(store, alerter.clone());
        engine.start(t0());
        engine.tick(after_minutes(26));
        assert_eq!(engine.awaiting(), Awaiting::Break);
    }

    let store = StateStore::with_dir(dir.path());
    let engine = SessionEngine::new(store, alerter);
    assert_eq!(engine.awaiting(), Awaiting::Break);
    assert_eq!(engine.session().remaining_ms, 0);
    assert!(!engine.is_running());
}

/// Cadence and task note survive a restart mid-break.
#[tokio::test]
async fn test_cadence_and_task_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let alerter: Arc<MockAlerter> = Arc::new(MockAlerter::new());

    {
        let store = StateStore::with_dir(dir.path());
        let mut engine = SessionEngine::new(store, alerter.clone());
        engine.start(t0());
        engine.tick(after_minutes(26));
        engine.commit_break("write report", after_minutes(26));
    }

    let store = StateStore::with_dir(dir.path());
    let engine = SessionEngine::new(store, alerter);
    assert_eq!(engine.session().loops_since_long_break, 1);
    assert_eq!(engine.session().next_task, "write report");
    assert_eq!(engine.session().mode, Mode::Break);
}

/// An interrupted lifetime that left "00:00, not running" on disk loads
/// as a fresh idle session instead of a frozen screen.
#[tokio::test]
async fn test_stale_zero_state_recovers_to_idle() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(
        dir.path().join("session.json"),
        r#"{"mode": "work", "awaiting": "none", "running": false, "endsAt": null,
            "remainingMs": 0, "loopsSinceLongBreak": 1, "isNextBreakLong": false,
            "nextTask": ""}"#,
    )
    .unwrap();

    let store = StateStore::with_dir(dir.path());
    let alerter: Arc<MockAlerter> = Arc::new(MockAlerter::new());
    let engine = SessionEngine::new(store, alerter);

    assert_eq!(engine.session().mode, Mode::Idle);
    assert_eq!(engine.session().remaining_ms, 25 * 60_000);
    assert_eq!(engine.session().loops_since_long_break, 1);
}

// ============================================================================
// Configuration Interplay
// ============================================================================

/// A config change while the countdown runs does not shorten it; the new
/// durations arrive with the next start.
#[tokio::test]
async fn test_config_change_not_retroactive() {
    let (mut engine, _alerter, _dir) = create_engine();
    engine.start(t0());

    engine.set_config(&ConfigParams {
        work_minutes: Some(1),
        ..ConfigParams::default()
    });

    // Still no transition at the old 25-minute deadline minus a bit.
    engine.tick(after_minutes(20));
    assert!(engine.is_running());
    assert_eq!(engine.awaiting(), Awaiting::None);

    // The old deadline still applies.
    engine.tick(after_minutes(26));
    assert_eq!(engine.awaiting(), Awaiting::Break);

    // After dismissal, the next work interval uses the new duration.
    engine.commit_work(after_minutes(26));
    assert_eq!(engine.session().remaining_ms, 60_000);
}
