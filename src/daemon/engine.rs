//! Session engine for the break-reminder daemon.
//!
//! Wraps the pure session state machine with its collaborators: the
//! durable store (rewritten after every mutation), the alerter (results
//! discarded) and the nag alarm (stopped on every popup-dismissing path).

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::alert::Alerter;
use crate::daemon::nag::NagAlarm;
use crate::store::StateStore;
use crate::types::{Awaiting, ConfigParams, Session, TimerConfig, Transition};

// ============================================================================
// SessionEngine
// ============================================================================

/// Owns the session and drives every state transition.
///
/// All methods are synchronous field updates followed by a synchronous
/// persist; the single-threaded daemon guarantees one operation completes
/// fully before the next begins.
pub struct SessionEngine {
    /// The one process-wide session
    session: Session,
    /// Current (clamped) configuration
    config: TimerConfig,
    /// Durable storage for both records
    store: StateStore,
    /// Best-effort alert delivery
    alerter: Arc<dyn Alerter>,
    /// Repeating alert while a popup choice is pending
    nag: NagAlarm,
}

impl SessionEngine {
    /// Loads configuration and session from the store and builds the
    /// engine. The session arrives already normalized.
    pub fn new(store: StateStore, alerter: Arc<dyn Alerter>) -> Self {
        let config = store.load_config();
        let session = store.load_session(&config);
        Self {
            session,
            config,
            store,
            alerter,
            nag: NagAlarm::new(),
        }
    }

    /// Returns the current session snapshot.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the current configuration.
    pub fn config(&self) -> TimerConfig {
        self.config
    }

    /// Starts or resumes the countdown. Dismisses any open popup.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.session.start(&self.config, now);
        self.nag.stop();
        self.persist();
    }

    /// Pauses the running countdown.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.session.pause(now);
        self.persist();
    }

    /// Resets the countdown to the canonical duration for the current
    /// mode. The nag alarm stays: reset does not dismiss a popup.
    pub fn reset(&mut self) {
        self.session.reset(&self.config);
        self.persist();
    }

    /// Advances the countdown and fires the side effects of at most one
    /// end-of-interval transition.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let was_running = self.session.running;
        let transition = self.session.tick(&self.config, now);

        if let Some(transition) = transition {
            let (title, body) = transition_message(&transition);
            let _ = self.alerter.notify(&title, &body);
            let _ = self.alerter.play_sound();
            let _ = self.alerter.demand_attention();
            self.nag.start(self.alerter.clone(), title, body);
        }

        if was_running {
            self.persist();
        }
    }

    /// Confirms the break-start popup with an optional task note.
    pub fn commit_break(&mut self, task: &str, now: DateTime<Utc>) {
        self.session.commit_break_choice(&self.config, task, now);
        self.nag.stop();
        self.persist();
    }

    /// Confirms the break-end popup, or skips from break straight to work.
    pub fn commit_work(&mut self, now: DateTime<Utc>) {
        self.session.commit_work_choice(&self.config, now);
        self.nag.stop();
        self.persist();
    }

    /// Discards the pending break decision and works a little longer.
    pub fn snooze(&mut self, minutes: u32, now: DateTime<Utc>) {
        self.session.snooze(minutes, now);
        self.nag.stop();
        self.persist();
    }

    /// Applies a partial configuration update, clamped.
    ///
    /// A parked or in-flight countdown is never retroactively altered;
    /// the new durations apply from the next start or reset.
    pub fn set_config(&mut self, params: &ConfigParams) {
        self.config = params.apply(&self.config);
        self.persist();
    }

    /// Restores the default configuration.
    pub fn reset_config(&mut self) {
        self.config = TimerConfig::default();
        self.persist();
    }

    /// Reinitializes the session to defaults (normalized to idle with a
    /// full work interval). Dismisses any open popup.
    pub fn reset_session(&mut self) {
        self.session = Session::new();
        self.session.normalize(&self.config);
        self.nag.stop();
        self.persist();
    }

    /// Returns true while the nag alarm task is alive.
    pub fn nag_active(&self) -> bool {
        self.nag.is_active()
    }

    /// Final persist and nag teardown before the daemon exits.
    pub fn shutdown(&mut self) {
        self.nag.stop();
        self.persist();
    }

    fn persist(&self) {
        self.store.persist(&self.config, &self.session);
    }
}

/// Notification text for an end-of-interval transition.
fn transition_message(transition: &Transition) -> (String, String) {
    match transition {
        Transition::WorkEnded { long_break: true } => (
            "作業終了".to_string(),
            "長い休憩の時間です".to_string(),
        ),
        Transition::WorkEnded { long_break: false } => (
            "作業終了".to_string(),
            "休憩を始めましょう".to_string(),
        ),
        Transition::BreakEnded { next_task } if !next_task.is_empty() => (
            "休憩終了".to_string(),
            format!("次のタスク: {}", next_task),
        ),
        Transition::BreakEnded { .. } => (
            "休憩終了".to_string(),
            "作業を再開しましょう".to_string(),
        ),
    }
}

/// Engine state helpers shared with the request handler.
impl SessionEngine {
    /// Returns true while the countdown is advancing.
    pub fn is_running(&self) -> bool {
        self.session.running
    }

    /// Returns the pending popup choice.
    pub fn awaiting(&self) -> Awaiting {
        self.session.awaiting
    }
}

// ============================================================================
// Tests
// ============================================================================
