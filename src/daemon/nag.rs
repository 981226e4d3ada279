//! Repeating nag alert for unanswered transition popups.
//!
//! While the session is parked awaiting a popup choice, the daemon keeps
//! re-alerting the user on a fixed period. The alarm is an explicitly
//! owned repeating task plus its cancellation handle; it carries no state
//! beyond "active or not" and must be stopped on every path that
//! dismisses the popup, or the repeating alert dangles.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

use crate::alert::Alerter;

/// Period between repeated nag alerts.
const NAG_PERIOD: Duration = Duration::from_secs(60);

// ============================================================================
// NagAlarm
// ============================================================================

/// A cancellable repeating alert.
pub struct NagAlarm {
    /// Handle of the running nag task, if any
    handle: Option<JoinHandle<()>>,
}

impl NagAlarm {
    /// Creates an inactive alarm.
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Starts nagging with the given message, replacing any previous nag.
    ///
    /// The first repeat fires one full period after the initial alert the
    /// caller has already delivered.
    pub fn start(&mut self, alerter: Arc<dyn Alerter>, title: String, body: String) {
        self.stop();
        debug!("ナグアラームを開始します: {}", title);

        let handle = tokio::spawn(async move {
            let mut ticker = interval(NAG_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick completes immediately; consume it so
            // the initial alert is not doubled.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let _ = alerter.notify(&title, &body);
                let _ = alerter.play_sound();
                let _ = alerter.demand_attention();
            }
        });
        self.handle = Some(handle);
    }

    /// Stops the alarm. Safe to call when inactive.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("ナグアラームを停止します");
            handle.abort();
        }
    }

    /// Returns true while the nag task is alive.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Default for NagAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NagAlarm {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Tests
// ============================================================================
