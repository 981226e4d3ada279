//! Attention-grabbing side effects for interval transitions.
//!
//! The daemon surfaces transition moments through three best-effort
//! channels: a desktop notification, an audible alert and a terminal
//! attention request. Every channel returns a `Result` that the caller
//! explicitly discards -- a failed alert must never block or roll back a
//! state transition, and the discard makes that contract visible at the
//! type level instead of hiding it behind blanket suppression.

mod sound;

pub use sound::BeepPlayer;

use thiserror::Error;
use tracing::debug;

// ============================================================================
// AlertError
// ============================================================================

/// Errors that can occur while delivering an alert.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The desktop notification could not be delivered.
    #[error("通知の送信に失敗しました: {0}")]
    NotifyFailed(String),

    /// No audio output device is available.
    #[error("オーディオデバイスが利用できません: {0}")]
    AudioUnavailable(String),

    /// Sound playback failed after the device was opened.
    #[error("サウンド再生に失敗しました: {0}")]
    PlaybackFailed(String),

    /// The attention request could not be written.
    #[error("注意喚起の出力に失敗しました: {0}")]
    AttentionFailed(String),
}

// ============================================================================
// Alerter
// ============================================================================

/// Best-effort delivery of transition alerts.
///
/// Implementations must never panic; any platform failure is reported
/// through the returned `Result` and swallowed by the caller.
pub trait Alerter: Send + Sync {
    /// Shows a desktop notification.
    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError>;

    /// Plays a short audible alert.
    fn play_sound(&self) -> Result<(), AlertError>;

    /// Asks the host environment to draw the user's eye to the timer.
    fn demand_attention(&self) -> Result<(), AlertError>;
}

// ============================================================================
// DesktopAlerter
// ============================================================================

/// Production alerter: OS notification via `notify-rust`, beep via
/// `rodio`, attention via the terminal bell.
pub struct DesktopAlerter {
    /// Beep player; `None` when no audio device was available at startup.
    player: Option<BeepPlayer>,
}

impl DesktopAlerter {
    /// Creates the alerter, degrading to notification-only when the audio
    /// stream cannot be opened.
    pub fn new() -> Self {
        let player = match BeepPlayer::new() {
            Ok(player) => Some(player),
            Err(e) => {
                tracing::warn!("オーディオを初期化できません（通知のみで続行します）: {}", e);
                None
            }
        };
        Self { player }
    }
}

impl Default for DesktopAlerter {
    fn default() -> Self {
        Self::new()
    }
}

impl Alerter for DesktopAlerter {
    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError> {
        debug!("通知を送信します: {}", title);
        notify_rust::Notification::new()
            .appname("kyukei")
            .summary(title)
            .body(body)
            .show()
            .map(|_| ())
            .map_err(|e| AlertError::NotifyFailed(e.to_string()))
    }

    fn play_sound(&self) -> Result<(), AlertError> {
        match &self.player {
            Some(player) => player.beep(),
            None => Err(AlertError::AudioUnavailable(
                "初期化時にデバイスがありませんでした".to_string(),
            )),
        }
    }

    fn demand_attention(&self) -> Result<(), AlertError> {
        use std::io::Write;

        // BEL: most terminals translate this into a bell or urgency hint.
        let mut stdout = std::io::stdout();
        stdout
            .write_all(b"\x07")
            .and_then(|()| stdout.flush())
            .map_err(|e| AlertError::AttentionFailed(e.to_string()))
    }
}

// ============================================================================
// MockAlerter
// ============================================================================

/// Test double that records every delivery attempt.
#[derive(Debug, Default)]
pub struct MockAlerter {
    notifications: std::sync::Mutex<Vec<(String, String)>>,
    sound_count: std::sync::atomic::AtomicUsize,
    attention_count: std::sync::atomic::AtomicUsize,
    should_fail: std::sync::atomic::AtomicBool,
}

impl MockAlerter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent delivery fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail
            .store(should_fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Returns the recorded `(title, body)` notifications.
    #[must_use]
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().unwrap().clone()
    }

    #[must_use]
    pub fn sound_count(&self) -> usize {
        self.sound_count.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[must_use]
    pub fn attention_count(&self) -> usize {
        self.attention_count
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    fn failing(&self) -> bool {
        self.should_fail.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Alerter for MockAlerter {
    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError> {
        if self.failing() {
            return Err(AlertError::NotifyFailed("mock failure".to_string()));
        }
        self.notifications
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(())
    }

    fn play_sound(&self) -> Result<(), AlertError> {
        if self.failing() {
            return Err(AlertError::PlaybackFailed("mock failure".to_string()));
        }
        self.sound_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn demand_attention(&self) -> Result<(), AlertError> {
        if self.failing() {
            return Err(AlertError::AttentionFailed("mock failure".to_string()));
        }
        self.attention_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
