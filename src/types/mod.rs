//! Core data types for the break-reminder timer.
//!
//! This module defines the data structures used for:
//! - The session state machine (mode, awaiting-choice gating, countdown)
//! - Timer configuration with clamping
//! - IPC request/response serialization

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds per configured minute.
const MINUTE_MS: i64 = 60_000;

// ============================================================================
// Mode
// ============================================================================

/// The interval that is conceptually active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No interval has been started yet
    #[default]
    Idle,
    /// Work interval
    Work,
    /// Break interval (short or long, see `Session::next_break_long`)
    Break,
}

impl Mode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Work => "work",
            Mode::Break => "break",
        }
    }
}

// ============================================================================
// Awaiting
// ============================================================================

/// Gates what the next "start" action does while a transition popup is open.
///
/// Set when an interval expires and cleared when the user acts on the
/// popup (confirm, snooze, or a superseding start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Awaiting {
    /// No popup choice is pending
    #[default]
    None,
    /// Work ended; the next start begins a break
    Break,
    /// Break ended; the next start begins work
    Work,
}

impl Awaiting {
    /// Returns the string representation of the pending choice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Awaiting::None => "none",
            Awaiting::Break => "break",
            Awaiting::Work => "work",
        }
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

/// Configuration for the break-reminder timer.
///
/// Values are clamped, never rejected: any integer input produces a usable
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    /// Work duration in minutes (clamped to 1-240)
    pub work_minutes: u32,
    /// Break duration in minutes (clamped to 1-120)
    pub break_minutes: u32,
    /// Long break duration in minutes (clamped to 1-240)
    pub long_break_minutes: u32,
    /// Completed work/break loops between long breaks (clamped to 2-20)
    pub long_break_every: u32,
}

/// Valid range for `work_minutes`.
pub const WORK_MINUTES_RANGE: (u32, u32) = (1, 240);
/// Valid range for `break_minutes`.
pub const BREAK_MINUTES_RANGE: (u32, u32) = (1, 120);
/// Valid range for `long_break_minutes`.
pub const LONG_BREAK_MINUTES_RANGE: (u32, u32) = (1, 240);
/// Valid range for `long_break_every`.
pub const LONG_BREAK_EVERY_RANGE: (u32, u32) = (2, 20);

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
            long_break_minutes: 15,
            long_break_every: 4,
        }
    }
}

impl TimerConfig {
    /// Returns a copy with every field clamped into its documented range.
    ///
    /// Clamping is idempotent: `c.clamped().clamped() == c.clamped()`.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            work_minutes: self
                .work_minutes
                .clamp(WORK_MINUTES_RANGE.0, WORK_MINUTES_RANGE.1),
            break_minutes: self
                .break_minutes
                .clamp(BREAK_MINUTES_RANGE.0, BREAK_MINUTES_RANGE.1),
            long_break_minutes: self
                .long_break_minutes
                .clamp(LONG_BREAK_MINUTES_RANGE.0, LONG_BREAK_MINUTES_RANGE.1),
            long_break_every: self
                .long_break_every
                .clamp(LONG_BREAK_EVERY_RANGE.0, LONG_BREAK_EVERY_RANGE.1),
        }
    }

    /// Work duration in milliseconds.
    pub fn work_ms(&self) -> i64 {
        i64::from(self.work_minutes) * MINUTE_MS
    }

    /// Short break duration in milliseconds.
    pub fn break_ms(&self) -> i64 {
        i64::from(self.break_minutes) * MINUTE_MS
    }

    /// Long break duration in milliseconds.
    pub fn long_break_ms(&self) -> i64 {
        i64::from(self.long_break_minutes) * MINUTE_MS
    }
}

// ============================================================================
// Transition
// ============================================================================

/// End-of-interval transition emitted by `Session::tick`.
///
/// The daemon turns these into notifications and the repeating nag alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A work interval expired; the session is parked awaiting the break
    /// popup choice.
    WorkEnded {
        /// Whether the upcoming break is the long one
        long_break: bool,
    },
    /// A break interval expired; the session is parked awaiting the work
    /// popup choice.
    BreakEnded {
        /// Task note captured when the break was committed (possibly empty)
        next_task: String,
    },
}

// ============================================================================
// Session
// ============================================================================

/// The mutable timer session: one instance, process-wide.
///
/// Exactly one of `ends_at` (while running) and `remaining_ms` (while
/// paused, parked or idle) is meaningful at any time, selected by
/// `running`. `remaining_ms` is stored signed and clamped at display time.
///
/// All operations are total: they take the configuration and the current
/// wall-clock reading explicitly and never fail. Persistence is the
/// caller's responsibility after each mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// What interval is conceptually active
    pub mode: Mode,
    /// Pending popup choice, if any
    pub awaiting: Awaiting,
    /// Whether the countdown is actively advancing
    pub running: bool,
    /// Countdown deadline; `Some` exactly while running
    pub ends_at: Option<DateTime<Utc>>,
    /// Remaining milliseconds, authoritative while not running
    pub remaining_ms: i64,
    /// Work/break loops completed since the last long break was granted
    pub loops_since_long_break: u32,
    /// Whether the next break is the long one, decided at work-end
    pub next_break_long: bool,
    /// One-shot task note captured at break-commit, shown at break-end
    pub next_task: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a fresh session: idle, not awaiting, not running.
    pub fn new() -> Self {
        Self {
            mode: Mode::Idle,
            awaiting: Awaiting::None,
            running: false,
            ends_at: None,
            remaining_ms: 0,
            loops_since_long_break: 0,
            next_break_long: false,
            next_task: String::new(),
        }
    }

    /// Starts or resumes the countdown, gated by `awaiting`.
    ///
    /// - awaiting a break: begins the break decided at work-end
    /// - awaiting work: begins a work interval
    /// - otherwise: resumes from `remaining_ms` when nonzero, else begins
    ///   a full interval for the current mode (idle becomes work)
    pub fn start(&mut self, config: &TimerConfig, now: DateTime<Utc>) {
        match self.awaiting {
            Awaiting::Break => {
                self.mode = Mode::Break;
                self.awaiting = Awaiting::None;
                let duration = self.break_duration_ms(config);
                self.begin_countdown(duration, now);
            }
            Awaiting::Work => {
                self.mode = Mode::Work;
                self.awaiting = Awaiting::None;
                self.begin_countdown(config.work_ms(), now);
            }
            Awaiting::None => {
                if self.mode == Mode::Idle {
                    self.mode = Mode::Work;
                }
                let duration = if self.remaining_ms > 0 {
                    self.remaining_ms
                } else {
                    self.canonical_duration_ms(config)
                };
                self.begin_countdown(duration, now);
            }
        }
    }

    /// Pauses a running countdown, capturing the signed remaining time.
    ///
    /// Does nothing while not running.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if !self.running {
            return;
        }
        self.remaining_ms = self
            .ends_at
            .map_or(0, |ends| (ends - now).num_milliseconds());
        self.running = false;
        self.ends_at = None;
    }

    /// Stops the countdown and restores the canonical duration for the
    /// current mode.
    ///
    /// Leaves `awaiting`, the cadence counter and the task note untouched.
    pub fn reset(&mut self, config: &TimerConfig) {
        self.running = false;
        self.ends_at = None;
        self.remaining_ms = self.canonical_duration_ms(config);
    }

    /// Advances the countdown to `now` and fires at most one
    /// end-of-interval transition.
    ///
    /// A tick that arrives far past the deadline still collapses to a
    /// single transition. Idle has no natural expiry.
    pub fn tick(&mut self, config: &TimerConfig, now: DateTime<Utc>) -> Option<Transition> {
        if !self.running {
            return None;
        }
        let ends = self.ends_at?;
        self.remaining_ms = (ends - now).num_milliseconds();
        if self.remaining_ms > 0 {
            return None;
        }
        match self.mode {
            Mode::Idle => None,
            Mode::Work => Some(self.on_work_ended(config)),
            Mode::Break => Some(self.on_break_ended()),
        }
    }

    /// Confirms the break-start popup: captures the task note, advances
    /// the long-break cadence and begins the break countdown.
    ///
    /// The cadence counter moves only here, not at work-end, so a popup
    /// that sits unanswered (or is snoozed away) never double-counts.
    pub fn commit_break_choice(&mut self, config: &TimerConfig, task: &str, now: DateTime<Utc>) {
        self.next_task = task.trim().to_string();
        if self.next_break_long {
            self.loops_since_long_break = 0;
        } else {
            self.loops_since_long_break += 1;
        }
        self.mode = Mode::Break;
        self.awaiting = Awaiting::None;
        let duration = self.break_duration_ms(config);
        self.begin_countdown(duration, now);
    }

    /// Confirms the break-end popup (or skips straight to work from the
    /// break-start popup): clears the task note and begins work.
    pub fn commit_work_choice(&mut self, config: &TimerConfig, now: DateTime<Utc>) {
        self.next_task.clear();
        self.next_break_long = false;
        self.mode = Mode::Work;
        self.awaiting = Awaiting::None;
        self.begin_countdown(config.work_ms(), now);
    }

    /// Escape hatch: discards any pending break decision and runs a short
    /// work countdown of the given length. The cadence counter is not
    /// touched.
    pub fn snooze(&mut self, minutes: u32, now: DateTime<Utc>) {
        self.awaiting = Awaiting::None;
        self.next_break_long = false;
        self.mode = Mode::Work;
        self.begin_countdown(i64::from(minutes) * MINUTE_MS, now);
    }

    /// Remaining milliseconds for display, clamped at zero.
    pub fn remaining_display_ms(&self, now: DateTime<Utc>) -> i64 {
        let remaining = if self.running {
            self.ends_at
                .map_or(0, |ends| (ends - now).num_milliseconds())
        } else {
            self.remaining_ms
        };
        remaining.max(0)
    }

    /// Guards against an unrecoverable display state after a restart: a
    /// session that is not running, has nothing left on the clock and is
    /// not awaiting a choice is forced back to idle with a full work
    /// interval on the clock.
    pub fn normalize(&mut self, config: &TimerConfig) {
        if !self.running && self.remaining_ms <= 0 && self.awaiting == Awaiting::None {
            self.mode = Mode::Idle;
            self.remaining_ms = config.work_ms();
        }
    }

    /// Work ended: park the session awaiting the break popup and decide
    /// whether the upcoming break is the long one. The cadence counter is
    /// deliberately not advanced until the break is committed.
    fn on_work_ended(&mut self, config: &TimerConfig) -> Transition {
        self.running = false;
        self.ends_at = None;
        self.remaining_ms = 0;
        self.awaiting = Awaiting::Break;
        self.next_break_long = (self.loops_since_long_break + 1) % config.long_break_every == 0;
        Transition::WorkEnded {
            long_break: self.next_break_long,
        }
    }

    /// Break ended: park the session awaiting the work popup. The task
    /// note travels with the transition and is cleared only when work
    /// actually resumes.
    fn on_break_ended(&mut self) -> Transition {
        self.running = false;
        self.ends_at = None;
        self.remaining_ms = 0;
        self.awaiting = Awaiting::Work;
        Transition::BreakEnded {
            next_task: self.next_task.clone(),
        }
    }

    fn begin_countdown(&mut self, duration_ms: i64, now: DateTime<Utc>) {
        self.running = true;
        self.remaining_ms = duration_ms;
        self.ends_at = Some(now + Duration::milliseconds(duration_ms));
    }

    /// Duration of the break decided at work-end time.
    fn break_duration_ms(&self, config: &TimerConfig) -> i64 {
        if self.next_break_long {
            config.long_break_ms()
        } else {
            config.break_ms()
        }
    }

    /// Full interval length for the current mode.
    fn canonical_duration_ms(&self, config: &TimerConfig) -> i64 {
        match self.mode {
            Mode::Break => self.break_duration_ms(config),
            Mode::Work | Mode::Idle => config.work_ms(),
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// Partial configuration carried by the set-config command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigParams {
    /// Work duration in minutes
    #[serde(rename = "workMinutes", skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<u32>,
    /// Break duration in minutes
    #[serde(rename = "breakMinutes", skip_serializing_if = "Option::is_none")]
    pub break_minutes: Option<u32>,
    /// Long break duration in minutes
    #[serde(rename = "longBreakMinutes", skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<u32>,
    /// Loops between long breaks
    #[serde(rename = "longBreakEvery", skip_serializing_if = "Option::is_none")]
    pub long_break_every: Option<u32>,
}

impl ConfigParams {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.work_minutes.is_none()
            && self.break_minutes.is_none()
            && self.long_break_minutes.is_none()
            && self.long_break_every.is_none()
    }

    /// Merges the set fields over `base` and clamps the result.
    #[must_use]
    pub fn apply(&self, base: &TimerConfig) -> TimerConfig {
        TimerConfig {
            work_minutes: self.work_minutes.unwrap_or(base.work_minutes),
            break_minutes: self.break_minutes.unwrap_or(base.break_minutes),
            long_break_minutes: self.long_break_minutes.unwrap_or(base.long_break_minutes),
            long_break_every: self.long_break_every.unwrap_or(base.long_break_every),
        }
        .clamped()
    }
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Start or resume the countdown (awaiting-gated)
    Start,
    /// Pause the running countdown
    Pause,
    /// Reset the countdown to the canonical duration for the current mode
    Reset,
    /// Query the current session snapshot
    Status,
    /// Confirm the break-start popup, optionally capturing a task note
    CommitBreak {
        /// Task note for after the break
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task: Option<String>,
    },
    /// Confirm the break-end popup (or skip straight to work)
    CommitWork,
    /// Discard the pending break decision and work a little longer
    Snooze {
        /// Snooze length in minutes
        minutes: u32,
    },
    /// Query the current configuration
    GetConfig,
    /// Update configuration fields (clamped, never rejected)
    SetConfig {
        /// Fields to update
        #[serde(flatten)]
        params: ConfigParams,
    },
    /// Restore the default configuration
    ResetConfig,
    /// Reinitialize the session to defaults
    ResetSession,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Pending popup choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<String>,
    /// Whether the countdown is advancing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    /// Remaining milliseconds, clamped at zero
    #[serde(rename = "remainingMs", skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<i64>,
    /// Loops since the last long break
    #[serde(
        rename = "loopsSinceLongBreak",
        skip_serializing_if = "Option::is_none"
    )]
    pub loops_since_long_break: Option<u32>,
    /// Whether the next break is the long one
    #[serde(rename = "nextBreakLong", skip_serializing_if = "Option::is_none")]
    pub next_break_long: Option<bool>,
    /// Pending task note
    #[serde(rename = "nextTask", skip_serializing_if = "Option::is_none")]
    pub next_task: Option<String>,
    /// Current configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<TimerConfig>,
}

impl ResponseData {
    /// Creates response data from a session snapshot.
    pub fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        Self {
            mode: Some(session.mode.as_str().to_string()),
            awaiting: Some(session.awaiting.as_str().to_string()),
            running: Some(session.running),
            remaining_ms: Some(session.remaining_display_ms(now)),
            loops_since_long_break: Some(session.loops_since_long_break),
            next_break_long: Some(session.next_break_long),
            next_task: if session.next_task.is_empty() {
                None
            } else {
                Some(session.next_task.clone())
            },
            config: None,
        }
    }

    /// Attaches the current configuration to the response.
    #[must_use]
    pub fn with_config(mut self, config: TimerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Creates response data carrying only the configuration.
    pub fn from_config(config: TimerConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
