//! Durable storage for the timer configuration and session.
//!
//! Two JSON records live under the state directory (`~/.kyukei` by
//! default): `config.json` and `session.json`. Loading is per-field
//! tolerant: every field is read individually with type checking, and
//! anything missing or malformed falls back to its documented default, so
//! a damaged record can never prevent startup. Writing is a synchronous
//! full rewrite of the record, last-write-wins.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::types::{Awaiting, Mode, Session, TimerConfig};

/// Default state directory under the home directory.
const STATE_DIR_NAME: &str = ".kyukei";

/// Configuration record file name.
const CONFIG_FILE: &str = "config.json";

/// Session record file name.
const SESSION_FILE: &str = "session.json";

// ============================================================================
// StateStore
// ============================================================================

/// File-backed store for the configuration and session records.
pub struct StateStore {
    /// Directory holding both records
    dir: PathBuf,
}

impl StateStore {
    /// Creates a store rooted at `~/.kyukei`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("ホームディレクトリが見つかりません")?;
        Ok(Self::with_dir(home.join(STATE_DIR_NAME)))
    }

    /// Creates a store rooted at an explicit directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the state directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the configuration record, clamping every field.
    ///
    /// Missing or malformed fields fall back to the defaults; an absent or
    /// unreadable record yields the all-defaults configuration.
    pub fn load_config(&self) -> TimerConfig {
        let defaults = TimerConfig::default();
        let Some(map) = read_record(&self.dir.join(CONFIG_FILE)) else {
            return defaults;
        };

        TimerConfig {
            work_minutes: field_u32(&map, "workMinutes").unwrap_or(defaults.work_minutes),
            break_minutes: field_u32(&map, "breakMinutes").unwrap_or(defaults.break_minutes),
            long_break_minutes: field_u32(&map, "longBreakMinutes")
                .unwrap_or(defaults.long_break_minutes),
            long_break_every: field_u32(&map, "longBreakEvery")
                .unwrap_or(defaults.long_break_every),
        }
        .clamped()
    }

    /// Loads the session record and runs the post-load normalization pass.
    ///
    /// A record claiming to run without a parseable deadline is demoted to
    /// not-running first; a parked-at-zero session that awaits nothing is
    /// then forced back to idle with a full work interval.
    pub fn load_session(&self, config: &TimerConfig) -> Session {
        let mut session = Session::new();

        if let Some(map) = read_record(&self.dir.join(SESSION_FILE)) {
            session.mode = field_as(&map, "mode").unwrap_or(Mode::Idle);
            session.awaiting = field_as(&map, "awaiting").unwrap_or(Awaiting::None);
            session.running = map.get("running").and_then(Value::as_bool).unwrap_or(false);
            session.ends_at = field_as::<DateTime<Utc>>(&map, "endsAt");
            session.remaining_ms = map
                .get("remainingMs")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            session.loops_since_long_break =
                field_u32(&map, "loopsSinceLongBreak").unwrap_or(0);
            session.next_break_long = map
                .get("isNextBreakLong")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            session.next_task = map
                .get("nextTask")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
        }

        if session.running && session.ends_at.is_none() {
            session.running = false;
        }
        if !session.running {
            session.ends_at = None;
        }
        session.normalize(config);
        session
    }

    /// Writes the configuration record.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the
    /// file cannot be written.
    pub fn save_config(&self, config: &TimerConfig) -> Result<()> {
        let record = json!({
            "workMinutes": config.work_minutes,
            "breakMinutes": config.break_minutes,
            "longBreakMinutes": config.long_break_minutes,
            "longBreakEvery": config.long_break_every,
        });
        self.write_record(CONFIG_FILE, &record)
    }

    /// Writes the session record.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory cannot be created or the
    /// file cannot be written.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let record = json!({
            "mode": session.mode,
            "awaiting": session.awaiting,
            "running": session.running,
            "endsAt": session.ends_at,
            "remainingMs": session.remaining_ms,
            "loopsSinceLongBreak": session.loops_since_long_break,
            "isNextBreakLong": session.next_break_long,
            "nextTask": session.next_task,
        });
        self.write_record(SESSION_FILE, &record)
    }

    /// Rewrites both records. Failures are logged and swallowed: a failed
    /// persist never rolls back a state transition.
    pub fn persist(&self, config: &TimerConfig, session: &Session) {
        if let Err(e) = self.save_config(config) {
            tracing::warn!("設定の保存に失敗しました: {:#}", e);
        }
        if let Err(e) = self.save_session(session) {
            tracing::warn!("セッションの保存に失敗しました: {:#}", e);
        }
    }

    fn write_record(&self, file: &str, record: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("状態ディレクトリを作成できません: {:?}", self.dir))?;
        let path = self.dir.join(file);
        let body = serde_json::to_string_pretty(record).context("レコードのシリアライズに失敗しました")?;
        fs::write(&path, body).with_context(|| format!("書き込みに失敗しました: {:?}", path))?;
        Ok(())
    }
}

// ============================================================================
// Field helpers
// ============================================================================

/// Reads a record file into a JSON object, tolerating every failure mode.
fn read_record(path: &Path) -> Option<Value> {
    let body = fs::read_to_string(path).ok()?;
    let value: Value = serde_json::from_str(&body).ok()?;
    value.is_object().then_some(value)
}

/// Extracts an unsigned integer field, rejecting non-numeric values.
fn field_u32(map: &Value, key: &str) -> Option<u32> {
    map.get(key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
}

/// Extracts a field through its serde representation, discarding
/// malformed values.
fn field_as<T: serde::de::DeserializeOwned>(map: &Value, key: &str) -> Option<T> {
    map.get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn temp_store() -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::with_dir(dir.path());
        (dir, store)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    // ------------------------------------------------------------------------
    // Config Record Tests
    // ------------------------------------------------------------------------

    mod config_tests {
        use super::*;

        #[test]
        fn test_missing_record_yields_defaults() {
            let (_dir, store) = temp_store();
            assert_eq!(store.load_config(), TimerConfig::default());
        }

        #[test]
        fn test_roundtrip() {
            let (_dir, store) = temp_store();
            let config = TimerConfig {
                work_minutes: 50,
                break_minutes: 10,
                long_break_minutes: 30,
                long_break_every: 3,
            };

            store.save_config(&config).unwrap();

            assert_eq!(store.load_config(), config);
        }

        #[test]
        fn test_out_of_range_fields_are_clamped() {
            let (dir, store) = temp_store();
            fs::write(
                dir.path().join("config.json"),
                r#"{"workMinutes": 9999, "breakMinutes": 0, "longBreakMinutes": 15, "longBreakEvery": 100}"#,
            )
            .unwrap();

            let config = store.load_config();

            assert_eq!(config.work_minutes, 240);
            assert_eq!(config.break_minutes, 1);
            assert_eq!(config.long_break_minutes, 15);
            assert_eq!(config.long_break_every, 20);
        }

        #[test]
        fn test_malformed_fields_fall_back_individually() {
            let (dir, store) = temp_store();
            fs::write(
                dir.path().join("config.json"),
                r#"{"workMinutes": "abc", "breakMinutes": 10, "longBreakMinutes": -3}"#,
            )
            .unwrap();

            let config = store.load_config();

            assert_eq!(config.work_minutes, 25);
            assert_eq!(config.break_minutes, 10);
            assert_eq!(config.long_break_minutes, 15);
            assert_eq!(config.long_break_every, 4);
        }

        #[test]
        fn test_garbage_record_yields_defaults() {
            let (dir, store) = temp_store();
            fs::write(dir.path().join("config.json"), "not json at all").unwrap();
            assert_eq!(store.load_config(), TimerConfig::default());
        }

        #[test]
        fn test_non_object_record_yields_defaults() {
            let (dir, store) = temp_store();
            fs::write(dir.path().join("config.json"), "[1, 2, 3]").unwrap();
            assert_eq!(store.load_config(), TimerConfig::default());
        }
    }

    // ------------------------------------------------------------------------
    // Session Record Tests
    // ------------------------------------------------------------------------

    mod session_tests {
        use super::*;

        #[test]
        fn test_missing_record_normalizes_to_idle() {
            let (_dir, store) = temp_store();
            let config = TimerConfig::default();

            let session = store.load_session(&config);

            assert_eq!(session.mode, Mode::Idle);
            assert_eq!(session.awaiting, Awaiting::None);
            assert!(!session.running);
            assert_eq!(session.remaining_ms, 25 * 60_000);
        }

        #[test]
        fn test_roundtrip_running_session() {
            let (_dir, store) = temp_store();
            let config = TimerConfig::default();
            let mut session = Session::new();
            session.start(&config, t0());
            session.loops_since_long_break = 2;
            session.next_task = "write report".to_string();

            store.save_session(&session).unwrap();
            let loaded = store.load_session(&config);

            assert_eq!(loaded, session);
        }

        #[test]
        fn test_roundtrip_paused_session() {
            let (_dir, store) = temp_store();
            let config = TimerConfig::default();
            let mut session = Session::new();
            session.start(&config, t0());
            session.pause(t0() + Duration::minutes(10));

            store.save_session(&session).unwrap();
            let loaded = store.load_session(&config);

            assert_eq!(loaded, session);
        }

        #[test]
        fn test_roundtrip_parked_session() {
            let (_dir, store) = temp_store();
            let config = TimerConfig::default();
            let mut session = Session::new();
            session.start(&config, t0());
            session.tick(&config, t0() + Duration::minutes(26));
            assert_eq!(session.awaiting, Awaiting::Break);

            store.save_session(&session).unwrap();
            let loaded = store.load_session(&config);

            // awaiting != none keeps normalization away even at zero
            // remaining.
            assert_eq!(loaded, session);
        }

        #[test]
        fn test_stale_zero_session_normalizes_to_idle() {
            let (dir, store) = temp_store();
            let config = TimerConfig::default();
            fs::write(
                dir.path().join("session.json"),
                r#"{"mode": "break", "awaiting": "none", "running": false, "endsAt": null,
                    "remainingMs": 0, "loopsSinceLongBreak": 2, "isNextBreakLong": false,
                    "nextTask": ""}"#,
            )
            .unwrap();

            let session = store.load_session(&config);

            assert_eq!(session.mode, Mode::Idle);
            assert_eq!(session.remaining_ms, config.work_ms());
            // Unrelated fields survive normalization.
            assert_eq!(session.loops_since_long_break, 2);
        }

        #[test]
        fn test_running_without_deadline_is_demoted() {
            let (dir, store) = temp_store();
            let config = TimerConfig::default();
            fs::write(
                dir.path().join("session.json"),
                r#"{"mode": "work", "awaiting": "none", "running": true, "endsAt": "garbage",
                    "remainingMs": 90000, "loopsSinceLongBreak": 1}"#,
            )
            .unwrap();

            let session = store.load_session(&config);

            assert!(!session.running);
            assert!(session.ends_at.is_none());
            assert_eq!(session.mode, Mode::Work);
            assert_eq!(session.remaining_ms, 90_000);
        }

        #[test]
        fn test_malformed_fields_fall_back_individually() {
            let (dir, store) = temp_store();
            let config = TimerConfig::default();
            fs::write(
                dir.path().join("session.json"),
                r#"{"mode": "nonsense", "awaiting": "break", "running": "yes",
                    "remainingMs": "soon", "loopsSinceLongBreak": -4,
                    "isNextBreakLong": 1, "nextTask": 42}"#,
            )
            .unwrap();

            let session = store.load_session(&config);

            assert_eq!(session.mode, Mode::Idle);
            assert_eq!(session.awaiting, Awaiting::Break);
            assert!(!session.running);
            assert_eq!(session.remaining_ms, 0);
            assert_eq!(session.loops_since_long_break, 0);
            assert!(!session.next_break_long);
            assert!(session.next_task.is_empty());
        }

        #[test]
        fn test_garbage_record_normalizes_to_idle() {
            let (dir, store) = temp_store();
            let config = TimerConfig::default();
            fs::write(dir.path().join("session.json"), "{{{{").unwrap();

            let session = store.load_session(&config);

            assert_eq!(session.mode, Mode::Idle);
            assert_eq!(session.remaining_ms, config.work_ms());
        }
    }

    // ------------------------------------------------------------------------
    // Persist Tests
    // ------------------------------------------------------------------------

    mod persist_tests {
        use super::*;

        #[test]
        fn test_persist_writes_both_records() {
            let (dir, store) = temp_store();
            let config = TimerConfig::default();
            let session = Session::new();

            store.persist(&config, &session);

            assert!(dir.path().join("config.json").exists());
            assert!(dir.path().join("session.json").exists());
        }

        #[test]
        fn test_persist_creates_state_directory() {
            let dir = tempfile::tempdir().unwrap();
            let nested = dir.path().join("deeper").join("state");
            let store = StateStore::with_dir(&nested);

            store.persist(&TimerConfig::default(), &Session::new());

            assert!(nested.join("config.json").exists());
        }

        #[test]
        fn test_persist_overwrites_previous_record() {
            let (_dir, store) = temp_store();
            let config = TimerConfig::default();
            let mut session = Session::new();

            store.persist(&config, &session);
            session.start(&config, t0());
            store.persist(&config, &session);

            let loaded = store.load_session(&config);
            assert!(loaded.running);
            assert_eq!(loaded.mode, Mode::Work);
        }
    }
}
