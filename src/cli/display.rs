//! Display utilities for the break-reminder timer CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display
//! - Configuration display

use crate::types::{IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows a success message for a countdown-starting action (start,
    /// break, work, snooze, reset-session).
    pub fn show_action_success(response: &IpcResponse) {
        println!("* {}", response.message);

        if let Some(data) = &response.data {
            if let Some(remaining) = data.remaining_ms {
                let (minutes, seconds) = Self::format_time(remaining);
                println!("  残り時間: {}:{:02}", minutes, seconds);
            }
            if let Some(task) = &data.next_task {
                println!("  タスク: {}", task);
            }
        }
    }

    /// Shows a success message for timer pause.
    pub fn show_pause_success(response: &IpcResponse) {
        println!("|| {}", response.message);

        if let Some(data) = &response.data {
            if let Some(remaining) = data.remaining_ms {
                let (minutes, seconds) = Self::format_time(remaining);
                println!("  残り時間: {}:{:02}", minutes, seconds);
            }
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("休憩リマインダー ステータス");
        println!("─────────────────────────────");

        let Some(data) = &response.data else {
            println!("タイマーは起動していません");
            return;
        };

        println!("状態: {}", Self::state_label(data));

        if let Some(remaining) = data.remaining_ms {
            let (minutes, seconds) = Self::format_time(remaining);
            println!("残り時間: {}:{:02}", minutes, seconds);
        }
        if let Some(loops) = data.loops_since_long_break {
            println!("長い休憩までのループ: {}", loops);
        }
        if data.next_break_long == Some(true) {
            println!("次の休憩: 長い休憩");
        }
        if let Some(task) = &data.next_task {
            println!("タスク: {}", task);
        }
        if let Some(config) = &data.config {
            println!(
                "設定: 作業{}分 / 休憩{}分 / 長い休憩{}分 (毎{}ループ)",
                config.work_minutes,
                config.break_minutes,
                config.long_break_minutes,
                config.long_break_every
            );
        }
    }

    /// Shows the configuration.
    pub fn show_config(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("* {}", response.message);
        }

        let Some(config) = response.data.as_ref().and_then(|d| d.config.as_ref()) else {
            return;
        };
        println!("作業時間: {}分", config.work_minutes);
        println!("休憩時間: {}分", config.break_minutes);
        println!("長い休憩: {}分", config.long_break_minutes);
        println!("長い休憩の間隔: {}ループ", config.long_break_every);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Maps the mode/awaiting/running combination onto a display label.
    fn state_label(data: &ResponseData) -> &'static str {
        let awaiting = data.awaiting.as_deref().unwrap_or("none");
        let running = data.running.unwrap_or(false);
        let mode = data.mode.as_deref().unwrap_or("idle");

        match (awaiting, running, mode) {
            ("break", _, _) => "休憩開始の確認待ち",
            ("work", _, _) => "作業再開の確認待ち",
            (_, true, "break") => "休憩中",
            (_, true, _) => "作業中",
            (_, false, "idle") => "待機中",
            (_, false, _) => "一時停止中",
        }
    }

    /// Formats remaining milliseconds as (minutes, seconds), floor to
    /// whole seconds.
    fn format_time(remaining_ms: i64) -> (i64, i64) {
        let total_seconds = remaining_ms.max(0) / 1000;
        (total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
