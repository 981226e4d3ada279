//! Command definitions for the break-reminder timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI Structure
// ============================================================================

/// Break-reminder timer CLI
#[derive(Parser, Debug)]
#[command(
    name = "kyukei",
    version,
    about = "休憩リマインダータイマーCLI",
    long_about = "作業と休憩を交互に刻むシンプルな休憩リマインダー。\n\
                  区切りの瞬間は通知・サウンド・ベルでお知らせします。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start or resume the countdown
    Start,

    /// Pause the running countdown
    Pause,

    /// Put the full interval for the current mode back on the clock
    Reset,

    /// Show current timer status
    Status,

    /// Confirm the break reminder and start the break
    Break(BreakArgs),

    /// Confirm the end-of-break reminder and get back to work
    Work,

    /// Put the pending break off for a few minutes
    Snooze(SnoozeArgs),

    /// Show or update the timer configuration
    Config(ConfigArgs),

    /// Reinitialize the timer session
    ResetSession,

    /// Run as daemon (background service)
    #[command(hide = true)]
    Daemon,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Break Command Arguments
// ============================================================================

/// Arguments for the break command
#[derive(Args, Debug, Clone, Default)]
pub struct BreakArgs {
    /// Task note to pick up after the break
    #[arg(short, long, value_parser = validate_task_note)]
    pub task: Option<String>,
}

// ============================================================================
// Snooze Command Arguments
// ============================================================================

/// Arguments for the snooze command
#[derive(Args, Debug, Clone)]
pub struct SnoozeArgs {
    /// Snooze length in minutes (1-240)
    #[arg(
        short,
        long,
        default_value = "5",
        value_parser = clap::value_parser!(u32).range(1..=240)
    )]
    pub minutes: u32,
}

impl Default for SnoozeArgs {
    fn default() -> Self {
        Self { minutes: 5 }
    }
}

// ============================================================================
// Config Command Arguments
// ============================================================================

/// Arguments for the config command.
///
/// No value flags means "show". Values are deliberately not
/// range-validated here: the daemon clamps every field into its
/// documented range instead of rejecting it.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Work duration in minutes
    #[arg(short, long)]
    pub work: Option<u32>,

    /// Break duration in minutes
    #[arg(short, long)]
    pub break_time: Option<u32>,

    /// Long break duration in minutes
    #[arg(short, long)]
    pub long_break: Option<u32>,

    /// Work/break loops between long breaks
    #[arg(short = 'e', long)]
    pub long_break_every: Option<u32>,

    /// Restore the default configuration
    #[arg(
        long,
        conflicts_with_all = ["work", "break_time", "long_break", "long_break_every"]
    )]
    pub reset: bool,
}

impl ConfigArgs {
    /// Returns true if any value flag was given.
    pub fn has_updates(&self) -> bool {
        self.work.is_some()
            || self.break_time.is_some()
            || self.long_break.is_some()
            || self.long_break_every.is_some()
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the task note.
///
/// - Must not be empty
/// - Must not exceed 100 characters
fn validate_task_note(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("タスクメモは空にできません".to_string());
    }
    if s.chars().count() > 100 {
        return Err("タスクメモは100文字以内にしてください".to_string());
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================
