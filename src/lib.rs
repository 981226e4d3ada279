//! Break-Reminder Timer Library
//!
//! This library provides the core functionality for the kyukei CLI.
//! It includes:
//! - Session state machine alternating work and break intervals
//! - Long-break cadence tracking and awaiting-choice gating
//! - Durable persistence with per-field fallback and normalization
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Best-effort desktop notification, sound and attention alerts

pub mod alert;
pub mod cli;
pub mod daemon;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Awaiting, ConfigParams, IpcRequest, IpcResponse, Mode, ResponseData, Session, TimerConfig,
    Transition,
};

// Re-export alert types
pub use alert::{AlertError, Alerter, BeepPlayer, DesktopAlerter, MockAlerter};

// Re-export daemon types
pub use daemon::{NagAlarm, SessionEngine};

// Re-export store types
pub use store::StateStore;
