//! Events emitted by the engine while a run is in progress.

use chrono::{DateTime, Local};
use std::fmt;

/// One message on the engine's event channel.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Log(LogEvent),
    Progress(ProgressEvent),
}

/// A timestamped log line.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogEvent {
    /// Stamp a message with the current local time.
    pub fn now(message: impl Into<String>) -> Self {
        LogEvent {
            timestamp: Local::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Emitted after each successful removal. A removed folder counts as one
/// processed item regardless of its contents, matching how the counting
/// pass counted it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub processed: u64,
    pub total: u64,
    /// `processed / total`, clamped to `[0, 1]`; zero when `total` is zero.
    pub fraction: f64,
}

impl ProgressEvent {
    pub fn new(processed: u64, total: u64) -> Self {
        let fraction = if total == 0 {
            0.0
        } else {
            (processed as f64 / total as f64).clamp(0.0, 1.0)
        };
        ProgressEvent {
            processed,
            total,
            fraction,
        }
    }
}
