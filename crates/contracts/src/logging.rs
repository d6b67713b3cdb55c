//! Log record types pushed by stages onto the shared log channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Stage identity attached to every log record and error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Source,
    Detection,
    Sink,
    /// The orchestrator that wires the stages together
    Main,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Detection => "detection",
            Self::Sink => "sink",
            Self::Main => "main",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Structured log record
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub stage: StageName,
    /// Wall-clock time the record was pushed (not when it was written)
    pub emitted_at: SystemTime,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>, stage: StageName) -> Self {
        Self {
            level,
            message: message.into(),
            stage,
            emitted_at: SystemTime::now(),
        }
    }
}
