//! Stage log channel
//!
//! Each stage owns a [`StageLogger`] that pushes [`LogRecord`]s onto a bounded
//! channel without ever blocking. One [`LogAggregator`] task drains the channel
//! and writes every record through `tracing`. The aggregator stops once every
//! logger (and the [`LogChannel`] itself) has been dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use contracts::{LogLevel, LogRecord, StageName};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// Owner of the log channel's sending half
#[derive(Debug, Clone)]
pub struct LogChannel {
    tx: mpsc::Sender<LogRecord>,
    dropped: Arc<AtomicU64>,
}

impl LogChannel {
    /// Create a channel holding at most `capacity` pending records.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<LogRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Hand out a logger tagged with `stage`.
    pub fn logger(&self, stage: StageName) -> StageLogger {
        StageLogger {
            stage,
            tx: Some(self.tx.clone()),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Records discarded because the channel was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Non-blocking log handle owned by one stage
#[derive(Debug, Clone)]
pub struct StageLogger {
    stage: StageName,
    tx: Option<mpsc::Sender<LogRecord>>,
    dropped: Arc<AtomicU64>,
}

impl StageLogger {
    /// Logger that writes straight through `tracing` with no channel behind it.
    pub fn direct(stage: StageName) -> Self {
        Self {
            stage,
            tx: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn stage(&self) -> StageName {
        self.stage
    }

    /// Push a record. Returns false if it was dropped.
    ///
    /// Never blocks and never fails the caller.
    pub fn push(&self, level: LogLevel, message: impl Into<String>) -> bool {
        let record = LogRecord::new(level, message, self.stage);
        let Some(tx) = &self.tx else {
            emit(&record);
            return true;
        };

        match tx.try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_log_dropped(self.stage.as_str());
                false
            }
        }
    }

    pub fn debug(&self, message: impl Into<String>) -> bool {
        self.push(LogLevel::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> bool {
        self.push(LogLevel::Info, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> bool {
        self.push(LogLevel::Warn, message)
    }

    pub fn error(&self, message: impl Into<String>) -> bool {
        self.push(LogLevel::Error, message)
    }
}

/// Drains the log channel into `tracing`
pub struct LogAggregator;

impl LogAggregator {
    /// Spawn the aggregator task.
    ///
    /// Resolves to the number of records written once all senders are gone.
    pub fn spawn(mut rx: mpsc::Receiver<LogRecord>) -> JoinHandle<u64> {
        tokio::spawn(async move {
            let mut written = 0u64;
            while let Some(record) = rx.recv().await {
                emit(&record);
                written += 1;
            }
            tracing::debug!(written, "log aggregator finished");
            written
        })
    }
}

/// Local wall-clock time of a record, `HH:MM:SS.mmm`
pub fn format_emitted_at(record: &LogRecord) -> String {
    let at: DateTime<Local> = record.emitted_at.into();
    at.format("%H:%M:%S%.3f").to_string()
}

fn emit(record: &LogRecord) {
    let stage = record.stage.as_str();
    let at = format_emitted_at(record);
    let message = record.message.as_str();
    match record.level {
        LogLevel::Debug => tracing::debug!(stage, emitted_at = %at, "{message}"),
        LogLevel::Info => tracing::info!(stage, emitted_at = %at, "{message}"),
        LogLevel::Warn => tracing::warn!(stage, emitted_at = %at, "{message}"),
        LogLevel::Error => tracing::error!(stage, emitted_at = %at, "{message}"),
    }
}
