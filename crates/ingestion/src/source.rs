//! Source Stage
//!
//! Opens the capture, stamps every decoded frame with a gap-free `frame_id`
//! and emits exactly one sentinel per run, whatever the outcome.

use contracts::{
    CaptureHandle, CaptureSource, ContractError, Envelope, FrameRecord, StageName, StageSender,
};
use observability::StageLogger;
use tracing::{debug, instrument};

/// How the Source Stage finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    /// The capture reported no more frames
    EndOfStream,
    /// `max_frames` records were emitted
    FrameLimit,
    /// The capture could not be opened; only the sentinel was emitted
    OpenFailed,
}

/// Source Stage summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceReport {
    pub frames_emitted: u64,
    pub outcome: SourceOutcome,
}

/// Producer at the head of the pipeline
pub struct SourceStage {
    capture: Box<dyn CaptureSource>,
    path: String,
    max_frames: Option<u64>,
    logger: StageLogger,
}

impl SourceStage {
    pub fn new(capture: Box<dyn CaptureSource>, path: impl Into<String>, logger: StageLogger) -> Self {
        Self {
            capture,
            path: path.into(),
            max_frames: None,
            logger,
        }
    }

    /// Stop after `limit` records as if the stream had ended
    pub fn with_max_frames(mut self, limit: Option<u64>) -> Self {
        self.max_frames = limit;
        self
    }

    /// Run the stage to completion.
    ///
    /// Open failure is not an error: it yields `SourceOutcome::OpenFailed`
    /// after the sentinel has been sent. A read failure releases the capture,
    /// sends the sentinel and is then returned.
    #[instrument(
        name = "source_stage",
        skip(self, tx),
        fields(path = %self.path, kind = %self.capture.kind())
    )]
    pub async fn run(mut self, tx: StageSender<FrameRecord>) -> Result<SourceReport, ContractError> {
        let mut handle = match self.capture.open(&self.path) {
            Ok(handle) => handle,
            Err(err) => {
                self.logger.error(err.to_string());
                send_termination(&tx).await?;
                return Ok(SourceReport {
                    frames_emitted: 0,
                    outcome: SourceOutcome::OpenFailed,
                });
            }
        };

        let props = handle.properties();
        self.logger.info(format!(
            "opened '{}' ({}x{} @ {:.2} fps)",
            self.path, props.width, props.height, props.fps
        ));

        let mut frames_emitted = 0u64;
        let result = stream(handle.as_mut(), &tx, self.max_frames, &mut frames_emitted).await;
        handle.release();

        // The sentinel goes out on every path so downstream stages never hang.
        let sentinel = send_termination(&tx).await;

        match result {
            Ok(outcome) => {
                sentinel?;
                self.logger.info(format!(
                    "stream finished after {frames_emitted} frames ({outcome:?})"
                ));
                Ok(SourceReport {
                    frames_emitted,
                    outcome,
                })
            }
            Err(err) => {
                self.logger
                    .error(format!("stopped after {frames_emitted} frames: {err}"));
                Err(err)
            }
        }
    }
}

/// Emit records until the capture runs dry or the frame limit is hit
async fn stream(
    handle: &mut dyn CaptureHandle,
    tx: &StageSender<FrameRecord>,
    max_frames: Option<u64>,
    frames_emitted: &mut u64,
) -> Result<SourceOutcome, ContractError> {
    loop {
        if max_frames.is_some_and(|limit| *frames_emitted >= limit) {
            return Ok(SourceOutcome::FrameLimit);
        }

        let Some(frame) = handle.read()? else {
            return Ok(SourceOutcome::EndOfStream);
        };

        let record = FrameRecord {
            frame_id: *frames_emitted,
            timestamp_ms: handle.position_ms(),
            frame,
        };
        let frame_id = record.frame_id;

        tx.send(Envelope::Record(record))
            .await
            .map_err(|_| ContractError::ChannelClosed {
                stage: StageName::Source,
            })?;

        observability::record_frame_captured(frame_id);
        debug!(frame_id, "frame emitted");
        *frames_emitted += 1;
    }
}

async fn send_termination(tx: &StageSender<FrameRecord>) -> Result<(), ContractError> {
    tx.send(Envelope::termination())
        .await
        .map_err(|_| ContractError::ChannelClosed {
            stage: StageName::Source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCapture;
    use contracts::{stage_channel, FrameBuffer, LogLevel, PixelFormat, StageReceiver};
    use observability::LogChannel;

    async fn collect(rx: StageReceiver<FrameRecord>) -> (Vec<FrameRecord>, usize) {
        let mut records = Vec::new();
        let mut sentinels = 0;
        while let Ok(envelope) = rx.recv().await {
            match envelope {
                Envelope::Record(record) => records.push(record),
                Envelope::Termination => sentinels += 1,
            }
        }
        (records, sentinels)
    }

    fn frames(n: usize) -> Vec<FrameBuffer> {
        (0..n)
            .map(|i| FrameBuffer::filled(4, 4, PixelFormat::Rgb8, i as u8))
            .collect()
    }

    #[tokio::test]
    async fn test_ids_are_gap_free_and_single_sentinel() {
        let (tx, rx) = stage_channel(None);
        let stage = SourceStage::new(
            Box::new(MockCapture::new(frames(5), 10.0)),
            "mock",
            StageLogger::direct(StageName::Source),
        );

        let report = stage.run(tx).await.unwrap();
        assert_eq!(report.frames_emitted, 5);
        assert_eq!(report.outcome, SourceOutcome::EndOfStream);

        let (records, sentinels) = collect(rx).await;
        assert_eq!(sentinels, 1);
        let ids: Vec<u64> = records.iter().map(|r| r.frame_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        let stamps: Vec<u64> = records.iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(stamps, vec![0, 100, 200, 300, 400]);
    }

    #[tokio::test]
    async fn test_zero_frames_emits_only_sentinel() {
        let (tx, rx) = stage_channel(None);
        let stage = SourceStage::new(
            Box::new(MockCapture::new(Vec::new(), 25.0)),
            "empty",
            StageLogger::direct(StageName::Source),
        );

        let report = stage.run(tx).await.unwrap();
        assert_eq!(report.frames_emitted, 0);

        let (records, sentinels) = collect(rx).await;
        assert!(records.is_empty());
        assert_eq!(sentinels, 1);
    }

    #[tokio::test]
    async fn test_open_failure_logs_path_once() {
        let (log, mut log_rx) = LogChannel::new(16);
        let (tx, rx) = stage_channel(None);
        let stage = SourceStage::new(
            Box::new(MockCapture::failing_open()),
            "data/missing.mp4",
            log.logger(StageName::Source),
        );

        let report = stage.run(tx).await.unwrap();
        assert_eq!(report.outcome, SourceOutcome::OpenFailed);
        drop(log);

        let (records, sentinels) = collect(rx).await;
        assert!(records.is_empty());
        assert_eq!(sentinels, 1);

        let mut errors = Vec::new();
        while let Some(record) = log_rx.recv().await {
            if record.level == LogLevel::Error {
                errors.push(record.message);
            }
        }
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("data/missing.mp4"));
    }

    #[tokio::test]
    async fn test_read_failure_still_sends_sentinel() {
        let capture = MockCapture::new(frames(4), 10.0).fail_at(2);
        let released = capture.released_flag();
        let (tx, rx) = stage_channel(None);
        let stage = SourceStage::new(
            Box::new(capture),
            "mock",
            StageLogger::direct(StageName::Source),
        );

        let err = stage.run(tx).await.unwrap_err();
        assert!(matches!(err, ContractError::Collaborator { .. }));
        assert!(released.load(std::sync::atomic::Ordering::SeqCst));

        let (records, sentinels) = collect(rx).await;
        assert_eq!(records.len(), 2);
        assert_eq!(sentinels, 1);
    }

    #[tokio::test]
    async fn test_max_frames_stops_early() {
        let (tx, rx) = stage_channel(Some(2));
        let stage = SourceStage::new(
            Box::new(MockCapture::new(frames(10), 10.0)),
            "mock",
            StageLogger::direct(StageName::Source),
        )
        .with_max_frames(Some(3));

        let consumer = tokio::spawn(collect(rx));
        let report = stage.run(tx).await.unwrap();
        assert_eq!(report.outcome, SourceOutcome::FrameLimit);
        assert_eq!(report.frames_emitted, 3);

        let (records, sentinels) = consumer.await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(sentinels, 1);
    }

    #[tokio::test]
    async fn test_closed_downstream_is_reported() {
        let (tx, rx) = stage_channel(None);
        drop(rx);
        let stage = SourceStage::new(
            Box::new(MockCapture::new(frames(2), 10.0)),
            "mock",
            StageLogger::direct(StageName::Source),
        );

        let err = stage.run(tx).await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::ChannelClosed {
                stage: StageName::Source
            }
        ));
    }
}
