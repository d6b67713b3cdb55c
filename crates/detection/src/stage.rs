//! Detection Stage
//!
//! Strict 1:1 transform from `FrameRecord` to `DetectedRecord`. The only state
//! is the previous grayscale frame, kept in [`DetectionContext`].

use contracts::{
    ContractError, DetectedRecord, Envelope, FrameBuffer, FrameRecord, MotionDetector,
    ProtocolPolicy, StageName, StageReceiver, StageSender,
};
use observability::StageLogger;
use tracing::{debug, instrument};

/// Detection Stage summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionReport {
    pub frames_processed: u64,
    pub frames_with_motion: u64,
    pub contours_total: u64,
}

/// Stage-local state carried between frames
#[derive(Debug, Default)]
pub struct DetectionContext {
    prev: Option<FrameBuffer>,
}

impl DetectionContext {
    /// Grayscale the frame, diff it against the previous one and remember it.
    ///
    /// The first frame always yields an empty contour set.
    pub fn process(
        &mut self,
        detector: &dyn MotionDetector,
        record: FrameRecord,
    ) -> Result<DetectedRecord, ContractError> {
        let gray = detector.to_grayscale(&record.frame)?;
        let contours = match &self.prev {
            Some(prev) => detector.motion_contours(&gray, prev)?,
            None => Vec::new(),
        };
        self.prev = Some(gray);
        Ok(DetectedRecord::from_frame(record, contours))
    }

    pub fn has_previous(&self) -> bool {
        self.prev.is_some()
    }
}

/// Middle stage of the pipeline
pub struct DetectionStage {
    detector: Box<dyn MotionDetector>,
    logger: StageLogger,
    policy: ProtocolPolicy,
}

impl DetectionStage {
    pub fn new(detector: Box<dyn MotionDetector>, logger: StageLogger) -> Self {
        Self {
            detector,
            logger,
            policy: ProtocolPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ProtocolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run until the sentinel arrives.
    ///
    /// Every exit path forwards exactly one sentinel downstream.
    #[instrument(name = "detection_stage", skip_all, fields(detector = %self.detector.name()))]
    pub async fn run(
        self,
        rx: StageReceiver<FrameRecord>,
        tx: StageSender<DetectedRecord>,
    ) -> Result<DetectionReport, ContractError> {
        let mut ctx = DetectionContext::default();
        let mut report = DetectionReport::default();

        loop {
            let record = match rx.recv().await {
                Ok(Envelope::Record(record)) => record,
                Ok(Envelope::Termination) => {
                    debug!("termination received");
                    break;
                }
                Err(_) => {
                    forward_termination(&tx).await?;
                    let err = ContractError::protocol(
                        StageName::Detection,
                        "input channel closed without a termination sentinel",
                    );
                    return self.violation(err, report);
                }
            };

            let frame_id = record.frame_id;
            let detected = match ctx.process(self.detector.as_ref(), record) {
                Ok(detected) => detected,
                Err(err) => {
                    self.logger
                        .error(format!("detection failed on frame {frame_id}: {err}"));
                    // Send error means the sink already stopped.
                    let _ = tx.send(Envelope::termination()).await;
                    return Err(err);
                }
            };

            let contours = detected.contours.len();
            report.frames_processed += 1;
            report.contours_total += contours as u64;
            if detected.has_motion() {
                report.frames_with_motion += 1;
            }
            observability::record_frame_detected(contours);
            self.logger
                .debug(format!("processed frame {frame_id} ({contours} contours)"));

            tx.send(Envelope::Record(detected))
                .await
                .map_err(|_| ContractError::ChannelClosed {
                    stage: StageName::Detection,
                })?;
        }

        forward_termination(&tx).await?;
        self.logger.info(format!(
            "detector finished: {} frames, {} with motion",
            report.frames_processed, report.frames_with_motion
        ));

        let stray = drain_stray(&rx);
        if stray > 0 {
            let err = ContractError::protocol(
                StageName::Detection,
                format!("{stray} messages queued after the termination sentinel"),
            );
            return self.violation(err, report);
        }
        Ok(report)
    }

    fn violation(
        &self,
        err: ContractError,
        report: DetectionReport,
    ) -> Result<DetectionReport, ContractError> {
        observability::record_protocol_violation(StageName::Detection.as_str());
        match self.policy {
            ProtocolPolicy::Strict => {
                self.logger.error(err.to_string());
                Err(err)
            }
            ProtocolPolicy::Warn => {
                self.logger.warn(err.to_string());
                Ok(report)
            }
        }
    }
}

/// Messages already queued behind the sentinel. Never waits.
fn drain_stray(rx: &StageReceiver<FrameRecord>) -> usize {
    std::iter::from_fn(|| rx.try_recv().ok()).count()
}

async fn forward_termination(tx: &StageSender<DetectedRecord>) -> Result<(), ContractError> {
    tx.send(Envelope::termination())
        .await
        .map_err(|_| ContractError::ChannelClosed {
            stage: StageName::Detection,
        })
}
