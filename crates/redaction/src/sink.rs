//! Reorder & Redaction Sink
//!
//! Last stage of the pipeline. Records may reach it out of `frame_id` order;
//! the sink parks early arrivals in a [`ReorderBuffer`] and renders strictly
//! in sequence, draining greedily after each arrival.
//!
//! The presenter is always flushed and closed once, on the error path too.

use contracts::{
    ContractError, DetectedRecord, Envelope, FramePresenter, ProtocolPolicy, Renderer, StageName,
    StageReceiver,
};
use observability::{RunningStats, StageLogger, StatsSummary};
use std::time::Instant;
use tracing::{debug, instrument};

use crate::render::FrameRedactor;
use crate::reorder::{Admission, ReorderBuffer};

/// Redaction Sink summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkReport {
    pub frames_rendered: u64,
    pub regions_pixelated: u64,
    /// Largest reorder buffer depth seen during the run
    pub max_buffer_depth: usize,
    /// Records that had to wait in the buffer
    pub out_of_order_arrivals: u64,
    /// Records still parked when the sentinel arrived (never rendered)
    pub unrendered_at_shutdown: usize,
    /// Records refused because the reorder buffer was full (never rendered)
    pub rejected_over_limit: u64,
    /// Wall time per frame from redaction start to presenter return
    pub render_ms: StatsSummary,
}

pub struct RedactionSink<R, P> {
    redactor: FrameRedactor<R>,
    presenter: P,
    logger: StageLogger,
    policy: ProtocolPolicy,
    max_buffered: Option<usize>,
    render_ms: RunningStats,
}

impl<R, P> RedactionSink<R, P>
where
    R: Renderer,
    P: FramePresenter + Send,
{
    pub fn new(redactor: FrameRedactor<R>, presenter: P, logger: StageLogger) -> Self {
        Self {
            redactor,
            presenter,
            logger,
            policy: ProtocolPolicy::default(),
            max_buffered: None,
            render_ms: RunningStats::default(),
        }
    }

    pub fn with_policy(mut self, policy: ProtocolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Upper bound on parked records.
    ///
    /// A record that would grow the buffer past it is never parked: Strict
    /// fails the run, Warn discards the record and counts it.
    pub fn with_max_buffered(mut self, max_buffered: Option<usize>) -> Self {
        self.max_buffered = max_buffered;
        self
    }

    /// Run until the sentinel arrives, then shut the presenter down.
    ///
    /// Returns the first error hit; presenter shutdown errors only surface
    /// when the run itself succeeded.
    #[instrument(name = "redaction_sink", skip_all, fields(presenter = %self.presenter.name()))]
    pub async fn run(
        mut self,
        rx: StageReceiver<DetectedRecord>,
    ) -> Result<SinkReport, ContractError> {
        let mut buffer = ReorderBuffer::new();
        let mut report = SinkReport::default();

        let mut outcome = self.consume(&rx, &mut buffer, &mut report).await;
        if outcome.is_ok() {
            outcome = self.finish(&rx, &mut buffer, &mut report);
        }
        let shutdown = self.shutdown_presenter().await;
        report.render_ms = self.render_ms.summary();

        outcome?;
        shutdown?;
        self.logger.info(format!(
            "sink finished: {} frames rendered, {} regions pixelated",
            report.frames_rendered, report.regions_pixelated
        ));
        Ok(report)
    }

    async fn consume(
        &mut self,
        rx: &StageReceiver<DetectedRecord>,
        buffer: &mut ReorderBuffer<DetectedRecord>,
        report: &mut SinkReport,
    ) -> Result<(), ContractError> {
        loop {
            let record = match rx.recv().await {
                Ok(Envelope::Record(record)) => record,
                Ok(Envelope::Termination) => {
                    debug!("termination received");
                    return Ok(());
                }
                Err(_) => {
                    return self.violation(ContractError::protocol(
                        StageName::Sink,
                        "input channel closed without a termination sentinel",
                    ));
                }
            };

            let frame_id = record.frame_id;
            if let Some(limit) = self.max_buffered {
                if buffer.would_park(frame_id) && buffer.len() >= limit {
                    report.rejected_over_limit += 1;
                    self.violation(ContractError::protocol(
                        StageName::Sink,
                        format!(
                            "reorder buffer is full ({limit} records), frame {frame_id} rejected"
                        ),
                    ))?;
                    continue;
                }
            }

            match buffer.admit(frame_id, record) {
                Admission::Ready(record) => self.render(record, false, report).await?,
                Admission::Buffered => {
                    let depth = buffer.len();
                    report.out_of_order_arrivals += 1;
                    report.max_buffer_depth = report.max_buffer_depth.max(depth);
                    self.logger.debug(format!(
                        "buffered frame {frame_id}, waiting for {}",
                        buffer.next_expected_id()
                    ));
                }
                Admission::Stale(_) => self.violation(ContractError::protocol(
                    StageName::Sink,
                    format!(
                        "frame {frame_id} arrived after the cursor passed it (next {})",
                        buffer.next_expected_id()
                    ),
                ))?,
                Admission::Duplicate(_) => self.violation(ContractError::protocol(
                    StageName::Sink,
                    format!("frame {frame_id} is already buffered"),
                ))?,
            }

            while let Some(record) = buffer.pop_ready() {
                self.render(record, true, report).await?;
            }
            observability::record_reorder_depth(buffer.len());
        }
    }

    async fn render(
        &mut self,
        record: DetectedRecord,
        from_buffer: bool,
        report: &mut SinkReport,
    ) -> Result<(), ContractError> {
        let frame_id = record.frame_id;
        let started = Instant::now();
        let redacted = self.redactor.redact(record).inspect_err(|err| {
            self.logger
                .error(format!("rendering failed on frame {frame_id}: {err}"));
        })?;

        if let Err(err) = self.presenter.present(frame_id, redacted.frame).await {
            self.logger
                .error(format!("presenting frame {frame_id} failed: {err}"));
            return Err(err);
        }

        self.render_ms.push(started.elapsed().as_secs_f64() * 1000.0);
        report.frames_rendered += 1;
        report.regions_pixelated += redacted.regions_pixelated as u64;
        observability::record_frame_rendered(frame_id, from_buffer);
        if from_buffer {
            self.logger.debug(format!("wrote frame {frame_id} from buffer"));
        } else {
            self.logger.debug(format!("displayed frame {frame_id}"));
        }
        Ok(())
    }

    /// Post-sentinel checks: leftovers in the buffer, messages behind the sentinel
    fn finish(
        &mut self,
        rx: &StageReceiver<DetectedRecord>,
        buffer: &mut ReorderBuffer<DetectedRecord>,
        report: &mut SinkReport,
    ) -> Result<(), ContractError> {
        let leftovers = buffer.clear();
        report.unrendered_at_shutdown = leftovers.len();
        let leftover_check = if leftovers.is_empty() {
            Ok(())
        } else {
            self.violation(ContractError::protocol(
                StageName::Sink,
                format!(
                    "{} frames never rendered, still waiting for {}: {leftovers:?}",
                    leftovers.len(),
                    buffer.next_expected_id()
                ),
            ))
        };

        let stray = std::iter::from_fn(|| rx.try_recv().ok()).count();
        let stray_check = if stray == 0 {
            Ok(())
        } else {
            self.violation(ContractError::protocol(
                StageName::Sink,
                format!("{stray} messages queued after the termination sentinel"),
            ))
        };

        leftover_check.and(stray_check)
    }

    async fn shutdown_presenter(&mut self) -> Result<(), ContractError> {
        let flushed = self.presenter.flush().await;
        let closed = self.presenter.close().await;
        flushed.and(closed).inspect_err(|err| {
            self.logger.error(format!("presenter shutdown failed: {err}"));
        })
    }

    fn violation(&self, err: ContractError) -> Result<(), ContractError> {
        observability::record_protocol_violation(StageName::Sink.as_str());
        match self.policy {
            ProtocolPolicy::Strict => {
                self.logger.error(err.to_string());
                Err(err)
            }
            ProtocolPolicy::Warn => {
                self.logger.warn(err.to_string());
                Ok(())
            }
        }
    }
}
