//! Pipeline orchestrator - wires and runs the three stages.
//!
//! Source -> Detection -> Sink, one tokio task each, linked by stage
//! channels. Shutdown needs no supervisor: the sentinel cascade ends every
//! task and the orchestrator only joins them.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{
    stage_channel, ContractError, DetectedRecord, FrameRecord, RedactionBlueprint, StageName,
};
use detection::{DetectionReport, DetectionStage, FrameDiffDetector};
use ingestion::{capture_for, SourceOutcome, SourceReport, SourceStage};
use observability::{LogAggregator, LogChannel};
use redaction::{
    create_presenter, FrameRedactor, RasterRenderer, RedactionOptions, RedactionSink, SinkReport,
};
use tracing::{info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Blueprint with CLI overrides applied
    pub blueprint: RedactionBlueprint,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every stage to completion.
    ///
    /// All three tasks are joined and the log channel drained before any
    /// stage error is returned.
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let bound = blueprint.pipeline.channel_bound();
        let policy = blueprint.pipeline.protocol;
        if bound.is_none() {
            info!("Stage channels are unbounded (no backpressure)");
        }

        let (log_channel, log_rx) = LogChannel::new(blueprint.pipeline.log_capacity);
        let aggregator = LogAggregator::spawn(log_rx);

        let presenter =
            create_presenter(&blueprint.output).context("Failed to create presenter")?;

        let (frame_tx, frame_rx) = stage_channel::<FrameRecord>(bound);
        let (detected_tx, detected_rx) = stage_channel::<DetectedRecord>(bound);

        let source = SourceStage::new(
            capture_for(&blueprint.input),
            &blueprint.input.path,
            log_channel.logger(StageName::Source),
        )
        .with_max_frames(blueprint.input.max_frames);

        let detection = DetectionStage::new(
            Box::new(FrameDiffDetector::new(&blueprint.detection)),
            log_channel.logger(StageName::Detection),
        )
        .with_policy(policy);

        let redactor = FrameRedactor::new(
            RasterRenderer::new(blueprint.redaction.pixelate_grid)
                .with_text_scale(blueprint.redaction.text_scale),
            RedactionOptions::from(&blueprint.redaction),
        );
        let sink = RedactionSink::new(redactor, presenter, log_channel.logger(StageName::Sink))
            .with_policy(policy)
            .with_max_buffered(blueprint.pipeline.max_buffered);

        info!(
            input = %blueprint.input.path,
            channel_capacity = ?bound,
            policy = ?policy,
            "Stages wired, starting tasks"
        );

        let source_task = tokio::spawn(source.run(frame_tx));
        let detection_task = tokio::spawn(detection.run(frame_rx, detected_tx));
        let sink_task = tokio::spawn(sink.run(detected_rx));

        let (source_result, detection_result, sink_result) =
            tokio::join!(source_task, detection_task, sink_task);

        // Every stage logger is gone once its task ends; dropping the
        // channel lets the aggregator finish.
        let log_dropped = log_channel.dropped();
        drop(log_channel);
        let log_records = aggregator.await.context("Log aggregator task failed")?;

        let (source, detection, sink) = settle(
            source_result.context("Source task panicked")?,
            detection_result.context("Detection task panicked")?,
            sink_result.context("Sink task panicked")?,
        )?;

        if source.outcome == SourceOutcome::OpenFailed {
            warn!(input = %blueprint.input.path, "Input could not be opened, no frames processed");
        }

        let stats = PipelineStats {
            source,
            detection,
            sink,
            log_records,
            log_dropped,
            duration: start_time.elapsed(),
        };

        info!(
            frames = stats.sink.frames_rendered,
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Combine the stage results.
///
/// A failing stage closes its channels, so its neighbours report
/// `ChannelClosed`. The error returned is the most downstream one that is
/// not a closed channel, falling back to the most downstream error.
fn settle(
    source: Result<SourceReport, ContractError>,
    detection: Result<DetectionReport, ContractError>,
    sink: Result<SinkReport, ContractError>,
) -> Result<(SourceReport, DetectionReport, SinkReport)> {
    match (source, detection, sink) {
        (Ok(source), Ok(detection), Ok(sink)) => Ok((source, detection, sink)),
        (source, detection, sink) => {
            let failures: Vec<_> = [
                (StageName::Sink, sink.err()),
                (StageName::Detection, detection.err()),
                (StageName::Source, source.err()),
            ]
            .into_iter()
            .filter_map(|(stage, err)| err.map(|err| (stage, err)))
            .collect();

            let primary = failures
                .iter()
                .position(|(_, err)| !err.is_channel_closed())
                .unwrap_or(0);
            let (stage, err) = failures
                .into_iter()
                .nth(primary)
                .context("stage failed without an error")?;
            Err(anyhow::Error::new(err).context(format!("{} stage failed", stage.as_str())))
        }
    }
}
