//! # Integration Tests
//!
//! End-to-end tests across the stage crates.
//!
//! Covers:
//! - configuration snapshot
//! - Source -> Detection -> Sink runs over mock captures
//! - sentinel cascade on empty input and open failure
//! - ordering under bounded channels

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{PresenterKind, ProtocolPolicy};

    #[test]
    fn test_full_config_snapshot() {
        let toml = r#"
            [input]
            path = "clips/hallway"
            fps = 30.0

            [pipeline]
            channel_capacity = 8
            protocol = "warn"
            max_buffered = 64

            [redaction]
            min_detection_area = 100
            show_boxes = true
            text_scale = 2

            [output]
            presenter = "file"
            directory = "out"
        "#;
        let blueprint = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();

        assert_eq!(blueprint.input.path, "clips/hallway");
        assert_eq!(blueprint.pipeline.channel_bound(), Some(8));
        assert_eq!(blueprint.pipeline.protocol, ProtocolPolicy::Warn);
        assert_eq!(blueprint.pipeline.max_buffered, Some(64));
        assert_eq!(blueprint.redaction.min_detection_area, 100);
        assert_eq!(blueprint.redaction.pixelate_grid, 4);
        assert_eq!(blueprint.redaction.text_scale, 2);
        assert_eq!(blueprint.detection.diff_threshold, 25);
        assert_eq!(blueprint.output.presenter, PresenterKind::File);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};

    use contracts::{
        stage_channel, DetectedRecord, Envelope, FrameBuffer, FramePresenter, FrameRecord,
        LogLevel, LogRecord, PixelFormat, ProtocolPolicy, StageName,
    };
    use detection::{DetectionReport, DetectionStage, FrameDiffDetector};
    use ingestion::{MockCapture, SourceOutcome, SourceReport, SourceStage};
    use observability::{LogChannel, StageLogger};
    use redaction::{
        FrameRedactor, Presenter, RasterRenderer, RedactionOptions, RedactionSink, SinkReport,
    };

    /// Presenter that remembers what it was given, in order
    #[derive(Clone, Default)]
    struct RecordingPresenter {
        frames: Arc<Mutex<Vec<(u64, FrameBuffer)>>>,
    }

    impl RecordingPresenter {
        fn ids(&self) -> Vec<u64> {
            self.frames.lock().unwrap().iter().map(|(id, _)| *id).collect()
        }
    }

    impl FramePresenter for RecordingPresenter {
        fn name(&self) -> &str {
            "recording"
        }

        async fn present(
            &mut self,
            frame_id: u64,
            frame: FrameBuffer,
        ) -> Result<(), contracts::ContractError> {
            self.frames.lock().unwrap().push((frame_id, frame));
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), contracts::ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), contracts::ContractError> {
            Ok(())
        }
    }

    struct RunOutput {
        source: SourceReport,
        detection: DetectionReport,
        sink: SinkReport,
        logs: Vec<LogRecord>,
    }

    /// 3x3 block of `value` on a black 24x16 RGB canvas
    fn frame_with_block(x0: u32, value: u8) -> FrameBuffer {
        let mut frame = FrameBuffer::filled(24, 16, PixelFormat::Rgb8, 0);
        for y in 6..9 {
            for x in x0..x0 + 3 {
                let offset = ((y * 24 + x) * 3) as usize;
                frame.data[offset..offset + 3].copy_from_slice(&[value; 3]);
            }
        }
        frame
    }

    /// Source -> Detection -> Sink over a mock capture, all three as tasks
    async fn run_pipeline<P>(
        capture: MockCapture,
        capacity: Option<usize>,
        presenter: P,
    ) -> RunOutput
    where
        P: FramePresenter + Send + 'static,
    {
        let (log_channel, mut log_rx) = LogChannel::new(1024);
        let (frame_tx, frame_rx) = stage_channel::<FrameRecord>(capacity);
        let (detected_tx, detected_rx) = stage_channel::<DetectedRecord>(capacity);

        let source = SourceStage::new(
            Box::new(capture),
            "input/clip",
            log_channel.logger(StageName::Source),
        );
        let detection = DetectionStage::new(
            Box::new(FrameDiffDetector::default()),
            log_channel.logger(StageName::Detection),
        )
        .with_policy(ProtocolPolicy::Strict);
        let redactor = FrameRedactor::new(RasterRenderer::default(), RedactionOptions::default());
        let sink = RedactionSink::new(redactor, presenter, log_channel.logger(StageName::Sink))
            .with_policy(ProtocolPolicy::Strict);
        drop(log_channel);

        let source_task = tokio::spawn(source.run(frame_tx));
        let detection_task = tokio::spawn(detection.run(frame_rx, detected_tx));
        let sink_task = tokio::spawn(sink.run(detected_rx));
        let (source, detection, sink) = tokio::join!(source_task, detection_task, sink_task);

        let mut logs = Vec::new();
        while let Some(record) = log_rx.recv().await {
            logs.push(record);
        }

        RunOutput {
            source: source.unwrap().unwrap(),
            detection: detection.unwrap().unwrap(),
            sink: sink.unwrap().unwrap(),
            logs,
        }
    }

    #[tokio::test]
    async fn test_zero_frame_input_only_sentinel() {
        let presenter = RecordingPresenter::default();
        let out = run_pipeline(MockCapture::new(Vec::new(), 25.0), None, presenter.clone()).await;

        assert_eq!(out.source.frames_emitted, 0);
        assert_eq!(out.source.outcome, SourceOutcome::EndOfStream);
        assert_eq!(out.detection.frames_processed, 0);
        assert_eq!(out.sink.frames_rendered, 0);
        assert!(presenter.ids().is_empty());
        assert!(out.logs.iter().all(|r| r.level != LogLevel::Error));
    }

    #[tokio::test]
    async fn test_open_failure_logs_path_once() {
        let presenter = RecordingPresenter::default();
        let out = run_pipeline(MockCapture::failing_open(), None, presenter.clone()).await;

        assert_eq!(out.source.outcome, SourceOutcome::OpenFailed);
        assert_eq!(out.sink.frames_rendered, 0);
        assert!(presenter.ids().is_empty());

        let errors: Vec<_> = out
            .logs
            .iter()
            .filter(|r| r.level == LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].stage, StageName::Source);
        assert!(errors[0].message.contains("input/clip"));
    }

    #[tokio::test]
    async fn test_motion_between_first_two_frames_only() {
        let (frame_tx, frame_rx) = stage_channel::<FrameRecord>(None);
        let (detected_tx, detected_rx) = stage_channel::<DetectedRecord>(None);

        let capture = MockCapture::new(
            vec![
                frame_with_block(2, 255),
                frame_with_block(14, 255),
                frame_with_block(14, 255),
            ],
            25.0,
        );
        let source = SourceStage::new(
            Box::new(capture),
            "input/clip",
            StageLogger::direct(StageName::Source),
        );
        let detection = DetectionStage::new(
            Box::new(FrameDiffDetector::default()),
            StageLogger::direct(StageName::Detection),
        );

        let source_task = tokio::spawn(source.run(frame_tx));
        let detection_task = tokio::spawn(detection.run(frame_rx, detected_tx));

        let mut detected = Vec::new();
        let mut sentinels = 0;
        while let Ok(envelope) = detected_rx.recv().await {
            match envelope {
                Envelope::Record(record) => detected.push(record),
                Envelope::Termination => sentinels += 1,
            }
        }
        source_task.await.unwrap().unwrap();
        detection_task.await.unwrap().unwrap();

        assert_eq!(sentinels, 1);
        assert_eq!(detected.len(), 3);
        assert!(detected[0].contours.is_empty());
        assert!(!detected[1].contours.is_empty());
        assert!(detected[2].contours.is_empty());
        assert_eq!(
            detected.iter().map(|r| r.timestamp_ms).collect::<Vec<_>>(),
            vec![0, 40, 80]
        );
    }

    #[tokio::test]
    async fn test_sink_restores_order_from_two_zero_one() {
        let (tx, rx) = stage_channel::<DetectedRecord>(None);
        for id in [2u64, 0, 1] {
            let record = DetectedRecord {
                frame_id: id,
                timestamp_ms: id * 40,
                frame: FrameBuffer::filled(24, 16, PixelFormat::Rgb8, 0),
                contours: Vec::new(),
            };
            tx.send(record.into()).await.unwrap();
        }
        tx.send(Envelope::termination()).await.unwrap();

        let presenter = RecordingPresenter::default();
        let redactor = FrameRedactor::new(RasterRenderer::default(), RedactionOptions::default());
        let report = RedactionSink::new(
            redactor,
            presenter.clone(),
            StageLogger::direct(StageName::Sink),
        )
        .with_policy(ProtocolPolicy::Strict)
        .run(rx)
        .await
        .unwrap();

        assert_eq!(presenter.ids(), vec![0, 1, 2]);
        assert_eq!(report.max_buffer_depth, 1);
        assert_eq!(report.unrendered_at_shutdown, 0);
    }

    #[tokio::test]
    async fn test_n_frames_rendered_in_order_with_bounded_channels() {
        let frames: Vec<_> = (0..30u32)
            .map(|i| frame_with_block((i * 2) % 20, 200))
            .collect();
        let presenter = RecordingPresenter::default();

        let out = run_pipeline(MockCapture::new(frames, 25.0), Some(2), presenter.clone()).await;

        assert_eq!(out.source.frames_emitted, 30);
        assert_eq!(out.sink.frames_rendered, 30);
        assert_eq!(presenter.ids(), (0..30).collect::<Vec<_>>());
        assert!(out.logs.iter().all(|r| r.level != LogLevel::Error));
    }

    #[tokio::test]
    async fn test_rendered_frames_carry_timestamp_and_redaction() {
        let presenter = RecordingPresenter::default();
        let capture = MockCapture::new(
            vec![frame_with_block(2, 255), frame_with_block(14, 255)],
            25.0,
        );
        let out = run_pipeline(capture, None, presenter.clone()).await;
        // vacated and newly covered area, each 7x7 after dilation
        assert_eq!(out.sink.regions_pixelated, 2);

        let frames = presenter.frames.lock().unwrap();
        let (_, first) = &frames[0];
        // overlay text is white, the input canvas never is at (11, 10)
        assert_eq!(first.pixel(11, 10).unwrap(), &[255, 255, 255]);
    }

    #[tokio::test]
    async fn test_file_presenter_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let output = contracts::OutputConfig {
            presenter: contracts::PresenterKind::File,
            directory: Some(dir.path().to_path_buf()),
        };
        let presenter: Presenter = redaction::create_presenter(&output).unwrap();

        let frames: Vec<_> = (0..4u32).map(|i| frame_with_block(i * 4, 255)).collect();
        let out = run_pipeline(MockCapture::new(frames, 25.0), Some(1), presenter).await;
        assert_eq!(out.sink.frames_rendered, 4);

        for id in 0..4 {
            let path = dir.path().join(format!("frame_{id:06}.png"));
            assert_eq!(image::image_dimensions(&path).unwrap(), (24, 16));
        }
    }
}
