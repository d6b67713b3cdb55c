//! Pipeline statistics.

use std::time::Duration;

use detection::DetectionReport;
use ingestion::SourceReport;
use redaction::SinkReport;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub source: SourceReport,
    pub detection: DetectionReport,
    pub sink: SinkReport,

    /// Stage log records written by the aggregator
    pub log_records: u64,

    /// Stage log records dropped on a full channel
    pub log_dropped: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Rendered frames per second of wall time
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.sink.frames_rendered as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of processed frames that contained motion, as percentage
    pub fn motion_rate(&self) -> f64 {
        if self.detection.frames_processed > 0 {
            (self.detection.frames_with_motion as f64 / self.detection.frames_processed as f64)
                * 100.0
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   |- Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   |- Source outcome: {:?}", self.source.outcome);
        println!("   |- Frames captured: {}", self.source.frames_emitted);
        println!("   |- Frames rendered: {}", self.sink.frames_rendered);
        println!("   `- FPS: {:.2}", self.fps());

        println!("\nDetection");
        println!(
            "   |- Frames with motion: {} ({:.2}%)",
            self.detection.frames_with_motion,
            self.motion_rate()
        );
        println!("   |- Contours: {}", self.detection.contours_total);
        println!("   `- Regions pixelated: {}", self.sink.regions_pixelated);

        println!("\nReorder Buffer");
        println!("   |- Out-of-order arrivals: {}", self.sink.out_of_order_arrivals);
        println!("   |- Max depth: {}", self.sink.max_buffer_depth);
        println!("   |- Rejected when full: {}", self.sink.rejected_over_limit);
        println!("   `- Unrendered at shutdown: {}", self.sink.unrendered_at_shutdown);

        println!("\nRender time (ms): {}", self.sink.render_ms);

        if self.log_dropped > 0 {
            println!(
                "\nStage log: {} written, {} dropped",
                self.log_records, self.log_dropped
            );
        }

        println!();
    }
}
