//! Pipeline metrics
//!
//! Thin wrappers over the `metrics` facade so every stage names its series the
//! same way. Without an installed recorder these calls are no-ops.

use metrics::{counter, gauge, histogram};

/// Record a frame emitted by the Source Stage
pub fn record_frame_captured(frame_id: u64) {
    counter!("motion_redact_frames_captured_total").increment(1);
    gauge!("motion_redact_last_captured_frame_id").set(frame_id as f64);
}

/// Record a frame processed by the Detection Stage
pub fn record_frame_detected(contours: usize) {
    counter!("motion_redact_frames_detected_total").increment(1);
    histogram!("motion_redact_contours_per_frame").record(contours as f64);
    if contours > 0 {
        counter!("motion_redact_frames_with_motion_total").increment(1);
    }
}

/// Record a frame rendered by the Sink
///
/// `from_buffer` distinguishes frames released by a drain pass from frames
/// rendered straight off the channel.
pub fn record_frame_rendered(frame_id: u64, from_buffer: bool) {
    let origin = if from_buffer { "buffer" } else { "channel" };
    counter!("motion_redact_frames_rendered_total", "origin" => origin).increment(1);
    gauge!("motion_redact_next_expected_frame_id").set((frame_id + 1) as f64);
}

/// Record a pixelated region
pub fn record_region_pixelated(area: u64) {
    counter!("motion_redact_regions_pixelated_total").increment(1);
    histogram!("motion_redact_region_area_px").record(area as f64);
}

/// Record the reorder buffer depth after a drain pass
pub fn record_reorder_depth(depth: usize) {
    gauge!("motion_redact_reorder_buffer_depth").set(depth as f64);
}

/// Record a protocol violation
pub fn record_protocol_violation(stage: &str) {
    counter!(
        "motion_redact_protocol_violations_total",
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record a log record dropped because the log channel was full
pub fn record_log_dropped(stage: &str) {
    counter!(
        "motion_redact_log_records_dropped_total",
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
