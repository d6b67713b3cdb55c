//! # Detection
//!
//! Middle stage of the pipeline: turns each `FrameRecord` into a
//! `DetectedRecord` carrying the motion contours since the previous frame.
//!
//! Ships the reference [`FrameDiffDetector`]; any [`contracts::MotionDetector`]
//! can be plugged in instead.

mod frame_diff;
mod stage;

pub use frame_diff::FrameDiffDetector;
pub use stage::{DetectionContext, DetectionReport, DetectionStage};
