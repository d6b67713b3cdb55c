//! # Ingestion
//!
//! Head of the pipeline.
//!
//! Responsibilities:
//! - Open the configured capture (image sequence, synthetic or mock)
//! - Assign gap-free frame ids starting at 0
//! - Emit `FrameRecord`s downstream, then exactly one sentinel
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{stage_channel, StageName};
//! use ingestion::{capture_for, SourceStage};
//!
//! let (tx, rx) = stage_channel(blueprint.pipeline.channel_bound());
//! let stage = SourceStage::new(capture_for(&blueprint.input), &blueprint.input.path, logger)
//!     .with_max_frames(blueprint.input.max_frames);
//! let report = tokio::spawn(stage.run(tx)).await??;
//! ```

mod image_sequence;
mod mock;
mod source;
mod synthetic;

pub use image_sequence::ImageSequenceCapture;
pub use mock::MockCapture;
pub use source::{SourceOutcome, SourceReport, SourceStage};
pub use synthetic::SyntheticCapture;

use contracts::{CaptureSource, InputConfig, InputKind};

/// Build the capture selected by the input configuration
pub fn capture_for(input: &InputConfig) -> Box<dyn CaptureSource> {
    match input.kind {
        InputKind::ImageSequence => Box::new(ImageSequenceCapture::new(input.fps)),
        InputKind::Synthetic => Box::new(SyntheticCapture::new(input.synthetic.clone(), input.fps)),
    }
}

/// Timestamp of frame `index` at a constant frame rate
pub(crate) fn frame_position_ms(index: u64, fps: f64) -> u64 {
    if fps <= 0.0 {
        return 0;
    }
    (index as f64 * 1000.0 / fps).round() as u64
}
