//! # Contracts
//!
//! Frozen interface contracts shared by every pipeline stage.
//! Business crates depend only on this crate, never on each other.
//!
//! ## Data flow
//! `FrameRecord` (Source) -> `DetectedRecord` (Detection) -> rendered frame (Sink).
//! Every channel carries an [`Envelope`], whose `Termination` variant is the
//! single end-of-stream sentinel.
//!
//! ## Time Model
//! - `timestamp_ms` is the capture-reported stream position in milliseconds
//! - `frame_id` is assigned once by the Source and drives output ordering

mod blueprint;
mod capture;
mod channel;
mod detector;
mod error;
mod frame;
mod geometry;
mod logging;
mod record;
mod render;

pub use blueprint::*;
pub use capture::{CaptureHandle, CaptureSource, StreamProperties};
pub use channel::{stage_channel, StageReceiver, StageSender};
pub use detector::MotionDetector;
pub use error::*;
pub use frame::{FrameBuffer, PixelFormat};
pub use geometry::{BoundingRect, Contour, Point};
pub use logging::{LogLevel, LogRecord, StageName};
pub use record::{DetectedRecord, Envelope, FrameRecord};
pub use render::{FramePresenter, LocalFramePresenter, Renderer};
