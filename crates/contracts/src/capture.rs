//! Capture collaborator - decoded frame acquisition
//!
//! Decoding lives outside the pipeline core. The Source Stage only sees this
//! contract: open a stream, read frames until none remain, release.

use crate::{ContractError, FrameBuffer};

/// Properties reported by an opened stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamProperties {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

/// Factory that opens a stream by identifier
pub trait CaptureSource: Send {
    /// Source kind (used for logging)
    fn kind(&self) -> &str;

    /// Open the stream
    ///
    /// # Errors
    /// Returns `ContractError::SourceOpen` naming the path when the input
    /// cannot be opened.
    fn open(&mut self, path: &str) -> Result<Box<dyn CaptureHandle>, ContractError>;
}

/// An opened stream
pub trait CaptureHandle: Send {
    /// Next decoded frame, `Ok(None)` at end of stream
    fn read(&mut self) -> Result<Option<FrameBuffer>, ContractError>;

    /// Position of the most recently read frame (ms)
    fn position_ms(&self) -> u64;

    fn properties(&self) -> StreamProperties;

    /// Release the underlying resource. Must be idempotent.
    fn release(&mut self);
}
