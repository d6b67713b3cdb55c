//! Mock capture
//!
//! Replays a fixed list of frames. Used by tests that need exact control over
//! frame content, open failures and mid-stream read failures.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{
    CaptureHandle, CaptureSource, ContractError, FrameBuffer, StageName, StreamProperties,
};
use tracing::debug;

use crate::frame_position_ms;

/// Capture that replays in-memory frames
pub struct MockCapture {
    frames: Option<Vec<FrameBuffer>>,
    fps: f64,
    fail_open: bool,
    fail_at: Option<u64>,
    released: Arc<AtomicBool>,
}

impl MockCapture {
    /// Replay `frames`, stamping frame `i` at `i * 1000 / fps` ms
    pub fn new(frames: Vec<FrameBuffer>, fps: f64) -> Self {
        Self {
            frames: Some(frames),
            fps,
            fail_open: false,
            fail_at: None,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Capture whose `open` always fails
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Vec::new(), 25.0)
        }
    }

    /// Fail the read of frame index `index`
    pub fn fail_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Flag set once the opened handle has been released
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl CaptureSource for MockCapture {
    fn kind(&self) -> &str {
        "mock"
    }

    fn open(&mut self, path: &str) -> Result<Box<dyn CaptureHandle>, ContractError> {
        if self.fail_open {
            return Err(ContractError::source_open(path, "mock capture refused to open"));
        }
        let frames = self
            .frames
            .take()
            .ok_or_else(|| ContractError::source_open(path, "mock capture already opened"))?;

        let (width, height) = frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or_default();

        debug!(path, frames = frames.len(), "mock capture opened");

        Ok(Box::new(MockHandle {
            frames: frames.into(),
            props: StreamProperties {
                fps: self.fps,
                width,
                height,
            },
            read: 0,
            fail_at: self.fail_at,
            released: Arc::clone(&self.released),
        }))
    }
}

struct MockHandle {
    frames: VecDeque<FrameBuffer>,
    props: StreamProperties,
    read: u64,
    fail_at: Option<u64>,
    released: Arc<AtomicBool>,
}

impl CaptureHandle for MockHandle {
    fn read(&mut self) -> Result<Option<FrameBuffer>, ContractError> {
        if self.fail_at == Some(self.read) {
            return Err(ContractError::collaborator(
                StageName::Source,
                format!("mock decode failure at frame {}", self.read),
            ));
        }
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.read += 1;
        }
        Ok(frame)
    }

    fn position_ms(&self) -> u64 {
        frame_position_ms(self.read.saturating_sub(1), self.props.fps)
    }

    fn properties(&self) -> StreamProperties {
        self.props
    }

    fn release(&mut self) {
        self.frames.clear();
        self.released.store(true, Ordering::SeqCst);
    }
}
