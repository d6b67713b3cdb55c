//! Synthetic capture
//!
//! Generates a flat background with one bright block sliding left to right.
//! Needs no input files, which makes it the default for demos and soak runs.

use contracts::{
    CaptureHandle, CaptureSource, ContractError, FrameBuffer, PixelFormat, StreamProperties,
    SyntheticInputConfig,
};
use tracing::debug;

use crate::frame_position_ms;

const BACKGROUND: [u8; 3] = [40, 48, 56];
const BLOCK: [u8; 3] = [230, 220, 210];

/// Procedural frame generator
#[derive(Debug, Clone)]
pub struct SyntheticCapture {
    config: SyntheticInputConfig,
    fps: f64,
}

impl SyntheticCapture {
    pub fn new(config: SyntheticInputConfig, fps: f64) -> Self {
        Self { config, fps }
    }
}

impl CaptureSource for SyntheticCapture {
    fn kind(&self) -> &str {
        "synthetic"
    }

    fn open(&mut self, path: &str) -> Result<Box<dyn CaptureHandle>, ContractError> {
        let cfg = &self.config;
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ContractError::source_open(path, "synthetic canvas is empty"));
        }
        if cfg.block_size == 0 || cfg.block_size > cfg.width.min(cfg.height) {
            return Err(ContractError::source_open(
                path,
                format!("block size {} does not fit the canvas", cfg.block_size),
            ));
        }

        debug!(
            width = cfg.width,
            height = cfg.height,
            frames = cfg.frames,
            "synthetic capture opened"
        );

        Ok(Box::new(SyntheticHandle {
            config: cfg.clone(),
            fps: self.fps,
            next: 0,
            released: false,
        }))
    }
}

struct SyntheticHandle {
    config: SyntheticInputConfig,
    fps: f64,
    next: u64,
    released: bool,
}

impl SyntheticHandle {
    /// Left edge of the block in frame `index`, wrapping at the right border
    fn block_x(&self, index: u64) -> u32 {
        let travel = (self.config.width - self.config.block_size + 1) as u64;
        ((index * self.config.step as u64) % travel) as u32
    }

    fn render(&self, index: u64) -> FrameBuffer {
        let SyntheticInputConfig {
            width,
            height,
            block_size,
            ..
        } = self.config;
        let mut frame = FrameBuffer::filled(width, height, PixelFormat::Rgb8, 0);
        let x0 = self.block_x(index);
        let y0 = (height - block_size) / 2;

        for (i, px) in frame.data.chunks_exact_mut(3).enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            let inside = (x0..x0 + block_size).contains(&x) && (y0..y0 + block_size).contains(&y);
            px.copy_from_slice(if inside { &BLOCK } else { &BACKGROUND });
        }
        frame
    }
}

impl CaptureHandle for SyntheticHandle {
    fn read(&mut self) -> Result<Option<FrameBuffer>, ContractError> {
        if self.released || self.next >= self.config.frames {
            return Ok(None);
        }
        let frame = self.render(self.next);
        self.next += 1;
        Ok(Some(frame))
    }

    fn position_ms(&self) -> u64 {
        frame_position_ms(self.next.saturating_sub(1), self.fps)
    }

    fn properties(&self) -> StreamProperties {
        StreamProperties {
            fps: self.fps,
            width: self.config.width,
            height: self.config.height,
        }
    }

    fn release(&mut self) {
        self.released = true;
    }
}
