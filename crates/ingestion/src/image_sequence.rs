//! Image-sequence capture
//!
//! Treats a directory of PNG/JPEG files as a video stream. Files are played
//! in lexicographic order of their names, so zero-padded numbering
//! (`frame_0001.png`, ...) gives the expected order.

use std::path::{Path, PathBuf};

use contracts::{
    CaptureHandle, CaptureSource, ContractError, FrameBuffer, PixelFormat, StageName,
    StreamProperties,
};
use tracing::{debug, warn};

use crate::frame_position_ms;

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Directory-of-frames capture
#[derive(Debug, Clone)]
pub struct ImageSequenceCapture {
    fps: f64,
}

impl ImageSequenceCapture {
    /// `fps` drives the reported stream position
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }
}

impl CaptureSource for ImageSequenceCapture {
    fn kind(&self) -> &str {
        "image_sequence"
    }

    fn open(&mut self, path: &str) -> Result<Box<dyn CaptureHandle>, ContractError> {
        let files = list_frames(Path::new(path))
            .map_err(|e| ContractError::source_open(path, e.to_string()))?;

        let (width, height) = match files.first() {
            Some(first) => image::image_dimensions(first)
                .map_err(|e| ContractError::source_open(path, e.to_string()))?,
            None => (0, 0),
        };

        debug!(path, frames = files.len(), width, height, "image sequence opened");

        Ok(Box::new(ImageSequenceHandle {
            files,
            next: 0,
            props: StreamProperties {
                fps: self.fps,
                width,
                height,
            },
        }))
    }
}

/// Sorted frame files in `dir`
fn list_frames(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_frame_extension(p))
        .collect();
    files.sort();
    Ok(files)
}

fn has_frame_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|x| ext.eq_ignore_ascii_case(x)))
}

struct ImageSequenceHandle {
    files: Vec<PathBuf>,
    next: usize,
    props: StreamProperties,
}

impl CaptureHandle for ImageSequenceHandle {
    fn read(&mut self) -> Result<Option<FrameBuffer>, ContractError> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };

        let decoded = image::open(path).map_err(|e| {
            ContractError::collaborator(
                StageName::Source,
                format!("failed to decode {}: {e}", path.display()),
            )
        })?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();

        if (width, height) != (self.props.width, self.props.height) {
            warn!(
                file = %path.display(),
                width,
                height,
                "frame size differs from the first frame"
            );
        }

        self.next += 1;
        let frame = FrameBuffer::new(width, height, PixelFormat::Rgb8, rgb.into_raw())
            .ok_or_else(|| {
                ContractError::collaborator(StageName::Source, "decoded buffer size mismatch")
            })?;
        Ok(Some(frame))
    }

    fn position_ms(&self) -> u64 {
        frame_position_ms(self.next.saturating_sub(1) as u64, self.props.fps)
    }

    fn properties(&self) -> StreamProperties {
        self.props
    }

    fn release(&mut self) {
        self.next = self.files.len();
    }
}
