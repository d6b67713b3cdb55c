//! FilePresenter - one PNG per rendered frame

use contracts::{ContractError, FrameBuffer, FramePresenter, PixelFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Writes `frame_000123.png` files into a directory
pub struct FilePresenter {
    name: String,
    directory: PathBuf,
    written: u64,
}

impl FilePresenter {
    /// Create the presenter, making the directory if needed
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> std::io::Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        Ok(Self {
            name: name.into(),
            directory,
            written: 0,
        })
    }

    pub fn frame_path(&self, frame_id: u64) -> PathBuf {
        self.directory.join(format!("frame_{frame_id:06}.png"))
    }

    fn save_frame(&self, path: &Path, frame: &FrameBuffer) -> std::io::Result<()> {
        let color = match frame.format {
            PixelFormat::Rgb8 => image::ColorType::Rgb8,
            PixelFormat::Gray8 => image::ColorType::L8,
        };
        image::save_buffer(path, &frame.data, frame.width, frame.height, color)
            .map_err(std::io::Error::other)
    }
}

impl FramePresenter for FilePresenter {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_presenter_present",
        skip(self, frame),
        fields(presenter = %self.name)
    )]
    async fn present(&mut self, frame_id: u64, frame: FrameBuffer) -> Result<(), ContractError> {
        let path = self.frame_path(frame_id);
        self.save_frame(&path, &frame).map_err(|e| {
            error!(presenter = %self.name, frame_id, error = %e, "Write failed");
            ContractError::present(&self.name, format!("{}: {e}", path.display()))
        })?;
        self.written += 1;
        Ok(())
    }

    #[instrument(name = "file_presenter_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "file_presenter_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(presenter = %self.name, written = self.written, "FilePresenter closed");
        Ok(())
    }
}
