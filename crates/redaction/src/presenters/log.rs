//! LogPresenter - one tracing line per rendered frame

use contracts::{ContractError, FrameBuffer, FramePresenter};
use tracing::{info, instrument};

/// Headless stand-in for a display window
pub struct LogPresenter {
    name: String,
    presented: u64,
}

impl LogPresenter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            presented: 0,
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FramePresenter for LogPresenter {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_presenter_present",
        skip(self, frame),
        fields(presenter = %self.name)
    )]
    async fn present(&mut self, frame_id: u64, frame: FrameBuffer) -> Result<(), ContractError> {
        info!(
            presenter = %self.name,
            frame_id,
            width = frame.width,
            height = frame.height,
            "Frame presented"
        );
        self.presented += 1;
        Ok(())
    }

    #[instrument(name = "log_presenter_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_presenter_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(presenter = %self.name, presented = self.presented, "LogPresenter closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PixelFormat;

    #[tokio::test]
    async fn test_log_presenter_counts_frames() {
        let mut presenter = LogPresenter::new("window");
        assert_eq!(presenter.name(), "window");

        for id in 0..3 {
            presenter
                .present(id, FrameBuffer::filled(2, 2, PixelFormat::Rgb8, 0))
                .await
                .unwrap();
        }
        assert_eq!(presenter.presented(), 3);
        assert!(presenter.close().await.is_ok());
    }
}
