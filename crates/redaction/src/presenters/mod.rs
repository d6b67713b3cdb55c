//! Presenter implementations
//!
//! Contains LogPresenter, FilePresenter, and NullPresenter. [`Presenter`]
//! wraps them so the Sink can be built from config without boxing.

mod file;
mod log;
mod null;

pub use self::file::FilePresenter;
pub use self::log::LogPresenter;
pub use self::null::NullPresenter;

use contracts::{ContractError, FrameBuffer, FramePresenter, OutputConfig, PresenterKind};
use tracing::instrument;

use crate::RedactionError;

/// Config-selected presenter
pub enum Presenter {
    Log(LogPresenter),
    File(FilePresenter),
    Null(NullPresenter),
}

impl FramePresenter for Presenter {
    fn name(&self) -> &str {
        match self {
            Self::Log(p) => p.name(),
            Self::File(p) => p.name(),
            Self::Null(p) => p.name(),
        }
    }

    async fn present(&mut self, frame_id: u64, frame: FrameBuffer) -> Result<(), ContractError> {
        match self {
            Self::Log(p) => p.present(frame_id, frame).await,
            Self::File(p) => p.present(frame_id, frame).await,
            Self::Null(p) => p.present(frame_id, frame).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(p) => p.flush().await,
            Self::File(p) => p.flush().await,
            Self::Null(p) => p.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Log(p) => p.close().await,
            Self::File(p) => p.close().await,
            Self::Null(p) => p.close().await,
        }
    }
}

/// Build the presenter named in `[output]`
#[instrument(name = "create_presenter", skip(config), fields(kind = ?config.presenter))]
pub fn create_presenter(config: &OutputConfig) -> Result<Presenter, RedactionError> {
    match config.presenter {
        PresenterKind::Log => Ok(Presenter::Log(LogPresenter::new("window"))),
        PresenterKind::File => {
            let directory = config.directory.as_ref().ok_or_else(|| {
                RedactionError::presenter_creation("file", "output.directory is required")
            })?;
            let presenter = FilePresenter::new("file", directory)
                .map_err(|e| RedactionError::presenter_creation("file", e.to_string()))?;
            Ok(Presenter::File(presenter))
        }
        PresenterKind::Null => Ok(Presenter::Null(NullPresenter)),
    }
}
