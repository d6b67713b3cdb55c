//! # Redaction
//!
//! Final stage of the pipeline. Restores `frame_id` order, pixelates motion
//! regions, stamps the stream position and hands each frame to a presenter.
//!
//! ## Components
//! - [`ReorderBuffer`]: ordered map plus sequence cursor
//! - [`FrameRedactor`]: applies a [`contracts::Renderer`] to one record
//! - [`RasterRenderer`]: reference renderer built on `image::imageops`
//! - [`presenters`]: `log`, `file` and `null` outputs
//! - [`RedactionSink`]: the stage loop

mod error;
mod font;
mod raster;
mod render;
mod reorder;
mod sink;
mod timestamp;

pub mod presenters;

pub use error::RedactionError;
pub use presenters::{create_presenter, Presenter};
pub use raster::RasterRenderer;
pub use render::{FrameRedactor, RedactedFrame, RedactionOptions};
pub use reorder::{Admission, ReorderBuffer};
pub use sink::{RedactionSink, SinkReport};
pub use timestamp::format_timestamp;
