//! Rendering and presentation collaborators used by the Redaction Sink.

use crate::{BoundingRect, ContractError, FrameBuffer};

/// In-place drawing primitives applied to a frame before presentation
pub trait Renderer: Send {
    /// Obscure a region: shrink it, then re-expand with nearest-neighbour
    fn pixelate_region(
        &mut self,
        frame: &mut FrameBuffer,
        rect: BoundingRect,
    ) -> Result<(), ContractError>;

    /// 1-pixel outline of `rect`
    fn draw_rect(&mut self, frame: &mut FrameBuffer, rect: BoundingRect)
        -> Result<(), ContractError>;

    /// Text with its top-left corner at (x, y)
    fn draw_text(
        &mut self,
        frame: &mut FrameBuffer,
        text: &str,
        x: i32,
        y: i32,
    ) -> Result<(), ContractError>;
}

/// Frame output (display window, file writer, ...)
///
/// Receives frames strictly in `frame_id` order, each exactly once.
#[trait_variant::make(FramePresenter: Send)]
pub trait LocalFramePresenter {
    /// Presenter name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Display or persist one rendered frame
    ///
    /// # Errors
    /// Returns present error (should include context)
    async fn present(&mut self, frame_id: u64, frame: FrameBuffer) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close presenter
    async fn close(&mut self) -> Result<(), ContractError>;
}
