//! Detection collaborator - motion math

use crate::{Contour, ContractError, FrameBuffer};

/// Motion detection math used by the Detection Stage.
///
/// Implementations must be deterministic: the same `(current, previous)` pair
/// always yields the same contour sequence.
pub trait MotionDetector: Send {
    /// Detector name (used for logging)
    fn name(&self) -> &str;

    /// Convert a decoded frame to its grayscale form
    fn to_grayscale(&self, frame: &FrameBuffer) -> Result<FrameBuffer, ContractError>;

    /// Regions of change between two grayscale frames, as simplified polygons
    fn motion_contours(
        &self,
        current_gray: &FrameBuffer,
        previous_gray: &FrameBuffer,
    ) -> Result<Vec<Contour>, ContractError>;
}
