//! Per-frame compositing: pixelate motion, optional outlines, timestamp.

use contracts::{ContractError, DetectedRecord, FrameBuffer, RedactionConfig, Renderer};

use crate::timestamp::format_timestamp;

/// Knobs the redactor reads from `[redaction]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedactionOptions {
    /// Contours with a bounding-box area at or below this are ignored
    pub min_detection_area: u64,
    pub show_boxes: bool,
    pub timestamp_x: i32,
    pub timestamp_y: i32,
}

impl Default for RedactionOptions {
    fn default() -> Self {
        Self::from(&RedactionConfig::default())
    }
}

impl From<&RedactionConfig> for RedactionOptions {
    fn from(config: &RedactionConfig) -> Self {
        Self {
            min_detection_area: config.min_detection_area,
            show_boxes: config.show_boxes,
            timestamp_x: config.timestamp_x,
            timestamp_y: config.timestamp_y,
        }
    }
}

/// A frame ready for the presenter
#[derive(Debug, Clone, PartialEq)]
pub struct RedactedFrame {
    pub frame_id: u64,
    pub timestamp_ms: u64,
    pub frame: FrameBuffer,
    pub regions_pixelated: usize,
}

/// Applies a [`Renderer`] to detected records
pub struct FrameRedactor<R> {
    renderer: R,
    options: RedactionOptions,
}

impl<R: Renderer> FrameRedactor<R> {
    pub fn new(renderer: R, options: RedactionOptions) -> Self {
        Self { renderer, options }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Render one record in place.
    ///
    /// The timestamp drawn is the record's own, whichever order it arrived in.
    pub fn redact(&mut self, record: DetectedRecord) -> Result<RedactedFrame, ContractError> {
        let DetectedRecord {
            frame_id,
            timestamp_ms,
            mut frame,
            contours,
        } = record;

        let mut regions_pixelated = 0;
        for contour in &contours {
            let rect = contour.bounding_rect();
            if rect.area() <= self.options.min_detection_area {
                continue;
            }
            self.renderer.pixelate_region(&mut frame, rect)?;
            if self.options.show_boxes {
                self.renderer.draw_rect(&mut frame, rect)?;
            }
            observability::record_region_pixelated(rect.area());
            regions_pixelated += 1;
        }

        self.renderer.draw_text(
            &mut frame,
            &format_timestamp(timestamp_ms),
            self.options.timestamp_x,
            self.options.timestamp_y,
        )?;

        Ok(RedactedFrame {
            frame_id,
            timestamp_ms,
            frame,
            regions_pixelated,
        })
    }
}
