//! Records carried on the inter-stage channels.

use serde::{Deserialize, Serialize};

use crate::{Contour, FrameBuffer};

/// Message on every inter-stage channel.
///
/// `Termination` is the end-of-stream sentinel: exactly one flows per
/// producer -> consumer edge per run, and a stage that receives it forwards
/// exactly one to its own downstream before exiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Envelope<T> {
    /// A real unit of work
    Record(T),
    /// End-of-stream sentinel (carries no payload)
    Termination,
}

impl<T> Envelope<T> {
    /// The only way stages construct a sentinel
    pub const fn termination() -> Self {
        Self::Termination
    }
}

impl<T> From<T> for Envelope<T> {
    fn from(record: T) -> Self {
        Self::Record(record)
    }
}

/// Source Stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Strictly increasing from 0, assigned once by the Source
    pub frame_id: u64,
    /// Capture-reported stream position (ms)
    pub timestamp_ms: u64,
    /// Owned pixel payload
    pub frame: FrameBuffer,
}

/// Detection Stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRecord {
    pub frame_id: u64,
    pub timestamp_ms: u64,
    pub frame: FrameBuffer,
    /// Regions of motion since the previous frame; empty is valid
    pub contours: Vec<Contour>,
}

impl DetectedRecord {
    /// Attach a contour set, consuming the source record
    pub fn from_frame(record: FrameRecord, contours: Vec<Contour>) -> Self {
        Self {
            frame_id: record.frame_id,
            timestamp_ms: record.timestamp_ms,
            frame: record.frame,
            contours,
        }
    }

    pub fn has_motion(&self) -> bool {
        !self.contours.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PixelFormat;

    #[test]
    fn test_termination_factory() {
        let sentinel: Envelope<FrameRecord> = Envelope::termination();
        assert!(matches!(sentinel, Envelope::Termination));
    }

    #[test]
    fn test_detected_record_keeps_identity() {
        let record = FrameRecord {
            frame_id: 7,
            timestamp_ms: 280,
            frame: FrameBuffer::filled(2, 2, PixelFormat::Rgb8, 9),
        };
        let detected = DetectedRecord::from_frame(record, vec![Contour::from_box(0, 0, 1, 1)]);

        assert_eq!(detected.frame_id, 7);
        assert_eq!(detected.timestamp_ms, 280);
        assert!(detected.has_motion());
    }

    #[test]
    fn test_envelope_serializes_sentinel_as_tag() {
        let sentinel: Envelope<u64> = Envelope::termination();
        let json = serde_json::to_string(&sentinel).unwrap();
        assert_eq!(json, "\"Termination\"");

        let back: Envelope<u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Envelope::Termination);
    }
}
