//! RedactionBlueprint - Config Loader output
//!
//! Describes a complete run: input stream, channel wiring, detection tuning,
//! redaction options and the output presenter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactionBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Input stream
    #[serde(default)]
    pub input: InputConfig,

    /// Channel and protocol settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Motion detection tuning
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Redaction and overlay options
    #[serde(default)]
    pub redaction: RedactionConfig,

    /// Presenter selection
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Stream identifier (directory of frames for `image_sequence`)
    #[serde(default = "default_input_path")]
    pub path: String,

    /// Capture backend
    #[serde(default)]
    pub kind: InputKind,

    /// Frame rate used to derive timestamps when the stream has none
    #[serde(default = "default_fps")]
    pub fps: f64,

    /// Stop after this many frames (None = whole stream)
    #[serde(default)]
    pub max_frames: Option<u64>,

    /// Synthetic capture parameters
    #[serde(default)]
    pub synthetic: SyntheticInputConfig,
}

/// Default stream identifier when none is given
pub const DEFAULT_INPUT_PATH: &str = "data/example";

fn default_input_path() -> String {
    DEFAULT_INPUT_PATH.to_string()
}

fn default_fps() -> f64 {
    25.0
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            kind: InputKind::default(),
            fps: default_fps(),
            max_frames: None,
            synthetic: SyntheticInputConfig::default(),
        }
    }
}

/// Capture backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Directory of numbered PNG/JPEG frames
    #[default]
    ImageSequence,
    /// Procedurally generated frames with a moving block
    Synthetic,
}

/// Synthetic capture parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticInputConfig {
    pub width: u32,
    pub height: u32,
    /// Number of frames before end of stream
    pub frames: u64,
    /// Side of the moving block (px)
    pub block_size: u32,
    /// Horizontal block displacement per frame (px)
    pub step: u32,
}

impl Default for SyntheticInputConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            frames: 100,
            block_size: 24,
            step: 4,
        }
    }
}

/// Channel and protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Inter-stage channel bound (0 = unbounded, no backpressure)
    #[serde(default)]
    pub channel_capacity: usize,

    /// How protocol violations are surfaced
    #[serde(default)]
    pub protocol: ProtocolPolicy,

    /// Reorder buffer bound (None = unbounded)
    #[serde(default)]
    pub max_buffered: Option<usize>,

    /// Stage log channel bound; records beyond it are dropped
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_log_capacity() -> usize {
    1024
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 0,
            protocol: ProtocolPolicy::default(),
            max_buffered: None,
            log_capacity: default_log_capacity(),
        }
    }
}

impl PipelineSettings {
    /// Channel capacity as understood by `stage_channel`
    pub fn channel_bound(&self) -> Option<usize> {
        (self.channel_capacity > 0).then_some(self.channel_capacity)
    }
}

/// Handling of stage wiring defects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolPolicy {
    /// Fail the stage with `ContractError::ProtocolViolation`
    Strict,
    /// Log a warning and carry on
    Warn,
}

impl Default for ProtocolPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Strict
        } else {
            Self::Warn
        }
    }
}

/// Motion detection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Per-pixel absolute difference above which a pixel counts as moving
    #[serde(default = "default_diff_threshold")]
    pub diff_threshold: u8,

    /// 3x3 dilation passes applied to the threshold mask
    #[serde(default = "default_dilate_iterations")]
    pub dilate_iterations: u32,
}

fn default_diff_threshold() -> u8 {
    25
}

fn default_dilate_iterations() -> u32 {
    2
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            diff_threshold: default_diff_threshold(),
            dilate_iterations: default_dilate_iterations(),
        }
    }
}

/// Redaction and overlay options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Regions with area at or below this are left untouched
    #[serde(default = "default_min_detection_area")]
    pub min_detection_area: u64,

    /// Outline every contour's bounding rectangle
    #[serde(default)]
    pub show_boxes: bool,

    /// Side of the grid a region is shrunk to before re-expansion
    #[serde(default = "default_pixelate_grid")]
    pub pixelate_grid: u32,

    /// Pixel size of one glyph dot in the timestamp overlay
    #[serde(default = "default_text_scale")]
    pub text_scale: u32,

    /// Top-left corner of the timestamp overlay
    #[serde(default = "default_timestamp_x")]
    pub timestamp_x: i32,

    #[serde(default = "default_timestamp_y")]
    pub timestamp_y: i32,
}

fn default_min_detection_area() -> u64 {
    25
}

fn default_pixelate_grid() -> u32 {
    4
}

fn default_text_scale() -> u32 {
    1
}

fn default_timestamp_x() -> i32 {
    10
}

fn default_timestamp_y() -> i32 {
    10
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            min_detection_area: default_min_detection_area(),
            show_boxes: false,
            pixelate_grid: default_pixelate_grid(),
            text_scale: default_text_scale(),
            timestamp_x: default_timestamp_x(),
            timestamp_y: default_timestamp_y(),
        }
    }
}

/// Presenter selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub presenter: PresenterKind,

    /// Target directory (required by `file`)
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Presenter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenterKind {
    /// One structured log line per frame
    #[default]
    Log,
    /// One PNG per frame
    File,
    /// Discard frames
    Null,
}
