//! FrameBuffer - owned pixel payload
//!
//! Ownership moves with the record through every channel send; no stage keeps
//! a reference after handing a record downstream.

use serde::{Deserialize, Serialize};

/// Pixel layout of a [`FrameBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 3 bytes per pixel, R G B
    Rgb8,
    /// 1 byte per pixel, luma
    Gray8,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Gray8 => 1,
        }
    }
}

/// Raw decoded frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Build a frame, returning `None` if `data` does not match the dimensions
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * format.channels();
        (data.len() == expected).then_some(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Frame filled with a single byte value
    pub fn filled(width: u32, height: u32, format: PixelFormat, value: u8) -> Self {
        let len = width as usize * height as usize * format.channels();
        Self {
            width,
            height,
            format,
            data: vec![value; len],
        }
    }

    /// Byte slice of the pixel at (x, y), or `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.format.channels();
        let offset = (y as usize * self.width as usize + x as usize) * channels;
        self.data.get(offset..offset + channels)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
