//! Frame-difference motion detector
//!
//! `|current - previous|` per pixel, binary threshold, a few 3x3 dilation
//! passes to merge nearby specks, then one polygon per 8-connected blob.
//! Blobs are reported in raster order of their first pixel.

use contracts::{
    Contour, ContractError, DetectionConfig, FrameBuffer, MotionDetector, PixelFormat, StageName,
};

const ON: u8 = 255;

/// Reference [`MotionDetector`]
#[derive(Debug, Clone)]
pub struct FrameDiffDetector {
    threshold: u8,
    dilate_iterations: u32,
}

impl FrameDiffDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            threshold: config.diff_threshold,
            dilate_iterations: config.dilate_iterations,
        }
    }

    /// Binary motion mask: `ON` where the difference exceeds the threshold
    fn threshold_mask(&self, current: &[u8], previous: &[u8]) -> Vec<u8> {
        current
            .iter()
            .zip(previous)
            .map(|(&a, &b)| if a.abs_diff(b) > self.threshold { ON } else { 0 })
            .collect()
    }
}

impl Default for FrameDiffDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl MotionDetector for FrameDiffDetector {
    fn name(&self) -> &str {
        "frame_diff"
    }

    fn to_grayscale(&self, frame: &FrameBuffer) -> Result<FrameBuffer, ContractError> {
        match frame.format {
            PixelFormat::Gray8 => Ok(frame.clone()),
            PixelFormat::Rgb8 => {
                let luma = frame
                    .data
                    .chunks_exact(3)
                    .map(|px| {
                        let (r, g, b) = (px[0] as u32, px[1] as u32, px[2] as u32);
                        ((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8
                    })
                    .collect();
                FrameBuffer::new(frame.width, frame.height, PixelFormat::Gray8, luma).ok_or_else(
                    || ContractError::collaborator(StageName::Detection, "malformed RGB frame"),
                )
            }
        }
    }

    fn motion_contours(
        &self,
        current_gray: &FrameBuffer,
        previous_gray: &FrameBuffer,
    ) -> Result<Vec<Contour>, ContractError> {
        if current_gray.format != PixelFormat::Gray8 || previous_gray.format != PixelFormat::Gray8
        {
            return Err(ContractError::collaborator(
                StageName::Detection,
                "motion_contours expects grayscale frames",
            ));
        }
        if (current_gray.width, current_gray.height) != (previous_gray.width, previous_gray.height)
        {
            return Err(ContractError::collaborator(
                StageName::Detection,
                format!(
                    "frame size changed from {}x{} to {}x{}",
                    previous_gray.width, previous_gray.height, current_gray.width, current_gray.height
                ),
            ));
        }

        let (w, h) = (current_gray.width as usize, current_gray.height as usize);
        let mut mask = self.threshold_mask(&current_gray.data, &previous_gray.data);
        for _ in 0..self.dilate_iterations {
            mask = dilate(&mask, w, h);
        }
        Ok(blob_contours(&mask, w, h))
    }
}

/// One 3x3 dilation pass (a pixel turns on if any neighbour is on)
fn dilate(mask: &[u8], w: usize, h: usize) -> Vec<u8> {
    let mut out = vec![0u8; mask.len()];
    for y in 0..h {
        let (y0, y1) = (y.saturating_sub(1), (y + 1).min(h - 1));
        for x in 0..w {
            let (x0, x1) = (x.saturating_sub(1), (x + 1).min(w - 1));
            let hit = (y0..=y1).any(|ny| (x0..=x1).any(|nx| mask[ny * w + nx] != 0));
            if hit {
                out[y * w + x] = ON;
            }
        }
    }
    out
}

/// Bounding polygons of the 8-connected blobs in `mask`
fn blob_contours(mask: &[u8], w: usize, h: usize) -> Vec<Contour> {
    let mut visited = vec![false; mask.len()];
    let mut contours = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if mask[start] == 0 || visited[start] {
            continue;
        }

        let (mut min_x, mut min_y) = (start % w, start / w);
        let (mut max_x, mut max_y) = (min_x, min_y);
        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    let n = ny * w + nx;
                    if mask[n] != 0 && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        contours.push(Contour::from_box(
            min_x as i32,
            min_y as i32,
            max_x as i32,
            max_y as i32,
        ));
    }

    contours
}
