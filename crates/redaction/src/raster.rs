//! Raster renderer
//!
//! Pixelation goes through `image::imageops`: the region is shrunk to a small
//! grid with a bilinear filter and blown back up with nearest-neighbour.
//! Outlines and text are plotted straight into the frame bytes.

use contracts::{BoundingRect, ContractError, FrameBuffer, PixelFormat, Renderer, StageName};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Pixel, Rgb};

use crate::font;

/// Reference [`Renderer`]
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    grid: u32,
    box_color: [u8; 3],
    text_color: [u8; 3],
    text_scale: u32,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new(4)
    }
}

impl RasterRenderer {
    /// `grid` is the mosaic resolution (cells per side) of a pixelated region
    pub fn new(grid: u32) -> Self {
        Self {
            grid: grid.max(1),
            box_color: [0, 255, 0],
            text_color: [255, 255, 255],
            text_scale: 1,
        }
    }

    /// Each glyph dot becomes a `scale` x `scale` square
    pub fn with_text_scale(mut self, scale: u32) -> Self {
        self.text_scale = scale.max(1);
        self
    }

    fn plot(frame: &mut FrameBuffer, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= frame.width as i64 || y >= frame.height as i64 {
            return;
        }
        let channels = frame.format.channels();
        let offset = (y as usize * frame.width as usize + x as usize) * channels;
        match frame.format {
            PixelFormat::Rgb8 => frame.data[offset..offset + 3].copy_from_slice(&color),
            PixelFormat::Gray8 => {
                let [r, g, b] = color.map(u32::from);
                frame.data[offset] = ((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8;
            }
        }
    }
}

impl Renderer for RasterRenderer {
    fn pixelate_region(
        &mut self,
        frame: &mut FrameBuffer,
        rect: BoundingRect,
    ) -> Result<(), ContractError> {
        let Some(rect) = rect.clamp_to(frame.width, frame.height) else {
            return Ok(());
        };
        let grid = self.grid;
        match frame.format {
            PixelFormat::Rgb8 => with_image::<Rgb<u8>>(frame, |img| mosaic(img, rect, grid)),
            PixelFormat::Gray8 => with_image::<Luma<u8>>(frame, |img| mosaic(img, rect, grid)),
        }
    }

    fn draw_rect(
        &mut self,
        frame: &mut FrameBuffer,
        rect: BoundingRect,
    ) -> Result<(), ContractError> {
        if rect.width == 0 || rect.height == 0 {
            return Ok(());
        }
        let (x0, y0) = (rect.x as i64, rect.y as i64);
        let (x1, y1) = (x0 + rect.width as i64 - 1, y0 + rect.height as i64 - 1);

        for x in x0..=x1 {
            Self::plot(frame, x, y0, self.box_color);
            Self::plot(frame, x, y1, self.box_color);
        }
        for y in y0..=y1 {
            Self::plot(frame, x0, y, self.box_color);
            Self::plot(frame, x1, y, self.box_color);
        }
        Ok(())
    }

    fn draw_text(
        &mut self,
        frame: &mut FrameBuffer,
        text: &str,
        x: i32,
        y: i32,
    ) -> Result<(), ContractError> {
        let scale = self.text_scale as i64;
        let mut pen_x = x as i64;

        for c in text.chars() {
            if let Some(rows) = font::glyph(c) {
                for (row_idx, row) in rows.iter().enumerate() {
                    for col in 0..font::GLYPH_WIDTH {
                        if !font::lit(*row, col) {
                            continue;
                        }
                        let px = pen_x + col as i64 * scale;
                        let py = y as i64 + row_idx as i64 * scale;
                        for dy in 0..scale {
                            for dx in 0..scale {
                                Self::plot(frame, px + dx, py + dy, self.text_color);
                            }
                        }
                    }
                }
            }
            pen_x += font::ADVANCE as i64 * scale;
        }
        Ok(())
    }
}

/// Borrow the frame bytes as an `ImageBuffer` for the duration of `op`
fn with_image<P>(
    frame: &mut FrameBuffer,
    op: impl FnOnce(&mut ImageBuffer<P, Vec<u8>>),
) -> Result<(), ContractError>
where
    P: Pixel<Subpixel = u8>,
{
    let expected = frame.width as usize * frame.height as usize * P::CHANNEL_COUNT as usize;
    if frame.data.len() != expected {
        return Err(ContractError::collaborator(
            StageName::Sink,
            format!(
                "frame buffer holds {} bytes, expected {expected}",
                frame.data.len()
            ),
        ));
    }

    let data = std::mem::take(&mut frame.data);
    let mut img = ImageBuffer::<P, Vec<u8>>::from_raw(frame.width, frame.height, data)
        .ok_or_else(|| ContractError::collaborator(StageName::Sink, "frame buffer rejected"))?;
    op(&mut img);
    frame.data = img.into_raw();
    Ok(())
}

fn mosaic<P>(img: &mut ImageBuffer<P, Vec<u8>>, rect: BoundingRect, grid: u32)
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (x, y, w, h) = (rect.x as u32, rect.y as u32, rect.width, rect.height);
    let roi = imageops::crop_imm(&*img, x, y, w, h).to_image();
    let small = imageops::resize(&roi, grid.min(w), grid.min(h), FilterType::Triangle);
    let blocks = imageops::resize(&small, w, h, FilterType::Nearest);
    imageops::replace(img, &blocks, x as i64, y as i64);
}
