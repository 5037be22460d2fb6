use std::path::Path;

use image::RgbaImage;

use crate::error::{DrawError, DrawResult};

pub const BYTES_PER_PIXEL: usize = 4;

/// A rendered page: straight (non-premultiplied) RGBA, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RenderedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> DrawResult<Self> {
        if pixels.len() != byte_len(width, height) {
            return Err(DrawError::invalid_argument(
                "rgba pixels length does not match dimensions",
            ));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub(crate) fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.pixels.get(offset..offset + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }

        let stride = self.width as usize * BYTES_PER_PIXEL;
        let start = y as usize * stride;
        self.pixels.get(start..start + stride)
    }

    pub fn to_rgba_image(&self) -> DrawResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or(
            DrawError::invalid_argument("rgba pixels length does not match dimensions"),
        )
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> DrawResult<()> {
        let path = path.as_ref();
        self.to_rgba_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|source| match source {
                image::ImageError::IoError(io) => DrawError::io_with_context(
                    io,
                    format!("failed to write png: {}", path.display()),
                ),
                other => DrawError::native(format!("png encoding failed: {other}")),
            })
    }
}

pub(crate) fn byte_len(width: u32, height: u32) -> usize {
    (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(BYTES_PER_PIXEL)
}

#[cfg(test)]
mod tests {
    use crate::error::DrawError;
    use crate::test_support::unique_temp_path;

    use super::RenderedImage;

    #[test]
    fn new_rejects_mismatched_buffer() {
        let err = RenderedImage::new(2, 2, vec![0; 15]).expect_err("length should mismatch");
        assert!(matches!(err, DrawError::InvalidArgument(_)));
    }

    #[test]
    fn pixel_and_row_address_row_major_top_down() {
        let mut pixels = vec![0_u8; 3 * 2 * 4];
        pixels[20..24].copy_from_slice(&[9, 8, 7, 6]);
        let image = RenderedImage::new(3, 2, pixels).expect("dimensions should match");

        assert_eq!(image.pixel(2, 1), Some([9, 8, 7, 6]));
        assert_eq!(image.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(image.row(1).map(<[u8]>::len), Some(12));
        assert!(image.row(2).is_none());
    }

    #[test]
    fn save_png_round_trips_through_image_crate() {
        let image = RenderedImage::filled(4, 3, [10, 20, 30, 255]);
        let path = unique_temp_path("save.png");

        image.save_png(&path).expect("png should be written");
        let decoded = image::open(&path).expect("png should decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(3, 2).0, [10, 20, 30, 255]);

        std::fs::remove_file(&path).expect("png should be removed");
    }
}
