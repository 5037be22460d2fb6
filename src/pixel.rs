use crate::error::{DrawError, DrawResult};
use crate::raster::{BYTES_PER_PIXEL, RenderedImage, byte_len};

/// Byte order of one pixel in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgba,
    Bgra,
    Argb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaMode {
    Straight,
    Premultiplied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    pub order: ChannelOrder,
    pub alpha: AlphaMode,
}

impl PixelLayout {
    pub const RGBA_STRAIGHT: Self = Self::new(ChannelOrder::Rgba, AlphaMode::Straight);
    pub const RGBA_PREMULTIPLIED: Self = Self::new(ChannelOrder::Rgba, AlphaMode::Premultiplied);
    pub const BGRA_STRAIGHT: Self = Self::new(ChannelOrder::Bgra, AlphaMode::Straight);
    pub const BGRA_PREMULTIPLIED: Self = Self::new(ChannelOrder::Bgra, AlphaMode::Premultiplied);

    pub const fn new(order: ChannelOrder, alpha: AlphaMode) -> Self {
        Self { order, alpha }
    }

    fn to_rgba(self, px: [u8; 4]) -> [u8; 4] {
        let [r, g, b, a] = match self.order {
            ChannelOrder::Rgba => px,
            ChannelOrder::Bgra => [px[2], px[1], px[0], px[3]],
            ChannelOrder::Argb => [px[1], px[2], px[3], px[0]],
        };

        match self.alpha {
            AlphaMode::Straight => [r, g, b, a],
            AlphaMode::Premultiplied => unpremultiply([r, g, b, a]),
        }
    }
}

/// Converts `raw` into a tightly packed straight-RGBA image.
///
/// `stride` is the distance in bytes between the starts of two rows and may
/// exceed `width * 4` when the engine pads its rows.
pub fn normalize(
    raw: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    layout: PixelLayout,
) -> DrawResult<RenderedImage> {
    let row_len = width as usize * BYTES_PER_PIXEL;
    if stride < row_len {
        return Err(DrawError::invalid_argument(
            "row stride is shorter than one row of pixels",
        ));
    }

    let needed = match height as usize {
        0 => 0,
        rows => stride.saturating_mul(rows - 1).saturating_add(row_len),
    };
    if raw.len() < needed {
        return Err(DrawError::invalid_argument(format!(
            "pixel buffer holds {} bytes, {needed} required for {width}x{height}",
            raw.len()
        )));
    }

    let mut out = vec![0_u8; byte_len(width, height)];
    if row_len > 0 {
        for (src_row, dst_row) in raw
            .chunks(stride)
            .zip(out.chunks_exact_mut(row_len))
        {
            let src: &[[u8; 4]] = bytemuck::cast_slice(&src_row[..row_len]);
            let dst: &mut [[u8; 4]] = bytemuck::cast_slice_mut(dst_row);
            for (dst_px, src_px) in dst.iter_mut().zip(src) {
                *dst_px = layout.to_rgba(*src_px);
            }
        }
    }

    RenderedImage::new(width, height, out)
}

/// Recovers straight color from a premultiplied pixel.
///
/// Fully transparent pixels carry no color and come back as `[0, 0, 0, 0]`.
pub fn unpremultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    match a {
        0 => [0, 0, 0, 0],
        255 => [r, g, b, a],
        _ => {
            let alpha = u32::from(a);
            let channel = |c: u8| ((u32::from(c) * 255 + alpha / 2) / alpha).min(255) as u8;
            [channel(r), channel(g), channel(b), a]
        }
    }
}

/// Forces every pixel's alpha to either 0 or 255, threshold 128.
pub(crate) fn snap_coverage(image: &mut RenderedImage) {
    let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(image.pixels_mut());
    for px in pixels {
        *px = if px[3] >= 128 {
            [px[0], px[1], px[2], 255]
        } else {
            [0, 0, 0, 0]
        };
    }
}

pub(crate) fn composite_over(image: &mut RenderedImage, background: [u8; 4]) {
    let pixels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(image.pixels_mut());
    for px in pixels {
        *px = over(*px, background);
    }
}

fn over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    match (src[3], dst[3]) {
        (255, _) => src,
        (0, _) => dst,
        (sa, da) => {
            let sa = u32::from(sa);
            let da = u32::from(da);
            // Alpha in 0..=255*255 to keep the blend in integer math.
            let out_a = sa * 255 + da * (255 - sa);
            if out_a == 0 {
                return [0, 0, 0, 0];
            }
            let blend = |s: u8, d: u8| {
                let num = u32::from(s) * sa * 255 + u32::from(d) * da * (255 - sa);
                ((num + out_a / 2) / out_a).min(255) as u8
            };
            [
                blend(src[0], dst[0]),
                blend(src[1], dst[1]),
                blend(src[2], dst[2]),
                ((out_a + 127) / 255) as u8,
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DrawError;
    use crate::raster::RenderedImage;

    use super::{
        AlphaMode, ChannelOrder, PixelLayout, composite_over, normalize, snap_coverage,
        unpremultiply,
    };

    #[test]
    fn bgra_is_reordered_to_rgba() {
        let raw = [30, 20, 10, 255, 3, 2, 1, 128];
        let image = normalize(&raw, 2, 1, 8, PixelLayout::BGRA_STRAIGHT).expect("should normalize");
        assert_eq!(image.pixels(), &[10, 20, 30, 255, 1, 2, 3, 128]);
    }

    #[test]
    fn argb_is_reordered_to_rgba() {
        let layout = PixelLayout::new(ChannelOrder::Argb, AlphaMode::Straight);
        let image = normalize(&[200, 1, 2, 3], 1, 1, 4, layout).expect("should normalize");
        assert_eq!(image.pixels(), &[1, 2, 3, 200]);
    }

    #[test]
    fn premultiplied_input_is_unpremultiplied() {
        let raw = [64, 32, 0, 128, 0, 0, 0, 0, 255, 255, 255, 255];
        let image =
            normalize(&raw, 3, 1, 12, PixelLayout::RGBA_PREMULTIPLIED).expect("should normalize");
        assert_eq!(image.pixel(0, 0), Some([128, 64, 0, 128]));
        assert_eq!(image.pixel(1, 0), Some([0, 0, 0, 0]));
        assert_eq!(image.pixel(2, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn unpremultiply_clamps_out_of_range_channels() {
        assert_eq!(unpremultiply([200, 0, 0, 100]), [255, 0, 0, 100]);
        assert_eq!(unpremultiply([9, 9, 9, 0]), [0, 0, 0, 0]);
    }

    #[test]
    fn padded_rows_are_skipped() {
        let raw = [
            1, 2, 3, 4, 0xEE, 0xEE, //
            5, 6, 7, 8, 0xEE, 0xEE,
        ];
        let image = normalize(&raw, 1, 2, 6, PixelLayout::RGBA_STRAIGHT).expect("should normalize");
        assert_eq!(image.pixels(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn last_row_padding_may_be_absent() {
        let raw = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8];
        let image = normalize(&raw, 1, 2, 8, PixelLayout::RGBA_STRAIGHT).expect("should normalize");
        assert_eq!(image.pixel(0, 1), Some([5, 6, 7, 8]));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = normalize(&[0; 15], 2, 2, 8, PixelLayout::RGBA_STRAIGHT)
            .expect_err("buffer is too short");
        assert!(matches!(err, DrawError::InvalidArgument(_)));
    }

    #[test]
    fn short_stride_is_rejected() {
        let err = normalize(&[0; 64], 4, 2, 8, PixelLayout::RGBA_STRAIGHT)
            .expect_err("stride is too short");
        assert!(matches!(err, DrawError::InvalidArgument(_)));
    }

    #[test]
    fn every_pixel_is_converted() {
        let width = 17;
        let height = 9;
        let raw: Vec<u8> = (0..width * height)
            .flat_map(|i| [(i % 256) as u8, 0, 255, 255])
            .collect();
        let image = normalize(
            &raw,
            width,
            height,
            width as usize * 4,
            PixelLayout::BGRA_STRAIGHT,
        )
        .expect("should normalize");

        for i in 0..width * height {
            let px = image.pixel(i % width, i / width).expect("pixel in range");
            assert_eq!(px, [255, 0, (i % 256) as u8, 255]);
        }
    }

    #[test]
    fn snap_coverage_makes_alpha_binary() {
        let mut image = RenderedImage::new(3, 1, vec![10, 10, 10, 127, 20, 20, 20, 128, 1, 1, 1, 0])
            .expect("dimensions should match");
        snap_coverage(&mut image);
        assert_eq!(
            image.pixels(),
            &[0, 0, 0, 0, 20, 20, 20, 255, 0, 0, 0, 0]
        );
    }

    #[test]
    fn composite_over_fills_transparent_pixels() {
        let mut image = RenderedImage::new(3, 1, vec![0, 0, 0, 0, 9, 9, 9, 255, 0, 0, 0, 128])
            .expect("dimensions should match");
        composite_over(&mut image, [255, 255, 255, 255]);
        assert_eq!(image.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(image.pixel(1, 0), Some([9, 9, 9, 255]));

        let [r, g, b, a] = image.pixel(2, 0).expect("pixel in range");
        assert_eq!(a, 255);
        assert!(r.abs_diff(127) <= 1 && r == g && g == b);
    }
}
