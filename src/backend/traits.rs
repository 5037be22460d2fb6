use crate::document::RenderOptions;
use crate::error::{DrawError, DrawResult};
use crate::raster::RenderedImage;

/// Pixel size of the surface a page is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> DrawResult<Self> {
        if width == 0 || height == 0 {
            return Err(DrawError::invalid_argument(
                "render width and height must be positive",
            ));
        }
        Ok(Self { width, height })
    }

    /// Per-axis scale mapping a page of `page_size` points onto the whole target.
    pub fn scale_for(&self, page_size: (f64, f64)) -> DrawResult<(f64, f64)> {
        let (page_width, page_height) = page_size;
        if !(page_width.is_finite() && page_width > 0.0)
            || !(page_height.is_finite() && page_height > 0.0)
        {
            return Err(DrawError::native(format!(
                "page reports a degenerate size {page_width}x{page_height}"
            )));
        }

        Ok((
            f64::from(self.width) / page_width,
            f64::from(self.height) / page_height,
        ))
    }
}

/// One opened document inside a concrete rendering engine.
pub trait PdfBackend: Send {
    fn name(&self) -> &'static str;
    fn page_count(&self) -> usize;
    fn page_size(&self, page: usize) -> DrawResult<(f64, f64)>;
    fn render_page(
        &self,
        page: usize,
        target: RenderTarget,
        options: &RenderOptions,
    ) -> DrawResult<RenderedImage>;
}
