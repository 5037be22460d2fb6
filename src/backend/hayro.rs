use std::path::Path;
use std::sync::Arc;

use hayro::hayro_interpret::InterpreterSettings;
use hayro::hayro_syntax::Pdf;
use hayro::hayro_syntax::page::Page;
use hayro::vello_cpu::color::{AlphaColor, Srgb};
use hayro::{RenderSettings, render};

use crate::document::{Color, Document, RenderOptions};
use crate::error::{DrawError, DrawResult};
use crate::pixel::{self, PixelLayout};
use crate::raster::RenderedImage;

use super::traits::{PdfBackend, RenderTarget};
use super::{MEMORY_SOURCE, PDF_HEADER, read_pdf_bytes};

pub const NAME: &str = "hayro";

/// Pure-Rust backend on top of hayro's interpreter and vello_cpu rasterizer.
///
/// hayro reports the crop box, rotated as it will be displayed.
///
/// `render()` has no anti-aliasing switch, so `no_aa` only thresholds coverage
/// against the fill. Edges where two opaque shapes overlap keep the colour
/// blended by the rasterizer.
pub struct HayroDoc {
    pdf: Pdf,
}

impl PdfBackend for HayroDoc {
    fn name(&self) -> &'static str {
        NAME
    }

    fn page_count(&self) -> usize {
        self.pdf.pages().len()
    }

    fn page_size(&self, page: usize) -> DrawResult<(f64, f64)> {
        let (width, height) = self.page(page)?.render_dimensions();
        Ok((f64::from(width), f64::from(height)))
    }

    fn render_page(
        &self,
        page: usize,
        target: RenderTarget,
        options: &RenderOptions,
    ) -> DrawResult<RenderedImage> {
        let page_ref = self.page(page)?;
        let (page_width, page_height) = page_ref.render_dimensions();
        let (x_scale, y_scale) =
            target.scale_for((f64::from(page_width), f64::from(page_height)))?;
        let (width, height) = surface_size(target)?;

        // Coverage is drawn onto a transparent surface when it must be
        // thresholded, or when a translucent fill would not survive the
        // premultiplied round trip through the pixmap.
        let composite_fill = options.no_aa || options.fill_color.a != u8::MAX;
        let background = if composite_fill {
            Color::TRANSPARENT
        } else {
            options.fill_color
        };

        let render_settings = RenderSettings {
            x_scale: x_scale as f32,
            y_scale: y_scale as f32,
            width: Some(width),
            height: Some(height),
            bg_color: alpha_color(background),
            ..Default::default()
        };
        let interpreter_settings = InterpreterSettings::default();
        let pixmap = render(page_ref, &interpreter_settings, &render_settings);

        let (pix_width, pix_height) = (u32::from(pixmap.width()), u32::from(pixmap.height()));
        if pix_width != target.width || pix_height != target.height {
            return Err(DrawError::pdf_render(
                page,
                DrawError::native(format!(
                    "hayro produced a {pix_width}x{pix_height} pixmap for a {}x{} target",
                    target.width, target.height
                )),
            ));
        }

        let mut image = pixel::normalize(
            pixmap.data_as_u8_slice(),
            pix_width,
            pix_height,
            pix_width as usize * 4,
            PixelLayout::RGBA_PREMULTIPLIED,
        )
        .map_err(|source| DrawError::pdf_render(page, source))?;

        if options.no_aa {
            pixel::snap_coverage(&mut image);
        }
        if composite_fill {
            pixel::composite_over(&mut image, options.fill_color.to_array());
        }

        Ok(image)
    }
}

impl HayroDoc {
    pub fn open(path: impl AsRef<Path>) -> DrawResult<Self> {
        let path = path.as_ref();
        let bytes = read_pdf_bytes(path)?;
        Self::open_with_shared_bytes(path, Arc::new(bytes))
    }

    pub fn open_bytes(bytes: Vec<u8>) -> DrawResult<Self> {
        Self::open_with_shared_bytes(MEMORY_SOURCE, Arc::new(bytes))
    }

    pub fn open_with_shared_bytes(
        path: impl AsRef<Path>,
        bytes: Arc<Vec<u8>>,
    ) -> DrawResult<Self> {
        let path = path.as_ref();
        if !bytes.as_slice().starts_with(PDF_HEADER) {
            return Err(DrawError::open_failed(path, "input is not a valid PDF header"));
        }
        let pdf = Pdf::new(bytes)
            .map_err(|_| DrawError::open_failed(path, "failed to parse PDF with hayro"))?;

        Ok(Self { pdf })
    }

    fn page(&self, page: usize) -> DrawResult<&Page<'_>> {
        self.pdf
            .pages()
            .get(page)
            .ok_or(DrawError::invalid_argument("page index is out of range"))
    }
}

pub fn open_document(path: &Path) -> DrawResult<Document> {
    HayroDoc::open(path).map(|doc| Document::new(Box::new(doc)))
}

fn surface_size(target: RenderTarget) -> DrawResult<(u16, u16)> {
    let width = u16::try_from(target.width);
    let height = u16::try_from(target.height);
    match (width, height) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => Err(DrawError::invalid_argument(format!(
            "hayro surfaces are limited to {}x{} pixels",
            u16::MAX,
            u16::MAX
        ))),
    }
}

fn alpha_color(color: Color) -> AlphaColor<Srgb> {
    AlphaColor::from_rgba8(color.r, color.g, color.b, color.a)
}
