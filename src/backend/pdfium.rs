use std::path::{Path, PathBuf};

use pdfium_render::prelude::*;

use crate::document::{Document, RenderOptions};
use crate::error::{DrawError, DrawResult};
use crate::pixel::{self, PixelLayout};
use crate::raster::RenderedImage;

use super::traits::{PdfBackend, RenderTarget};
use super::{MEMORY_SOURCE, read_pdf_bytes};

pub const NAME: &str = "pdfium";

/// Where to find the PDFium shared library; `None` searches the system paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfiumLibrary {
    pub path: Option<PathBuf>,
}

impl PdfiumLibrary {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    fn bind(&self) -> DrawResult<Pdfium> {
        let bindings = match &self.path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|source| DrawError::native(format!("failed to bind PDFium: {source}")))?;
        Ok(Pdfium::new(bindings))
    }
}

/// A document opened through PDFium. Page sizes are the media-box width and height.
///
/// `Pdfium` is neither `Send` nor `Sync`, so every call binds the library and
/// reloads the retained bytes, then drops both before returning.
pub struct PdfiumDoc {
    library: PdfiumLibrary,
    bytes: Vec<u8>,
    page_count: usize,
}

impl PdfBackend for PdfiumDoc {
    fn name(&self) -> &'static str {
        NAME
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, page: usize) -> DrawResult<(f64, f64)> {
        let pdfium = self.library.bind()?;
        let document = self.load(&pdfium)?;
        let page_ref = document
            .pages()
            .get(page_index(page)?)
            .map_err(|_| DrawError::invalid_argument("page index is out of range"))?;
        Ok((
            f64::from(page_ref.width().value),
            f64::from(page_ref.height().value),
        ))
    }

    fn render_page(
        &self,
        page: usize,
        target: RenderTarget,
        options: &RenderOptions,
    ) -> DrawResult<RenderedImage> {
        let (width, height) = bitmap_size(target)?;
        let pdfium = self.library.bind()?;
        let document = self.load(&pdfium)?;
        let page_ref = document
            .pages()
            .get(page_index(page)?)
            .map_err(|_| DrawError::invalid_argument("page index is out of range"))?;

        let config = render_config(width, height, options);
        let bitmap = page_ref
            .render_with_config(&config)
            .map_err(|source| DrawError::pdf_render(page, source))?;

        let (pix_width, pix_height) = (bitmap.width(), bitmap.height());
        if pix_width != width || pix_height != height {
            return Err(DrawError::pdf_render(
                page,
                DrawError::native(format!(
                    "pdfium produced a {pix_width}x{pix_height} bitmap for a {width}x{height} target"
                )),
            ));
        }

        let raw = bitmap.as_raw_bytes();
        let stride = raw.len() / target.height as usize;
        pixel::normalize(
            &raw,
            target.width,
            target.height,
            stride,
            PixelLayout::BGRA_STRAIGHT,
        )
        .map_err(|source| DrawError::pdf_render(page, source))
    }
}

impl PdfiumDoc {
    pub fn open(path: impl AsRef<Path>, library: PdfiumLibrary) -> DrawResult<Self> {
        let path = path.as_ref();
        let bytes = read_pdf_bytes(path)?;
        Self::open_bytes_at(path, bytes, library)
    }

    pub fn open_bytes(bytes: Vec<u8>, library: PdfiumLibrary) -> DrawResult<Self> {
        Self::open_bytes_at(MEMORY_SOURCE, bytes, library)
    }

    fn open_bytes_at(
        path: impl AsRef<Path>,
        bytes: Vec<u8>,
        library: PdfiumLibrary,
    ) -> DrawResult<Self> {
        let path = path.as_ref();
        let page_count = {
            let pdfium = library.bind()?;
            let document = pdfium
                .load_pdf_from_byte_slice(&bytes, None)
                .map_err(|source| {
                    DrawError::open_failed(path, format!("pdfium rejected the file: {source}"))
                })?;
            document.pages().len() as usize
        };

        Ok(Self {
            library,
            bytes,
            page_count,
        })
    }

    fn load<'a>(&'a self, pdfium: &'a Pdfium) -> DrawResult<PdfDocument<'a>> {
        pdfium
            .load_pdf_from_byte_slice(&self.bytes, None)
            .map_err(|source| {
                DrawError::native(format!("pdfium failed to reload document: {source}"))
            })
    }
}

pub fn opener(library: PdfiumLibrary) -> impl Fn(&Path) -> DrawResult<Document> + Send + Sync {
    move |path| PdfiumDoc::open(path, library.clone()).map(|doc| Document::new(Box::new(doc)))
}

fn page_index(page: usize) -> DrawResult<PdfPageIndex> {
    PdfPageIndex::try_from(page)
        .map_err(|_| DrawError::invalid_argument("page index is out of range"))
}

fn bitmap_size(target: RenderTarget) -> DrawResult<(Pixels, Pixels)> {
    let width = Pixels::try_from(target.width);
    let height = Pixels::try_from(target.height);
    match (width, height) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => Err(DrawError::invalid_argument(
            "render size exceeds the pdfium bitmap limit",
        )),
    }
}

fn render_config(width: Pixels, height: Pixels, options: &RenderOptions) -> PdfRenderConfig {
    let fill = options.fill_color;
    let smooth = !options.no_aa;

    PdfRenderConfig::new()
        .set_target_size(width, height)
        .set_clear_color(PdfColor::new(fill.r, fill.g, fill.b, fill.a))
        .use_print_quality(true)
        .set_text_smoothing(smooth)
        .set_path_smoothing(smooth)
        .set_image_smoothing(smooth)
}
