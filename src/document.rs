use std::sync::{Mutex, MutexGuard};

use serde::Deserialize;

use crate::backend::{PdfBackend, RenderTarget};
use crate::error::{DrawError, DrawResult};
use crate::raster::RenderedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "[u8; 4]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::rgba(r, g, b, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Background under the page content.
    pub fill_color: Color,
    /// Disables anti-aliasing.
    pub no_aa: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            fill_color: Color::WHITE,
            no_aa: false,
        }
    }
}

/// An opened PDF document, owned by exactly one backend.
///
/// Backend calls are serialized through a per-document lock since engines
/// are generally not safe for concurrent use of one document handle.
pub struct Document {
    backend_name: &'static str,
    page_count: usize,
    backend: Mutex<Box<dyn PdfBackend>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("backend", &self.backend_name)
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}

impl Document {
    pub fn new(backend: Box<dyn PdfBackend>) -> Self {
        let backend_name = backend.name();
        let page_count = backend.page_count();
        log::debug!("opened document with {page_count} pages using backend {backend_name}");

        Self {
            backend_name,
            page_count,
            backend: Mutex::new(backend),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    pub fn num_pages(&self) -> usize {
        self.page_count
    }

    pub fn page(&self, index: usize) -> DrawResult<Page<'_>> {
        if index >= self.page_count {
            return Err(DrawError::invalid_argument(format!(
                "page index {index} is out of range for {} pages",
                self.page_count
            )));
        }

        Ok(Page { doc: self, index })
    }

    pub fn pages(&self) -> impl ExactSizeIterator<Item = Page<'_>> + '_ {
        (0..self.page_count).map(move |index| Page { doc: self, index })
    }

    pub fn close(self) {
        log::debug!("closing document opened by backend {}", self.backend_name);
        drop(self);
    }

    fn lock(&self) -> DrawResult<MutexGuard<'_, Box<dyn PdfBackend>>> {
        self.backend
            .lock()
            .map_err(|_| DrawError::native("document lock poisoned by a failed render"))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Page<'doc> {
    doc: &'doc Document,
    index: usize,
}

impl Page<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Intrinsic page size in points. Which page box is reported depends on the backend.
    pub fn size(&self) -> DrawResult<(f64, f64)> {
        self.doc.lock()?.page_size(self.index)
    }

    /// Renders the page so that it exactly fills `width` x `height` pixels.
    pub fn render(
        &self,
        width: u32,
        height: u32,
        options: Option<&RenderOptions>,
    ) -> DrawResult<RenderedImage> {
        let target = RenderTarget::new(width, height)?;
        let defaults = RenderOptions::default();
        let options = options.unwrap_or(&defaults);

        let backend = self.doc.lock()?;
        let image = backend.render_page(self.index, target, options)?;
        if image.width() != width || image.height() != height {
            return Err(DrawError::pdf_render(
                self.index,
                DrawError::native(format!(
                    "backend {} produced {}x{} instead of {width}x{height}",
                    backend.name(),
                    image.width(),
                    image.height()
                )),
            ));
        }

        log::debug!(
            "rendered page {} at {width}x{height} with backend {}",
            self.index,
            backend.name()
        );
        Ok(image)
    }
}
