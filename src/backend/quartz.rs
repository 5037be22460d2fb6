use std::path::Path;

use objc2_core_foundation::{CFRetained, CFURL, CGFloat, CGPoint, CGRect, CGSize};
use objc2_core_graphics::{
    CGBitmapContextCreate, CGBitmapInfo, CGColorSpaceCreateDeviceRGB, CGContext,
    CGContextDrawPDFPage, CGContextFillRect, CGContextRestoreGState, CGContextSaveGState,
    CGContextScaleCTM, CGContextSetRGBFillColor, CGContextSetShouldAntialias,
    CGContextTranslateCTM, CGImageAlphaInfo, CGPDFBox, CGPDFDocument,
    CGPDFDocumentCreateWithURL, CGPDFDocumentGetNumberOfPages, CGPDFDocumentGetPage, CGPDFPage,
    CGPDFPageGetBoxRect,
};

use crate::document::{Document, RenderOptions};
use crate::error::{DrawError, DrawResult};
use crate::pixel::{self, PixelLayout};
use crate::raster::{self, RenderedImage};

use super::read_pdf_bytes;
use super::traits::{PdfBackend, RenderTarget};

pub const NAME: &str = "quartz";

/// macOS backend on CoreGraphics. Page sizes are the art box, which Quartz
/// falls back to the crop box for when it is absent.
pub struct QuartzDoc {
    document: CFRetained<CGPDFDocument>,
    page_count: usize,
}

// CGPDFDocument is immutable once created and Document serializes every call.
unsafe impl Send for QuartzDoc {}

impl Drop for QuartzDoc {
    fn drop(&mut self) {
        log::debug!("releasing quartz document with {} pages", self.page_count);
    }
}

impl PdfBackend for QuartzDoc {
    fn name(&self) -> &'static str {
        NAME
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, page: usize) -> DrawResult<(f64, f64)> {
        let page_ref = self.page(page)?;
        let rect = art_box(&page_ref);
        Ok((rect.size.width as f64, rect.size.height as f64))
    }

    fn render_page(
        &self,
        page: usize,
        target: RenderTarget,
        options: &RenderOptions,
    ) -> DrawResult<RenderedImage> {
        let page_ref = self.page(page)?;
        let rect = art_box(&page_ref);
        let (x_scale, y_scale) =
            target.scale_for((rect.size.width as f64, rect.size.height as f64))?;

        let (width, height) = (target.width as usize, target.height as usize);
        let stride = width * raster::BYTES_PER_PIXEL;
        let mut data = vec![0u8; raster::byte_len(target.width, target.height)];

        // The bitmap starts transparent. Opaque fills are painted first so
        // blend modes see them; translucent ones are composited afterwards.
        let fill = options.fill_color;
        let paint_fill = fill.a == u8::MAX;

        {
            let context = bitmap_context(&mut data, width, height, stride).ok_or_else(|| {
                DrawError::native("failed to create a CoreGraphics bitmap context")
            })?;
            let context = Some(&*context);

            unsafe {
                if paint_fill {
                    CGContextSetRGBFillColor(
                        context,
                        channel(fill.r),
                        channel(fill.g),
                        channel(fill.b),
                        1.0,
                    );
                    CGContextFillRect(
                        context,
                        CGRect::new(
                            CGPoint::new(0.0, 0.0),
                            CGSize::new(width as CGFloat, height as CGFloat),
                        ),
                    );
                }

                CGContextSetShouldAntialias(context, !options.no_aa);
                CGContextSaveGState(context);
                CGContextScaleCTM(context, x_scale as CGFloat, y_scale as CGFloat);
                CGContextTranslateCTM(context, -rect.origin.x, -rect.origin.y);
                CGContextDrawPDFPage(context, Some(&page_ref));
                CGContextRestoreGState(context);
            }
        }

        let mut image = pixel::normalize(
            &data,
            target.width,
            target.height,
            stride,
            PixelLayout::RGBA_PREMULTIPLIED,
        )
        .map_err(|source| DrawError::pdf_render(page, source))?;

        if !paint_fill {
            pixel::composite_over(&mut image, fill.to_array());
        }

        Ok(image)
    }
}

impl QuartzDoc {
    pub fn open(path: impl AsRef<Path>) -> DrawResult<Self> {
        let path = path.as_ref();
        read_pdf_bytes(path)?;

        let url = CFURL::from_file_path(path).ok_or_else(|| {
            DrawError::open_failed(path, "path cannot be expressed as a file URL")
        })?;
        let document = unsafe { CGPDFDocumentCreateWithURL(Some(&url)) }
            .ok_or_else(|| DrawError::open_failed(path, "unable to open pdf file"))?;
        let page_count = unsafe { CGPDFDocumentGetNumberOfPages(Some(&document)) };

        Ok(Self {
            document,
            page_count,
        })
    }

    fn page(&self, page: usize) -> DrawResult<CFRetained<CGPDFPage>> {
        if page >= self.page_count {
            return Err(DrawError::invalid_argument("page index is out of range"));
        }
        // Quartz numbers pages from one.
        unsafe { CGPDFDocumentGetPage(Some(&self.document), page + 1) }
            .ok_or_else(|| DrawError::invalid_argument("page index is out of range"))
    }
}

pub fn open_document(path: &Path) -> DrawResult<Document> {
    QuartzDoc::open(path).map(|doc| Document::new(Box::new(doc)))
}

fn art_box(page: &CGPDFPage) -> CGRect {
    unsafe { CGPDFPageGetBoxRect(Some(page), CGPDFBox::ArtBox) }
}

fn bitmap_context(
    data: &mut [u8],
    width: usize,
    height: usize,
    stride: usize,
) -> Option<CFRetained<CGContext>> {
    let color_space = unsafe { CGColorSpaceCreateDeviceRGB() }?;
    let bitmap_info = CGImageAlphaInfo::PremultipliedLast.0 | CGBitmapInfo::ByteOrder32Big.0;
    unsafe {
        CGBitmapContextCreate(
            data.as_mut_ptr().cast(),
            width,
            height,
            8,
            stride,
            Some(&color_space),
            bitmap_info,
        )
    }
}

fn channel(value: u8) -> CGFloat {
    CGFloat::from(value) / 255.0
}
