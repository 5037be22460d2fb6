use std::path::Path;

use crate::error::{DrawError, DrawResult};

pub mod hayro;
#[cfg(feature = "pdfium")]
pub mod pdfium;
#[cfg(target_os = "macos")]
pub mod quartz;
mod traits;

pub use self::hayro::HayroDoc;
#[cfg(feature = "pdfium")]
pub use self::pdfium::{PdfiumDoc, PdfiumLibrary};
#[cfg(target_os = "macos")]
pub use self::quartz::QuartzDoc;
pub use traits::{PdfBackend, RenderTarget};

pub(crate) const PDF_HEADER: &[u8] = b"%PDF-";
pub(crate) const MEMORY_SOURCE: &str = "<memory>";

/// Names of the backends compiled into this build, in default priority order.
pub fn compiled_backends() -> &'static [&'static str] {
    &[
        self::hayro::NAME,
        #[cfg(feature = "pdfium")]
        self::pdfium::NAME,
        #[cfg(target_os = "macos")]
        self::quartz::NAME,
    ]
}

/// Reads a PDF file fully into memory after checking it looks like one.
pub(crate) fn read_pdf_bytes(path: &Path) -> DrawResult<Vec<u8>> {
    if path.as_os_str().is_empty() {
        return Err(DrawError::open_failed(path, "pdf path must not be empty"));
    }
    if !path.exists() {
        return Err(DrawError::open_failed(path, "pdf file not found"));
    }
    if !path.is_file() {
        return Err(DrawError::open_failed(
            path,
            "pdf path must be a regular file",
        ));
    }

    let bytes = std::fs::read(path).map_err(|source| {
        DrawError::open_failed(path, format!("failed to read file: {source}"))
    })?;
    if !bytes.starts_with(PDF_HEADER) {
        return Err(DrawError::open_failed(
            path,
            "input is not a valid PDF header",
        ));
    }

    Ok(bytes)
}
