pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod pixel;
pub mod raster;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use document::{Color, Document, Page, RenderOptions};
pub use error::{DrawError, DrawResult};
pub use raster::RenderedImage;
pub use registry::BackendRegistry;
