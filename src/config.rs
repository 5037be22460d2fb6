use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::document::{Color, RenderOptions};
use crate::error::{DrawError, DrawResult};

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub render: RenderConfig,
    pub pdfium: PdfiumConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend names tried in order when opening without an explicit backend.
    pub preference: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    pub fill_color: Color,
    pub anti_alias: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fill_color: Color::WHITE,
            anti_alias: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PdfiumConfig {
    /// Full path of the PDFium shared library; unset uses the system search path.
    pub library_path: Option<PathBuf>,
}

#[cfg(feature = "pdfium")]
impl PdfiumConfig {
    pub fn library(&self) -> crate::backend::PdfiumLibrary {
        crate::backend::PdfiumLibrary {
            path: self.library_path.clone(),
        }
    }
}

impl Config {
    pub fn load_from_path(path: impl AsRef<Path>) -> DrawResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(DrawError::invalid_argument(format!(
                "config path is not a regular file: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|source| {
            DrawError::io_with_context(source, format!("failed to read config: {}", path.display()))
        })?;
        toml::from_str::<Self>(&raw)
            .map(Self::sanitized)
            .map_err(|source| {
                DrawError::config(format!("failed to parse config {}: {source}", path.display()))
            })
    }

    pub fn from_toml_str(raw: &str) -> DrawResult<Self> {
        toml::from_str::<Self>(raw)
            .map(Self::sanitized)
            .map_err(|source| DrawError::config(format!("failed to parse config: {source}")))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            fill_color: self.render.fill_color,
            no_aa: !self.render.anti_alias,
        }
    }

    fn sanitized(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.backend.preference.len());
        for name in self.backend.preference.drain(..) {
            let name = name.trim().to_string();
            if !name.is_empty() && !seen.contains(&name) {
                seen.push(name);
            }
        }
        self.backend.preference = seen;

        if self
            .pdfium
            .library_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.pdfium.library_path = None;
        }
        self
    }
}
