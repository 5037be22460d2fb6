use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::backend;
use crate::config::Config;
use crate::document::Document;
use crate::error::{DrawError, DrawResult};

pub type OpenFn = dyn Fn(&Path) -> DrawResult<Document> + Send + Sync;

struct Entry {
    name: String,
    opener: Arc<OpenFn>,
}

/// Maps backend names to document openers.
///
/// Entries keep their registration order. The default backend is the first
/// preferred name that is registered, falling back to the first entry.
#[derive(Default)]
pub struct BackendRegistry {
    entries: Vec<Entry>,
    preference: Vec<String>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.backends())
            .field("preference", &self.preference)
            .finish()
    }
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every backend compiled into this build.
    pub fn with_default_backends() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(backend::hayro::NAME, backend::hayro::open_document);
        #[cfg(feature = "pdfium")]
        registry.register(
            backend::pdfium::NAME,
            backend::pdfium::opener(config.pdfium.library()),
        );
        #[cfg(target_os = "macos")]
        registry.register(backend::quartz::NAME, backend::quartz::open_document);
        registry.set_preference(config.backend.preference.iter().cloned());
        registry
    }

    /// Registers `opener` under `name`; an existing entry keeps its position
    /// and gets the new opener.
    pub fn register<F>(&mut self, name: impl Into<String>, opener: F)
    where
        F: Fn(&Path) -> DrawResult<Document> + Send + Sync + 'static,
    {
        let name = name.into();
        let opener: Arc<OpenFn> = Arc::new(opener);

        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.name == name) {
            log::warn!("backend {name} registered twice, replacing previous opener");
            entry.opener = opener;
            return;
        }

        log::debug!("registered backend {name}");
        self.entries.push(Entry { name, opener });
    }

    pub fn set_preference<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preference = names.into_iter().map(Into::into).collect();
    }

    pub fn backends(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn default_backend(&self) -> Option<&str> {
        self.preference
            .iter()
            .find_map(|name| self.find(name))
            .or_else(|| self.entries.first())
            .map(|entry| entry.name.as_str())
    }

    pub fn open(&self, path: impl AsRef<Path>) -> DrawResult<Document> {
        let name = self
            .default_backend()
            .ok_or(DrawError::NoBackendAvailable)?;
        self.open_with_backend(path, name)
    }

    pub fn open_with_backend(&self, path: impl AsRef<Path>, name: &str) -> DrawResult<Document> {
        let entry = self
            .find(name)
            .ok_or_else(|| DrawError::unknown_backend(name))?;
        let path = path.as_ref();
        log::debug!("opening {} with backend {}", path.display(), entry.name);
        (entry.opener)(path)
    }

    fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}
