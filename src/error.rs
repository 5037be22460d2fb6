use std::path::{Path, PathBuf};

pub type DrawResult<T> = Result<T, DrawError>;

#[derive(thiserror::Error, Debug)]
pub enum DrawError {
    #[error("failed to open {}: {reason}", path.display())]
    OpenFailed { path: PathBuf, reason: String },
    #[error("no PDF backend available")]
    NoBackendAvailable,
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    #[error("PDF render failed for page {page}")]
    PdfRender {
        page: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("native engine failure: {0}")]
    Native(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for DrawError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            context: "I/O operation failed".to_string(),
        }
    }
}

impl DrawError {
    pub fn open_failed(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::OpenFailed {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn unknown_backend(name: impl Into<String>) -> Self {
        Self::UnknownBackend(name.into())
    }

    pub fn io_with_context(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn native(message: impl Into<String>) -> Self {
        Self::Native(message.into())
    }

    pub fn pdf_render(page: usize, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::PdfRender {
            page,
            source: Box::new(source),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
