use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Vector has {actual} dimensions but the index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("No supported documents found under {}", .0.display())]
    NoDocumentsFound(PathBuf),

    #[error("Index not found at {}; build it first", .0.display())]
    IndexNotFound(PathBuf),

    #[error("Index is corrupt: {0}")]
    CorruptIndex(String),

    #[error("Index is not loaded; build or load it before querying")]
    IndexNotLoaded,

    #[error("{service} error: {message}")]
    ExternalService { service: &'static str, message: String },

    #[error("I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService { service, message: message.into() }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
