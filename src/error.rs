use std::path::PathBuf;

use thiserror::Error;

/// A book description that cannot start a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookSpecError {
    #[error("book title must not be empty")]
    EmptyTitle,
    #[error("chapter count {0} is outside 1..=200")]
    ChapterCount(u32),
    #[error("words per chapter {0} is outside 100..=15000")]
    WordsPerChapter(u32),
    #[error("expected {expected} chapter details, got {actual}")]
    DetailsMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Persistence failures. These always stop the session.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to build epub: {0}")]
    Epub(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Conditions that end a generation session early.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidBook(#[from] BookSpecError),
    #[error("no replacement API key was provided while generating {unit}")]
    QuotaAbandoned { unit: String },
    #[error("outline generation failed and retry was declined")]
    OutlineDeclined,
    #[error(transparent)]
    Write(#[from] SinkError),
}
