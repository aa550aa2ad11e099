use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Raised by the text extraction layer when a file cannot be turned into pages.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse PDF {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("{path} contains no pages")]
    NoPages { path: PathBuf },
}

/// A pairwise vector space could not be built.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VectorizeError {
    #[error("empty vocabulary; texts contain no usable terms")]
    EmptyVocabulary,
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// The reference document is unreadable. Always fatal for a scan.
    #[error("main document {path} could not be read: {source}")]
    MainDocument {
        path: PathBuf,
        #[source]
        source: ExtractionError,
    },

    #[error("corpus directory {path} could not be read: {source}")]
    Corpus {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("scan cancelled")]
    Cancelled,

    #[error("comparison of main page {main_page} timed out after {elapsed:?}")]
    TaskTimedOut { main_page: i64, elapsed: Duration },
}

pub type Result<T, E = ScanError> = std::result::Result<T, E>;
