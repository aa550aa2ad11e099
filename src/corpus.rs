use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::{ExtractionError, Result, ScanError};
use crate::logging::CORPUS_LOADING;
use crate::parse::extract_text_by_page;

/// File extension of documents picked up from a corpus directory.
pub const PDF_EXTENSION: &str = "pdf";

/// Turns a file into `(page_number, raw_text)` pairs.
pub trait PageSource: Sync {
    fn extract(&self, path: &Path) -> Result<Vec<(u32, String)>, ExtractionError>;
}

/// Reads pages out of PDF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPageSource;

impl PageSource for PdfPageSource {
    fn extract(&self, path: &Path) -> Result<Vec<(u32, String)>, ExtractionError> {
        extract_text_by_page(path)
    }
}

/// The candidate documents loaded from a directory, in file name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub documents: Vec<Document>,
}

impl Corpus {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Loads the reference document. Failing to read it aborts the scan.
pub fn load_main_document<S: PageSource>(
    source: &S,
    path: &Path,
    skip_count: u32,
) -> Result<Document> {
    let pages = source
        .extract(path)
        .map_err(|source| ScanError::MainDocument {
            path: path.to_path_buf(),
            source,
        })?;
    let doc = Document::from_raw_pages(display_name(path), pages, skip_count);
    info!(target: CORPUS_LOADING, document = %doc, "loaded main document");
    Ok(doc)
}

/// Loads every PDF in `dir`. Entries that are not PDFs or cannot be
/// extracted are skipped; only an unreadable directory is an error.
pub fn load_documents<S: PageSource>(source: &S, dir: &Path, skip_count: u32) -> Result<Corpus> {
    let entries = fs::read_dir(dir).map_err(|source| ScanError::Corpus {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(target: CORPUS_LOADING, error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| path.is_file() && has_extension(path, PDF_EXTENSION))
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match source.extract(&path) {
            Ok(pages) => {
                let doc = Document::from_raw_pages(display_name(&path), pages, skip_count);
                debug!(target: CORPUS_LOADING, document = %doc, "loaded candidate");
                documents.push(doc);
            }
            Err(e) => {
                warn!(target: CORPUS_LOADING, path = %path.display(), error = %e, "skipping candidate");
            }
        }
    }

    info!(
        target: CORPUS_LOADING,
        dir = %dir.display(),
        documents = documents.len(),
        "loaded corpus"
    );
    Ok(Corpus { documents })
}
