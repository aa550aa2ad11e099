pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod normalize;
pub mod parse;
pub mod report;
pub mod scanner;
pub mod similarity;

use std::path::Path;

use tracing::warn;

use crate::config::{expand_path, AppConfig};
use crate::corpus::{load_documents, load_main_document, PageSource, PdfPageSource};
use crate::error::{Result, ScanError};
use crate::logging::CORPUS_LOADING;
use crate::report::{aggregate, DocumentReport};
use crate::scanner::{CancellationToken, CorpusScanner};

pub use crate::document::{Document, Page};
pub use crate::matcher::{PageComparisonResult, ParagraphMatch};

/// Scan the configured main PDF against every PDF in the corpus directory.
///
/// # Arguments
/// * `config` - Paths and thresholds for the run
///
/// # Returns
/// * `Result<Vec<DocumentReport>>` - One report per candidate that cleared the
///   document threshold, in file name order. An unreadable main document is an
///   error, never an empty report.
pub fn run_scan(config: &AppConfig) -> Result<Vec<DocumentReport>> {
    run_scan_with(&PdfPageSource, config, &CancellationToken::new())
}

/// [`run_scan`] with a custom page source and a caller owned cancellation token.
pub fn run_scan_with<S: PageSource>(
    source: &S,
    config: &AppConfig,
    token: &CancellationToken,
) -> Result<Vec<DocumentReport>> {
    config.validate()?;
    let main_path = required_path(config.main_document.as_deref(), "main document")?;
    let corpus_dir = required_path(config.corpus_dir.as_deref(), "corpus directory")?;
    let skip_count = config.scan.skip_count;

    // Everything is loaded before the first comparison starts.
    let main = load_main_document(source, &main_path, skip_count)?;
    let corpus = load_documents(source, &corpus_dir, skip_count)?;
    if corpus.is_empty() {
        warn!(target: CORPUS_LOADING, dir = %corpus_dir.display(), "no candidate documents to compare");
    }

    let scanner = CorpusScanner::new(config.scan.clone())?;
    let reports = scanner.scan_with_cancellation(&main, &corpus.documents, token)?;
    Ok(aggregate(reports))
}

fn required_path(path: Option<&Path>, what: &str) -> Result<std::path::PathBuf> {
    path.map(expand_path)
        .ok_or_else(|| ScanError::Config(format!("no {what} configured")))
}
