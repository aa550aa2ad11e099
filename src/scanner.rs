//! Parallel fan-out of page comparisons across a corpus.
//!
//! Candidate documents are processed one after another. For each of them the
//! non-blank main pages become independent work items that run on a rayon
//! pool built for the scan and dropped (joined) before the scan returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::document::{Document, Page};
use crate::error::{Result, ScanError};
use crate::logging::SCAN_OPERATIONS;
use crate::matcher::{compare_page, PageComparisonResult, PageTask};
use crate::report::DocumentReport;

/// Shared flag used to stop a running scan from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancellation and deadline checks for a single work item.
///
/// The scan token belongs to the caller and is only read. The optional
/// document token is private to one candidate document and is tripped when a
/// task runs out of time, so the other tasks on that document stop early.
#[derive(Debug)]
pub struct TaskBudget<'a> {
    scan: &'a CancellationToken,
    document: Option<&'a CancellationToken>,
    main_page: i64,
    started: Instant,
    timeout: Option<Duration>,
}

impl<'a> TaskBudget<'a> {
    pub fn new(scan: &'a CancellationToken, main_page: i64, timeout: Option<Duration>) -> Self {
        TaskBudget {
            scan,
            document: None,
            main_page,
            started: Instant::now(),
            timeout,
        }
    }

    pub fn with_document_token(mut self, document: &'a CancellationToken) -> Self {
        self.document = Some(document);
        self
    }

    /// Fails once the scan or document is cancelled, or this task ran past
    /// its timeout.
    pub fn check(&self) -> Result<()> {
        let document_cancelled = self.document.is_some_and(CancellationToken::is_cancelled);
        if self.scan.is_cancelled() || document_cancelled {
            return Err(ScanError::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            let elapsed = self.started.elapsed();
            if elapsed > timeout {
                if let Some(document) = self.document {
                    document.cancel();
                }
                return Err(ScanError::TaskTimedOut {
                    main_page: self.main_page,
                    elapsed,
                });
            }
        }
        Ok(())
    }
}

pub struct CorpusScanner {
    config: ScanConfig,
}

impl CorpusScanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(CorpusScanner { config })
    }

    /// Compares the main document against every candidate and returns a report
    /// for each candidate that has a match at or above the document threshold.
    /// Reports keep the order of `candidates`.
    pub fn scan(&self, main: &Document, candidates: &[Document]) -> Result<Vec<DocumentReport>> {
        self.scan_with_cancellation(main, candidates, &CancellationToken::new())
    }

    /// [`CorpusScanner::scan`] that stops with [`ScanError::Cancelled`] once
    /// `token` is cancelled. The token is never tripped by the scanner itself.
    ///
    /// A candidate whose comparison times out is left out of the result; the
    /// reports of every other candidate are kept.
    pub fn scan_with_cancellation(
        &self,
        main: &Document,
        candidates: &[Document],
        token: &CancellationToken,
    ) -> Result<Vec<DocumentReport>> {
        let span = info_span!(
            target: SCAN_OPERATIONS,
            "scan",
            scan_id = %Uuid::new_v4(),
            main = %main.name,
            candidates = candidates.len()
        );
        let _enter = span.enter();

        let tasks: Vec<PageTask<'_>> = main
            .comparable_pages()
            .map(|page| PageTask {
                main_page_number: page.number,
                main_text: &page.normalized_text,
                paragraph_threshold: self.config.paragraph_threshold,
                skip_count: self.config.skip_count,
            })
            .collect();

        let pool = self.build_pool()?;
        info!(
            target: SCAN_OPERATIONS,
            workers = pool.current_num_threads(),
            main_pages = tasks.len(),
            "starting scan"
        );

        let mut reports = Vec::new();
        for candidate in candidates {
            if token.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if let Some(report) = self.scan_document(&pool, &tasks, candidate, token)? {
                reports.push(report);
            }
        }
        // A timeout on the last candidate may hide a cancellation.
        if token.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        info!(target: SCAN_OPERATIONS, reported = reports.len(), "scan finished");
        Ok(reports)
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_threads())
            .thread_name(|i| format!("pagescan-worker-{i}"))
            .build()?;
        Ok(pool)
    }

    fn scan_document(
        &self,
        pool: &ThreadPool,
        tasks: &[PageTask<'_>],
        candidate: &Document,
        scan_token: &CancellationToken,
    ) -> Result<Option<DocumentReport>> {
        let span = info_span!(target: SCAN_OPERATIONS, "document", name = %candidate.name);
        let _enter = span.enter();

        let document_token = CancellationToken::new();
        let outcomes: Vec<Result<Vec<PageComparisonResult>>> = pool.install(|| {
            tasks
                .par_iter()
                .map(|task| self.run_task(task, &candidate.pages, scan_token, &document_token))
                .collect()
        });
        let results = match flatten_outcomes(outcomes) {
            Ok(results) => results,
            Err(err @ ScanError::TaskTimedOut { .. }) => {
                warn!(
                    target: SCAN_OPERATIONS,
                    document = %candidate.name,
                    error = %err,
                    "skipping document after timeout"
                );
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let qualifies = results
            .iter()
            .flat_map(|r| &r.matches)
            .any(|m| m.score >= self.config.document_threshold);

        debug!(
            target: SCAN_OPERATIONS,
            page_pairs = results.len(),
            qualifies,
            "document compared"
        );

        Ok(qualifies.then(|| DocumentReport {
            filename: candidate.name.clone(),
            results,
        }))
    }

    fn run_task(
        &self,
        task: &PageTask<'_>,
        pages: &[Page],
        scan_token: &CancellationToken,
        document_token: &CancellationToken,
    ) -> Result<Vec<PageComparisonResult>> {
        let budget = TaskBudget::new(
            scan_token,
            task.corrected_main_page(),
            self.config.task_timeout(),
        )
        .with_document_token(document_token);
        budget.check()?;
        compare_page(task, pages, &budget)
    }
}

/// Flattens per-task results in submission order. A timeout is reported in
/// preference to the cancellations it caused in sibling tasks.
fn flatten_outcomes(
    outcomes: Vec<Result<Vec<PageComparisonResult>>>,
) -> Result<Vec<PageComparisonResult>> {
    let mut results = Vec::new();
    let mut failure: Option<ScanError> = None;

    for outcome in outcomes {
        match outcome {
            Ok(page_results) => results.extend(page_results),
            Err(err @ ScanError::TaskTimedOut { .. }) => return Err(err),
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

/// Positional entry point: compares already normalized main pages against
/// candidate page lists named by `filenames` (same length, same order).
pub fn find_plagiarism(
    main_pages: &[Page],
    other_docs: &[Vec<Page>],
    filenames: &[String],
    document_threshold: f64,
    paragraph_threshold: f64,
) -> Result<Vec<DocumentReport>> {
    if other_docs.len() != filenames.len() {
        return Err(ScanError::Config(format!(
            "{} candidate documents but {} file names",
            other_docs.len(),
            filenames.len()
        )));
    }

    let config = ScanConfig {
        document_threshold,
        paragraph_threshold,
        ..ScanConfig::default()
    };
    let scanner = CorpusScanner::new(config)?;

    let main = Document::new("main", main_pages.to_vec());
    let candidates: Vec<Document> = other_docs
        .iter()
        .zip(filenames)
        .map(|(pages, name)| Document::new(name.clone(), pages.clone()))
        .collect();

    scanner.scan(&main, &candidates)
}
