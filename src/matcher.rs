use serde::Serialize;
use tracing::trace;

use crate::document::{corrected_page_number, Page};
use crate::error::Result;
use crate::logging::SCAN_OPERATIONS;
use crate::normalize::is_blank;
use crate::scanner::TaskBudget;
use crate::similarity::score;

/// A pair of paragraphs whose similarity cleared the paragraph threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParagraphMatch {
    pub main_paragraph: String,
    pub other_paragraph: String,
    pub score: f64,
}

/// Matches between one main page and one candidate page. Page numbers are
/// already corrected for the skipped leading pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageComparisonResult {
    pub main_page: i64,
    pub other_page: i64,
    pub matches: Vec<ParagraphMatch>,
}

impl PageComparisonResult {
    pub fn best_score(&self) -> Option<f64> {
        self.matches.iter().map(|m| m.score).reduce(f64::max)
    }
}

/// One unit of work for the scanner: a main page to compare against every
/// page of a candidate document.
#[derive(Debug, Clone, Copy)]
pub struct PageTask<'a> {
    pub main_page_number: u32,
    pub main_text: &'a str,
    pub paragraph_threshold: f64,
    pub skip_count: u32,
}

impl PageTask<'_> {
    pub fn corrected_main_page(&self) -> i64 {
        corrected_page_number(self.main_page_number, self.skip_count)
    }
}

fn paragraphs(text: &str) -> Vec<&str> {
    text.split('\n').filter(|p| !is_blank(p)).collect()
}

fn collect_matches<F>(
    main_text: &str,
    other_text: &str,
    threshold: f64,
    mut keep_going: F,
) -> Result<Vec<ParagraphMatch>>
where
    F: FnMut() -> Result<()>,
{
    let main_paragraphs = paragraphs(main_text);
    let other_paragraphs = paragraphs(other_text);
    let mut similar = Vec::new();

    for main_paragraph in &main_paragraphs {
        for other_paragraph in &other_paragraphs {
            keep_going()?;
            let similarity = score(main_paragraph, other_paragraph);
            if similarity > threshold {
                similar.push(ParagraphMatch {
                    main_paragraph: (*main_paragraph).to_string(),
                    other_paragraph: (*other_paragraph).to_string(),
                    score: similarity,
                });
            }
        }
    }

    Ok(similar)
}

/// Scores every pair of non-blank paragraphs (lines) of the two texts and
/// keeps the pairs scoring strictly above `threshold`, ordered by main
/// paragraph and then by other paragraph.
pub fn find_similar_paragraphs(
    main_text: &str,
    other_text: &str,
    threshold: f64,
) -> Vec<ParagraphMatch> {
    collect_matches(main_text, other_text, threshold, || Ok(())).unwrap_or_default()
}

/// Same as [`find_similar_paragraphs`] but stops as soon as the task budget
/// is exhausted or the scan is cancelled.
pub fn find_similar_paragraphs_within(
    main_text: &str,
    other_text: &str,
    threshold: f64,
    budget: &TaskBudget<'_>,
) -> Result<Vec<ParagraphMatch>> {
    collect_matches(main_text, other_text, threshold, || budget.check())
}

/// Compares one main page against every page of a candidate document.
///
/// Blank candidate pages are skipped and only page pairs with at least one
/// match are returned.
pub fn compare_page(
    task: &PageTask<'_>,
    candidate_pages: &[Page],
    budget: &TaskBudget<'_>,
) -> Result<Vec<PageComparisonResult>> {
    let mut results = Vec::new();

    for other in candidate_pages {
        if other.is_blank() {
            continue;
        }
        let matches = find_similar_paragraphs_within(
            task.main_text,
            &other.normalized_text,
            task.paragraph_threshold,
            budget,
        )?;
        if matches.is_empty() {
            continue;
        }

        trace!(
            target: SCAN_OPERATIONS,
            main_page = task.main_page_number,
            other_page = other.number,
            matches = matches.len(),
            "page pair matched"
        );
        results.push(PageComparisonResult {
            main_page: task.corrected_main_page(),
            other_page: corrected_page_number(other.number, task.skip_count),
            matches,
        });
    }

    Ok(results)
}
