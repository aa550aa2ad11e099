use std::fmt;

use serde::Serialize;

use crate::config::DisplayConfig;
use crate::matcher::{PageComparisonResult, ParagraphMatch};

const RULE_WIDTH: usize = 80;

/// Matches found in one candidate document that cleared the document gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub filename: String,
    pub results: Vec<PageComparisonResult>,
}

impl DocumentReport {
    pub fn best_score(&self) -> Option<f64> {
        self.results
            .iter()
            .filter_map(PageComparisonResult::best_score)
            .reduce(f64::max)
    }

    pub fn match_count(&self) -> usize {
        self.results.iter().map(|r| r.matches.len()).sum()
    }
}

/// Final report list handed to presentation. The reports are passed through
/// untouched; display filtering happens on borrowed views, see [`DisplayFilter`].
pub fn aggregate(reports: Vec<DocumentReport>) -> Vec<DocumentReport> {
    reports
}

/// A page pair as it should be shown, borrowing from the underlying report.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedPage<'a> {
    pub main_page: i64,
    pub other_page: i64,
    pub matches: Vec<&'a ParagraphMatch>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedDocument<'a> {
    pub filename: &'a str,
    pub pages: Vec<DisplayedPage<'a>>,
}

/// Presentation-side thresholds, applied without touching the report data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayFilter {
    page_threshold: f64,
    match_threshold: f64,
}

impl From<&DisplayConfig> for DisplayFilter {
    fn from(config: &DisplayConfig) -> Self {
        DisplayFilter {
            page_threshold: config.page_display_threshold,
            match_threshold: config.match_display_threshold,
        }
    }
}

impl Default for DisplayFilter {
    fn default() -> Self {
        DisplayFilter::from(&DisplayConfig::default())
    }
}

impl DisplayFilter {
    pub fn new(page_threshold: f64, match_threshold: f64) -> Self {
        DisplayFilter {
            page_threshold,
            match_threshold,
        }
    }

    /// Every document is kept so its heading is still shown; a page pair is
    /// kept when one of its matches reaches the page threshold, and within it
    /// only matches reaching the match threshold are listed.
    pub fn apply<'a>(&self, report: &'a DocumentReport) -> DisplayedDocument<'a> {
        let pages = report
            .results
            .iter()
            .filter(|r| r.matches.iter().any(|m| m.score >= self.page_threshold))
            .map(|r| DisplayedPage {
                main_page: r.main_page,
                other_page: r.other_page,
                matches: r
                    .matches
                    .iter()
                    .filter(|m| m.score >= self.match_threshold)
                    .collect(),
            })
            .collect();

        DisplayedDocument {
            filename: &report.filename,
            pages,
        }
    }
}

/// Display-filtered reports in the terminal layout.
pub struct TextReport<'a> {
    reports: &'a [DocumentReport],
    filter: DisplayFilter,
}

impl<'a> TextReport<'a> {
    pub fn new(reports: &'a [DocumentReport], filter: DisplayFilter) -> Self {
        TextReport { reports, filter }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);
        for report in self.reports {
            let shown = self.filter.apply(report);
            writeln!(f, "Document: {}", shown.filename)?;
            for page in &shown.pages {
                writeln!(f, "Page in main document: {}", page.main_page)?;
                writeln!(f, "Page in compared document: {}", page.other_page)?;
                writeln!(f, "Matching paragraphs:")?;
                for m in &page.matches {
                    writeln!(f, "Similarity: {:.2}", m.score)?;
                    writeln!(f, "Main document: {}", m.main_paragraph)?;
                    writeln!(f, "Compared document: {}", m.other_paragraph)?;
                    writeln!(f, "{rule}")?;
                }
            }
        }
        Ok(())
    }
}

/// Renders reports as plain text for a terminal.
pub fn render_text(reports: &[DocumentReport], filter: &DisplayFilter) -> String {
    TextReport::new(reports, *filter).to_string()
}
