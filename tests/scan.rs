pub mod common;

use std::path::PathBuf;

use common::{document, document_with_page_nine};
use pagescan::config::{AppConfig, ScanConfig, DEFAULT_SKIP_COUNT};
use pagescan::error::ScanError;
use pagescan::matcher::find_similar_paragraphs;
use pagescan::scanner::{find_plagiarism, CorpusScanner};
use pagescan::{run_scan, Document, Page};
use pretty_assertions::assert_eq;
use setup::create_numbered_pdf;

const QUICK_FOX: &str = "the quick brown fox jumps";

fn scanner(document_threshold: f64, paragraph_threshold: f64) -> CorpusScanner {
    CorpusScanner::new(ScanConfig {
        document_threshold,
        paragraph_threshold,
        parallelism: Some(2),
        ..ScanConfig::default()
    })
    .unwrap()
}

#[test]
fn test_identical_page_is_reported_with_corrected_numbers() {
    let main = document_with_page_nine("main.pdf", "main", QUICK_FOX);
    let candidate = document(
        "copy.pdf",
        &[(8, "copypage8 copyfiller8"), (9, "copypage9 copyfiller9"), (10, QUICK_FOX)],
    );

    let reports = scanner(0.7, 0.7).scan(&main, &[candidate]).unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].filename, "copy.pdf");
    assert_eq!(reports[0].results.len(), 1);
    let result = &reports[0].results[0];
    assert_eq!((result.main_page, result.other_page), (1, 2));
    assert_eq!(result.matches.len(), 1);
    assert_eq!(result.matches[0].main_paragraph, "the quick brown fox jumps");
    assert!((result.matches[0].score - 1.0).abs() < 1e-9);
}

#[test]
fn test_disjoint_vocabulary_produces_no_report() {
    let main = document_with_page_nine("main.pdf", "main", QUICK_FOX);
    let candidate = document(
        "other.pdf",
        &[(8, "lorem ipsum dolor"), (9, "sit amet consectetur"), (10, "adipiscing elit sed")],
    );

    let reports = scanner(0.7, 0.7).scan(&main, &[candidate]).unwrap();
    assert!(reports.is_empty());
}

#[test]
fn test_page_just_below_threshold_is_excluded() {
    // Four shared terms and one private term per side score about 0.67.
    let main_text = "one two three four five";
    let other_text = "one two three four six";
    assert!(find_similar_paragraphs(main_text, other_text, 0.7).is_empty());

    let main = document_with_page_nine("main.pdf", "main", main_text);
    let candidate = document("near.pdf", &[(9, other_text)]);

    let reports = scanner(0.7, 0.7).scan(&main, &[candidate]).unwrap();
    assert!(reports.is_empty());
}

#[test]
fn test_document_gate_is_stricter_than_paragraph_gate() {
    // Five shared terms and one private term per side score about 0.717.
    let main = document_with_page_nine("main.pdf", "main", "one two three four five seven");
    let candidate = document("near.pdf", &[(9, "one two three four five eight")]);

    let gated = scanner(0.75, 0.7).scan(&main, &[candidate.clone()]).unwrap();
    assert!(gated.is_empty());

    let reported = scanner(0.7, 0.7).scan(&main, &[candidate]).unwrap();
    assert_eq!(reported.len(), 1);
    let best = reported[0].best_score().unwrap();
    assert!(best > 0.7 && best < 0.75, "got {best}");
}

#[test]
fn test_weak_matches_ride_along_with_a_qualifying_one() {
    let main = document(
        "main.pdf",
        &[(9, QUICK_FOX), (10, "one two three four five seven")],
    );
    let candidate = document(
        "copy.pdf",
        &[(9, QUICK_FOX), (10, "one two three four five eight")],
    );

    let reports = scanner(0.9, 0.7).scan(&main, &[candidate]).unwrap();
    assert_eq!(reports.len(), 1);
    let pairs: Vec<(i64, i64)> = reports[0]
        .results
        .iter()
        .map(|r| (r.main_page, r.other_page))
        .collect();
    assert_eq!(pairs, vec![(1, 1), (2, 2)]);
}

#[test]
fn test_reports_follow_candidate_order() {
    let main = document_with_page_nine("main.pdf", "main", QUICK_FOX);
    let candidates = vec![
        document("b.pdf", &[(9, QUICK_FOX)]),
        document("unrelated.pdf", &[(9, "nothing shared")]),
        document("a.pdf", &[(12, QUICK_FOX)]),
    ];

    let reports = scanner(0.7, 0.7).scan(&main, &candidates).unwrap();
    let names: Vec<&str> = reports.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["b.pdf", "a.pdf"]);
    assert_eq!(reports[1].results[0].other_page, 4);
}

#[test]
fn test_find_plagiarism_positional_entry_point() {
    let main_pages = vec![Page::new(9, QUICK_FOX)];
    let other_docs = vec![vec![Page::new(10, QUICK_FOX)], vec![Page::new(10, "unrelated words")]];
    let filenames = vec!["copy.pdf".to_string(), "clean.pdf".to_string()];

    let reports = find_plagiarism(&main_pages, &other_docs, &filenames, 0.7, 0.7).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].filename, "copy.pdf");
    assert_eq!(
        (reports[0].results[0].main_page, reports[0].results[0].other_page),
        (1, 2)
    );
}

/// A candidate large enough that comparing one main page against it takes far
/// longer than a few milliseconds.
fn oversized_document(name: &str) -> Document {
    let pages = (9..4009u32).map(|n| {
        let words: Vec<String> = (0..300).map(|i| format!("w{n}x{i}")).collect();
        (n, words.join(" "))
    });
    Document::from_raw_pages(name, pages, DEFAULT_SKIP_COUNT)
}

#[test]
fn test_timed_out_candidate_is_skipped_and_others_are_kept() {
    let main = document_with_page_nine("main.pdf", "main", QUICK_FOX);
    let candidates = vec![
        oversized_document("big.pdf"),
        document("copy.pdf", &[(9, QUICK_FOX)]),
    ];
    let scanner = CorpusScanner::new(ScanConfig {
        parallelism: Some(1),
        task_timeout_ms: Some(50),
        ..ScanConfig::default()
    })
    .unwrap();

    let reports = scanner.scan(&main, &candidates).unwrap();
    let names: Vec<&str> = reports.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["copy.pdf"]);

    // The timeout must not leave the scanner unusable.
    let again = scanner.scan(&main, &candidates[1..]).unwrap();
    assert_eq!(again.len(), 1);
}

fn app_config(main: PathBuf, corpus: PathBuf) -> AppConfig {
    AppConfig {
        main_document: Some(main),
        corpus_dir: Some(corpus),
        ..AppConfig::default()
    }
}

#[test]
fn test_run_scan_over_pdf_files() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    std::fs::create_dir(&corpus).unwrap();

    let main = dir.path().join("main.pdf");
    create_numbered_pdf(&main, "main", 9, &[(9, QUICK_FOX)]);
    create_numbered_pdf(&corpus.join("copy.pdf"), "copy", 10, &[(10, QUICK_FOX)]);
    create_numbered_pdf(&corpus.join("clean.pdf"), "clean", 10, &[]);
    std::fs::write(corpus.join("broken.pdf"), b"not a pdf").unwrap();
    std::fs::write(corpus.join("notes.txt"), QUICK_FOX).unwrap();

    let reports = run_scan(&app_config(main, corpus)).unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].filename, "copy.pdf");
    let result = &reports[0].results[0];
    assert_eq!((result.main_page, result.other_page), (1, 2));
}

#[test]
fn test_run_scan_fails_loudly_on_unreadable_main_document() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("main.pdf");
    std::fs::write(&main, b"garbage").unwrap();

    let err = run_scan(&app_config(main, dir.path().to_path_buf())).unwrap_err();
    assert!(matches!(err, ScanError::MainDocument { .. }), "got {err:?}");
}

#[test]
fn test_run_scan_requires_paths() {
    let err = run_scan(&AppConfig::default()).unwrap_err();
    assert!(matches!(err, ScanError::Config(_)));
}
