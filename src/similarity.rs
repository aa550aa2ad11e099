//! Pairwise TF-IDF cosine similarity.
//!
//! Every call builds a fresh two-document vector space from just the two
//! spans being compared, so a score never depends on the rest of the corpus.
//! Weighting follows the usual vectorizer defaults: raw term counts, smoothed
//! idf `ln((1 + n) / (1 + df)) + 1`, and L2-normalized vectors.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::VectorizeError;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

/// Number of documents in a pairwise corpus.
const CORPUS_SIZE: f64 = 2.0;

type TermCounts<'a> = HashMap<&'a str, f64>;

fn term_counts(text: &str) -> TermCounts<'_> {
    let mut counts = HashMap::new();
    for token in TOKEN.find_iter(text) {
        *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

fn smoothed_idf(document_frequency: f64) -> f64 {
    ((1.0 + CORPUS_SIZE) / (1.0 + document_frequency)).ln() + 1.0
}

/// Scores two spans, reporting a degenerate vocabulary as an error.
pub fn try_score(text_a: &str, text_b: &str) -> Result<f64, VectorizeError> {
    let lower_a = text_a.to_lowercase();
    let lower_b = text_b.to_lowercase();
    let counts_a = term_counts(&lower_a);
    let counts_b = term_counts(&lower_b);

    if counts_a.is_empty() && counts_b.is_empty() {
        return Err(VectorizeError::EmptyVocabulary);
    }

    let weight = |term: &str, count: f64| {
        let df = f64::from(
            u8::from(counts_a.contains_key(term)) + u8::from(counts_b.contains_key(term)),
        );
        count * smoothed_idf(df)
    };

    let weights_a: HashMap<&str, f64> =
        counts_a.iter().map(|(t, c)| (*t, weight(*t, *c))).collect();
    let weights_b: HashMap<&str, f64> =
        counts_b.iter().map(|(t, c)| (*t, weight(*t, *c))).collect();

    let norm_a = weights_a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = weights_b.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    let dot: f64 = weights_a
        .iter()
        .filter_map(|(term, wa)| weights_b.get(term).map(|wb| wa * wb))
        .sum();

    Ok((dot / (norm_a * norm_b)).clamp(0.0, 1.0))
}

/// Cosine similarity of the pairwise TF-IDF vectors of two spans, in `[0, 1]`.
///
/// Spans without usable vocabulary score `0.0`.
pub fn score(text_a: &str, text_b: &str) -> f64 {
    try_score(text_a, text_b).unwrap_or(0.0)
}
