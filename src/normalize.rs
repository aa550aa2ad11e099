use once_cell::sync::Lazy;
use regex::Regex;

// Short all-caps lines between two newlines; running headers and footers.
static HEADER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[A-Z\s]{2,}\n").expect("valid header regex"));

static NON_WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("valid non-word regex"));

/// Normalizes raw page text for comparison.
///
/// Header/footer lines written entirely in capitals are collapsed to a space,
/// the text is lowercased, and every run of non-word characters becomes a
/// single space. The output contains no line breaks, so applying it twice
/// gives the same result as applying it once.
pub fn normalize(raw_text: &str) -> String {
    let without_headers = HEADER_LINE.replace_all(raw_text, " ");
    let lowered = without_headers.to_lowercase();
    NON_WORD_RUN.replace_all(&lowered, " ").into_owned()
}

/// True when the text has nothing but whitespace.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
