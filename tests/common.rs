#![allow(dead_code)]

use pagescan::config::DEFAULT_SKIP_COUNT;
use pagescan::Document;

/// Builds a document from `(raw_page_number, text)` pairs with the default skip.
pub fn document(name: &str, pages: &[(u32, &str)]) -> Document {
    Document::from_raw_pages(
        name,
        pages.iter().map(|(n, text)| (*n, text.to_string())),
        DEFAULT_SKIP_COUNT,
    )
}

/// Eight filler pages with vocabulary private to `tag`, then `text` on page 9.
pub fn document_with_page_nine(name: &str, tag: &str, text: &str) -> Document {
    let filler: Vec<String> = (1..=8).map(|n| format!("{tag}page{n} {tag}filler{n}")).collect();
    let mut pages: Vec<(u32, &str)> = filler
        .iter()
        .enumerate()
        .map(|(i, t)| (i as u32 + 1, t.as_str()))
        .collect();
    pages.push((9, text));
    document(name, &pages)
}
