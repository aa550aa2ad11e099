use std::fmt;

use serde::Serialize;

use crate::normalize::{is_blank, normalize};

/// Page number reported for a raw 1-based page once `skip_count` leading pages
/// are set aside. With a skip of 7, raw page 9 is reported as page 1.
pub fn corrected_page_number(raw_page: u32, skip_count: u32) -> i64 {
    i64::from(raw_page) - i64::from(skip_count) - 1
}

/// One extracted page, keeping its original 1-based number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub number: u32,
    pub raw_text: String,
    pub normalized_text: String,
}

impl Page {
    pub fn new(number: u32, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let normalized_text = normalize(&raw_text);
        Page {
            number,
            raw_text,
            normalized_text,
        }
    }

    pub fn is_blank(&self) -> bool {
        is_blank(&self.normalized_text)
    }
}

/// The comparable pages of one file. Pages inside the skipped leading run are
/// dropped on construction; the remaining ones keep their raw numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub name: String,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(name: impl Into<String>, pages: Vec<Page>) -> Self {
        Document {
            name: name.into(),
            pages,
        }
    }

    /// Builds a document from extractor output, dropping pages numbered
    /// `skip_count` or lower and normalizing the rest.
    pub fn from_raw_pages<I, S>(name: impl Into<String>, pages: I, skip_count: u32) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        let pages = pages
            .into_iter()
            .filter(|(number, _)| *number > skip_count)
            .map(|(number, text)| Page::new(number, text))
            .collect();
        Document::new(name, pages)
    }

    /// Pages with something left to compare after normalization.
    pub fn comparable_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|page| !page.is_blank())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} pages)", self.name, self.pages.len())
    }
}
