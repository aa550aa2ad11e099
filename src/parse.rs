use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lopdf::content::Operation;
use lopdf::{Document, Encoding, Object, ObjectId, Result as LopdfResult};
use tracing::{debug, trace, warn};

use crate::error::ExtractionError;
use crate::logging::PDF_PARSING;

/// Horizontal adjustment in a `TJ` array, in thousandths of an em, beyond
/// which the gap is read as a word break.
const WORD_GAP_THRESHOLD: f32 = 250.0;

/// Opens a PDF file. An unreadable or corrupt file is reported as an
/// [`ExtractionError`].
pub fn load_pdf<P: AsRef<Path>>(path: P) -> Result<Document, ExtractionError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Document::load_mem(&bytes).map_err(|source| ExtractionError::Pdf {
        path: path.to_path_buf(),
        source,
    })
}

/// Extracts the text of every page of a PDF file as `(page_number, text)`
/// pairs, numbered from 1 in page order.
pub fn extract_text_by_page<P: AsRef<Path>>(path: P) -> Result<Vec<(u32, String)>, ExtractionError> {
    let path = path.as_ref();
    let doc = load_pdf(path)?;
    let pages = get_pages_text(&doc);
    if pages.is_empty() {
        return Err(ExtractionError::NoPages {
            path: path.to_path_buf(),
        });
    }
    debug!(target: PDF_PARSING, path = %path.display(), pages = pages.len(), "extracted text");
    Ok(pages)
}

/// Text of every page of a loaded document. A page whose content stream
/// cannot be decoded comes back empty so the rest of the document is kept.
pub fn get_pages_text(doc: &Document) -> Vec<(u32, String)> {
    doc.get_pages()
        .into_iter()
        .map(|(page_num, page_id)| {
            let text = page_text(doc, page_id).unwrap_or_else(|e| {
                warn!(target: PDF_PARSING, page = page_num, error = %e, "failed to decode page");
                String::new()
            });
            (page_num, text)
        })
        .collect()
}

fn page_text(doc: &Document, page_id: ObjectId) -> LopdfResult<String> {
    let content = doc.get_and_decode_page_content(page_id)?;
    let fonts = doc.get_page_fonts(page_id)?;

    let encodings: BTreeMap<Vec<u8>, Encoding> = fonts
        .iter()
        .filter_map(|(name, font)| match font.get_font_encoding(doc) {
            Ok(encoding) => Some((name.clone(), encoding)),
            Err(e) => {
                warn!(
                    target: PDF_PARSING,
                    font = %String::from_utf8_lossy(name),
                    error = %e,
                    "unsupported font encoding"
                );
                None
            }
        })
        .collect();

    let mut writer = PageTextWriter::new(&encodings);
    for op in &content.operations {
        writer.handle_operator(op)?;
    }
    Ok(writer.finish())
}

/// Accumulates the text shown by a page's content stream, starting a new line
/// whenever the text position moves vertically.
struct PageTextWriter<'a> {
    encodings: &'a BTreeMap<Vec<u8>, Encoding<'a>>,
    current_encoding: Option<&'a Encoding<'a>>,
    line_y: Option<f32>,
    text: String,
}

impl<'a> PageTextWriter<'a> {
    fn new(encodings: &'a BTreeMap<Vec<u8>, Encoding<'a>>) -> Self {
        PageTextWriter {
            encodings,
            current_encoding: None,
            line_y: None,
            text: String::new(),
        }
    }

    fn handle_operator(&mut self, op: &Operation) -> LopdfResult<()> {
        match op.operator.as_ref() {
            "BT" => self.line_y = None,
            "Tf" => {
                if let Some(Object::Name(font_name)) = op.operands.first() {
                    self.current_encoding = self.encodings.get(font_name);
                }
            }
            "Td" | "TD" => {
                let ty = op.operands.get(1).map(operand_as_float).unwrap_or(0.0);
                if ty != 0.0 {
                    self.new_line();
                }
            }
            "Tm" => {
                let y = op.operands.get(5).map(operand_as_float);
                if self.line_y.is_some() && y != self.line_y {
                    self.new_line();
                }
                self.line_y = y;
            }
            "T*" => self.new_line(),
            "Tj" | "TJ" => self.show_text(&op.operands)?,
            "'" => {
                self.new_line();
                self.show_text(&op.operands)?;
            }
            "\"" => {
                // Word and character spacing come first.
                self.new_line();
                self.show_text(op.operands.get(2..).unwrap_or_default())?;
            }
            _ => {}
        }
        Ok(())
    }

    fn show_text(&mut self, operands: &[Object]) -> LopdfResult<()> {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    let decoded = match self.current_encoding {
                        Some(encoding) => Document::decode_text(encoding, bytes)?,
                        None => bytes.iter().map(|&b| char::from(b)).collect(),
                    };
                    trace!(target: PDF_PARSING, text = %decoded, "text run");
                    self.text.push_str(&decoded);
                }
                Object::Integer(_) | Object::Real(_) => {
                    if -operand_as_float(operand) >= WORD_GAP_THRESHOLD {
                        self.push_space();
                    }
                }
                Object::Array(items) => self.show_text(items)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn push_space(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
    }

    fn new_line(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    fn finish(mut self) -> String {
        if self.text.ends_with('\n') {
            self.text.pop();
        }
        self.text
    }
}

fn operand_as_float(obj: &Object) -> f32 {
    match obj {
        Object::Integer(i) => *i as f32,
        Object::Real(f) => *f,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(list: Vec<Operation>) -> String {
        let encodings = BTreeMap::new();
        let mut writer = PageTextWriter::new(&encodings);
        for op in &list {
            writer.handle_operator(op).unwrap();
        }
        writer.finish()
    }

    #[test]
    fn test_vertical_moves_start_new_lines() {
        let text = ops(vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal("First line")]),
            Operation::new("Td", vec![0.into(), (-14).into()]),
            Operation::new("Tj", vec![Object::string_literal("Second line")]),
            Operation::new("Td", vec![40.into(), 0.into()]),
            Operation::new("Tj", vec![Object::string_literal(" continued")]),
            Operation::new("ET", vec![]),
        ]);
        assert_eq!(text, "First line\nSecond line continued");
    }

    #[test]
    fn test_tj_gaps_become_spaces() {
        let text = ops(vec![Operation::new(
            "TJ",
            vec![Object::Array(vec![
                Object::string_literal("Hello"),
                Object::Integer(-300),
                Object::string_literal("world"),
                Object::Integer(-20),
                Object::string_literal("!"),
            ])],
        )]);
        assert_eq!(text, "Hello world!");
    }

    #[test]
    fn test_quote_operator_moves_to_next_line() {
        let text = ops(vec![
            Operation::new("Tj", vec![Object::string_literal("one")]),
            Operation::new("'", vec![Object::string_literal("two")]),
        ]);
        assert_eq!(text, "one\ntwo");
    }

    #[test]
    fn test_load_pdf_reports_missing_file() {
        let err = load_pdf("does/not/exist.pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Io { .. }));
    }
}
