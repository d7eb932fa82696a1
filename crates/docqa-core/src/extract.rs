//! PDF text extraction. Pages are concatenated in order with no separator.

use tracing::debug;

use crate::documents::Document;

/// All text extracted in one processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawText {
    pub text: String,
    pub documents: usize,
    pub pages: usize,
}

impl RawText {
    /// Wraps text that did not come from a PDF (one document, one page).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            documents: 1,
            pages: 1,
        }
    }
}

/// Extracts the text of every page of every document, in order.
///
/// A page with no extractable text (e.g. a scanned image) contributes nothing.
/// A document that is not a valid PDF fails the whole extraction.
pub fn extract_text(docs: &[Document]) -> Result<RawText, ExtractError> {
    extract_with(docs, extract_pages)
}

/// Per-page text of one PDF.
pub fn extract_pages(doc: &Document) -> Result<Vec<String>, ExtractError> {
    pdf_extract::extract_text_from_mem_by_pages(&doc.bytes).map_err(|e| ExtractError::Pdf {
        name: doc.name.clone(),
        message: e.to_string(),
    })
}

fn extract_with(
    docs: &[Document],
    pages_of: impl Fn(&Document) -> Result<Vec<String>, ExtractError>,
) -> Result<RawText, ExtractError> {
    let mut raw = RawText::default();
    for doc in docs {
        let pages = pages_of(doc)?;
        for (i, page) in pages.iter().enumerate() {
            if page.trim().is_empty() {
                debug!(document = %doc.name, page = i + 1, "page has no extractable text");
            }
            raw.text.push_str(page);
        }
        debug!(document = %doc.name, pages = pages.len(), "extracted document");
        raw.pages += pages.len();
        raw.documents += 1;
    }
    Ok(raw)
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to extract text from {name}: {message}")]
    Pdf { name: String, message: String },
}
