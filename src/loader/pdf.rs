/// PDF text extraction, one document per page.
use std::path::Path;

use lopdf::Document as PdfDocument;
use tracing::debug;

use super::{Document, DocumentMetadata, LoadError};

pub fn load(path: &Path, source: &str) -> Result<Vec<Document>, LoadError> {
    let pdf = PdfDocument::load(path).map_err(|e| LoadError::Pdf(e.to_string()))?;

    let pages = pdf.get_pages();
    let mut docs = Vec::with_capacity(pages.len());

    for &page_number in pages.keys() {
        let text = pdf
            .extract_text(&[page_number])
            .map_err(|e| LoadError::Pdf(format!("page {page_number}: {e}")))?;
        let text = clean_page_text(&text);

        docs.push(Document::new(
            text,
            DocumentMetadata::new(source).with_page(page_number),
        ));
    }

    debug!("Extracted {} page(s) from {source}", docs.len());
    Ok(docs)
}

/// Drop NUL bytes and trailing whitespace left behind by text operators.
fn clean_page_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
