//! Text extraction for uploaded reports.
//!
//! `.txt` files are decoded as UTF-8 with invalid bytes dropped. `.pdf` files are read page by
//! page with `pdf-extract`; pages without a text layer are handed to an
//! [`OcrEngine`]. PDF work is CPU-bound and runs on the blocking pool.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Empty PDF file.")]
    EmptyPdf,
    #[error("No text extracted from PDF.")]
    NoText,
    #[error("Unsupported file type. Use .txt or .pdf")]
    Unsupported,
    #[error("PDF extraction error: {0}")]
    Extraction(String),
    #[error("OCR error: {0}")]
    Ocr(String),
}

/// Per-page PDF text extraction.
pub trait PdfExtractor: Send + Sync {
    /// Text of every page, in page order. Pages without a text layer yield
    /// an empty string.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, UploadError>;
}

/// Fallback recognition for pages without a text layer.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize the text of the zero-based `page_index` of `pdf_bytes`.
    fn recognize_page(&self, pdf_bytes: &[u8], page_index: usize) -> Result<String, UploadError>;
}

/// PDF text extractor backed by the `pdf-extract` crate.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, UploadError> {
        pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| UploadError::Extraction(e.to_string()))
    }
}

/// OCR engine that recognizes nothing. Scanned pages are skipped.
pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn name(&self) -> &str {
        "none"
    }

    fn recognize_page(&self, _pdf_bytes: &[u8], _page_index: usize) -> Result<String, UploadError> {
        Ok(String::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadKind {
    Text,
    Pdf,
}

fn upload_kind(filename: &str) -> Option<UploadKind> {
    let lower = filename.trim().to_lowercase();
    if lower.ends_with(".txt") {
        Some(UploadKind::Text)
    } else if lower.ends_with(".pdf") {
        Some(UploadKind::Pdf)
    } else {
        None
    }
}

/// Turns an uploaded file into raw triage text.
#[derive(Clone)]
pub struct UploadExtractor {
    pdf: Arc<dyn PdfExtractor>,
    ocr: Arc<dyn OcrEngine>,
}

impl Default for UploadExtractor {
    fn default() -> Self {
        Self::new(Arc::new(PdfTextExtractor), Arc::new(NoOcr))
    }
}

impl UploadExtractor {
    pub fn new(pdf: Arc<dyn PdfExtractor>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { pdf, ocr }
    }

    /// Name of the OCR engine used for pages without a text layer.
    pub fn ocr_name(&self) -> &str {
        self.ocr.name()
    }

    /// Extract text from `bytes`, dispatching on the extension of `filename`.
    pub async fn extract(&self, filename: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
        match upload_kind(filename).ok_or(UploadError::Unsupported)? {
            UploadKind::Text => Ok(decode_text(&bytes)),
            UploadKind::Pdf => {
                if bytes.is_empty() {
                    return Err(UploadError::EmptyPdf);
                }
                let pdf = self.pdf.clone();
                let ocr = self.ocr.clone();
                let text = tokio::task::spawn_blocking(move || {
                    pdf_text(pdf.as_ref(), ocr.as_ref(), &bytes)
                })
                .await
                .map_err(|e| UploadError::Extraction(e.to_string()))??;

                if text.trim().is_empty() {
                    return Err(UploadError::NoText);
                }
                Ok(text)
            }
        }
    }
}

/// UTF-8 decode that skips invalid byte sequences instead of replacing them.
fn decode_text(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Join non-empty page texts with blank lines, asking OCR for empty pages.
fn pdf_text(
    pdf: &dyn PdfExtractor,
    ocr: &dyn OcrEngine,
    bytes: &[u8],
) -> Result<String, UploadError> {
    let pages = pdf.extract_pages(bytes)?;
    let page_count = pages.len();

    let mut texts = Vec::with_capacity(page_count);
    for (index, page) in pages.into_iter().enumerate() {
        let page = page.trim();
        if !page.is_empty() {
            texts.push(page.to_string());
            continue;
        }

        let recognized = ocr.recognize_page(bytes, index)?;
        let recognized = recognized.trim();
        if recognized.is_empty() {
            warn!(page = index + 1, "page has no text layer and OCR found nothing");
        } else {
            texts.push(recognized.to_string());
        }
    }

    debug!(page_count, text_pages = texts.len(), "extracted PDF text");
    Ok(texts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePdf(Vec<&'static str>);

    impl PdfExtractor for FakePdf {
        fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, UploadError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FakeOcr;

    impl OcrEngine for FakeOcr {
        fn name(&self) -> &str {
            "fake"
        }

        fn recognize_page(&self, _pdf_bytes: &[u8], page_index: usize) -> Result<String, UploadError> {
            Ok(format!("  scanned page {}  ", page_index + 1))
        }
    }

    fn extractor(pages: Vec<&'static str>, ocr: Arc<dyn OcrEngine>) -> UploadExtractor {
        UploadExtractor::new(Arc::new(FakePdf(pages)), ocr)
    }

    #[tokio::test]
    async fn text_files_drop_invalid_utf8() {
        let text = UploadExtractor::default()
            .extract("Notes.TXT", b"fever \xff\xfe and cough".to_vec())
            .await
            .unwrap();
        assert_eq!(text, "fever  and cough");

        let text = UploadExtractor::default()
            .extract("r.txt", "fièvre \u{fffd} toux".as_bytes().to_vec())
            .await
            .unwrap();
        assert_eq!(text, "fièvre \u{fffd} toux");
    }

    #[test]
    fn default_extractor_has_no_ocr() {
        assert_eq!(UploadExtractor::default().ocr_name(), "none");
        assert_eq!(extractor(vec![], Arc::new(FakeOcr)).ocr_name(), "fake");
    }

    #[tokio::test]
    async fn empty_pdf_is_rejected() {
        let err = UploadExtractor::default().extract("scan.pdf", Vec::new()).await.unwrap_err();
        assert_eq!(err, UploadError::EmptyPdf);
        assert_eq!(err.to_string(), "Empty PDF file.");
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let err = UploadExtractor::default().extract("image.png", vec![1, 2]).await.unwrap_err();
        assert_eq!(err, UploadError::Unsupported);
    }

    #[tokio::test]
    async fn pages_are_joined_with_blank_lines() {
        let text = extractor(vec![" page one ", "", "page three"], Arc::new(NoOcr))
            .extract("r.pdf", vec![1])
            .await
            .unwrap();
        assert_eq!(text, "page one\n\npage three");
    }

    #[tokio::test]
    async fn ocr_fills_pages_without_text_layer() {
        let text = extractor(vec!["page one", "   "], Arc::new(FakeOcr))
            .extract("r.pdf", vec![1])
            .await
            .unwrap();
        assert_eq!(text, "page one\n\nscanned page 2");
    }

    #[tokio::test]
    async fn all_blank_pages_yield_no_text_error() {
        let err = extractor(vec!["", " "], Arc::new(NoOcr))
            .extract("r.pdf", vec![1])
            .await
            .unwrap_err();
        assert_eq!(err, UploadError::NoText);
    }

    #[tokio::test]
    async fn garbage_pdf_bytes_are_an_extraction_error() {
        let err = UploadExtractor::default()
            .extract("r.pdf", b"not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Extraction(_)));
    }
}
