//! PDF text extraction.
//!
//! Wraps the pdf-extract crate behind a trait so the pipeline can be
//! tested without real PDF bytes. Handles the usual failure modes:
//! corrupted files, encrypted PDFs, and scanned/image-only PDFs that
//! yield no text.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::debug;

use crate::pipeline::types::ExtractedDocument;

/// Turns raw attachment bytes into plain text.
///
/// Never errors past this boundary: all failure is an
/// `ExtractedDocument::Unreadable` so callers can route to rejection
/// logging instead of aborting the batch.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> ExtractedDocument;
}

/// Real extractor backed by the pdf-extract crate.
#[derive(Debug, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> ExtractedDocument {
        // pdf-extract panics on some malformed inputs; an unreadable
        // attachment must not take down the batch.
        let extracted = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }));

        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return ExtractedDocument::Unreadable(format!("failed to parse PDF: {e}"));
            }
            Err(_) => {
                return ExtractedDocument::Unreadable("PDF parser aborted on malformed input".into());
            }
        };

        let normalized = normalize_whitespace(&text);
        if normalized.is_empty() {
            // Scanned or image-only PDFs parse fine but carry no text layer.
            return ExtractedDocument::Unreadable("no extractable text (scanned PDF?)".into());
        }

        debug!(chars = normalized.len(), "Extracted PDF text");
        ExtractedDocument::Text(normalized)
    }
}

/// Collapse runs of whitespace (including page breaks) to single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
