// lopdf helper - Pure Rust access to the embedded text layer
use lopdf::Document;
use tracing::debug;

use crate::types::{Result, ScribeError};

/// Opens a PDF container for text-layer access.
pub trait TextLayerReader {
    fn open(&self, pdf: &[u8]) -> Result<Box<dyn TextLayer>>;
}

/// A parsed PDF exposing per-page embedded text.
pub trait TextLayer {
    fn page_count(&self) -> usize;

    /// Embedded text of a 0-based page, `None` when absent or unreadable.
    fn page_text(&self, index: usize) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfReader;

impl TextLayerReader for LopdfReader {
    fn open(&self, pdf: &[u8]) -> Result<Box<dyn TextLayer>> {
        let document =
            Document::load_mem(pdf).map_err(|e| ScribeError::DocumentCorrupt(e.to_string()))?;
        let page_numbers = document.get_pages().keys().copied().collect();
        Ok(Box::new(LopdfTextLayer {
            document,
            page_numbers,
        }))
    }
}

struct LopdfTextLayer {
    document: Document,
    // lopdf page numbers are 1-based and sorted
    page_numbers: Vec<u32>,
}

impl TextLayer for LopdfTextLayer {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Option<String> {
        let number = *self.page_numbers.get(index)?;
        match self.document.extract_text(&[number]) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(page = index, error = %e, "no readable text layer");
                None
            }
        }
    }
}

/// Page count of a PDF container.
pub fn page_count(pdf: &[u8]) -> Result<usize> {
    Ok(LopdfReader.open(pdf)?.page_count())
}
