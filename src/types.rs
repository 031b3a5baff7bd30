// Core types for pdfscribe
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Separator placed between page texts when a result is flattened.
pub const PAGE_SEPARATOR: &str = "\n\n";

// Error types
#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    #[error("PDF container could not be parsed: {0}")]
    DocumentCorrupt(String),

    #[error("document was already read; rewind it before a second pass")]
    DocumentConsumed,

    #[error("recognition failed on page {page}: {reason}")]
    PageRecognitionFailed { page: usize, reason: String },

    #[error("OCR engine unavailable: {0}")]
    OcrEngineUnavailable(String),

    #[error("failed to emit document: {0}")]
    Emit(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, ScribeError>;

/// PDF bytes with a read cursor.
///
/// Extractors consume the document when they read it. A second pass over the
/// same document needs an explicit [`Document::rewind`]; reading a consumed
/// document yields [`ScribeError::DocumentConsumed`].
#[derive(Debug, Clone)]
pub struct Document<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Document<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Take the unread bytes and move the cursor to the end.
    pub fn read_all(&mut self) -> Result<&'a [u8]> {
        let bytes: &'a [u8] = *self.cursor.get_ref();
        if self.is_consumed() {
            return Err(ScribeError::DocumentConsumed);
        }
        let start = self.cursor.position() as usize;
        self.cursor.set_position(bytes.len() as u64);
        Ok(&bytes[start..])
    }

    pub fn rewind(&mut self) {
        self.cursor.set_position(0);
    }

    /// True once the bytes were read; an empty document is never consumed.
    pub fn is_consumed(&self) -> bool {
        !self.is_empty() && self.cursor.position() >= self.len() as u64
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionPolicy {
    DirectOnly,
    OcrOnly,
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrQuality {
    Low,
    #[default]
    Medium,
    High,
}

/// Page segmentation mode for "a single uniform block of text".
pub const PSM_SINGLE_BLOCK: u8 = 6;

impl OcrQuality {
    pub fn dpi(self) -> u32 {
        match self {
            OcrQuality::Low => 150,
            OcrQuality::Medium => 300,
            OcrQuality::High => 400,
        }
    }

    pub fn page_segmentation_mode(self) -> u8 {
        PSM_SINGLE_BLOCK
    }
}

/// Which extraction method produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Direct,
    Ocr,
    /// OCR ran because a direct-only extraction came back completely empty.
    OcrRescue,
    /// OCR was cancelled; only the pages before the cancellation are present.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub pages: Vec<String>,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    pub fn new(pages: Vec<String>, provenance: Provenance) -> Self {
        Self {
            pages,
            provenance,
            warnings: Vec::new(),
        }
    }

    pub fn empty(provenance: Provenance) -> Self {
        Self::new(Vec::new(), provenance)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }

    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|page| count_words(page)).sum()
    }

    /// No page carries a non-whitespace character.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|page| page.trim().is_empty())
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Receives OCR progress: 1-based page just finished, total pages, optional note.
pub trait ProgressObserver {
    fn on_progress(&self, current_page: usize, total_pages: usize, note: Option<&str>);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize, Option<&str>),
{
    fn on_progress(&self, current_page: usize, total_pages: usize, note: Option<&str>) {
        self(current_page, total_pages, note)
    }
}

/// Cooperative cancellation flag, checked between OCR pages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
