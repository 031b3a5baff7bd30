// Direct extraction - read the embedded text layer page by page
use tracing::debug;

use super::lopdf_helper::{LopdfReader, TextLayerReader};
use crate::types::{Document, ExtractionResult, Provenance, Result};

pub struct DirectExtractor {
    reader: Box<dyn TextLayerReader>,
}

impl Default for DirectExtractor {
    fn default() -> Self {
        Self::new(Box::new(LopdfReader))
    }
}

impl DirectExtractor {
    pub fn new(reader: Box<dyn TextLayerReader>) -> Self {
        Self { reader }
    }

    /// Read every page's text layer in order.
    ///
    /// Pages without text contribute an empty string; only an unreadable
    /// container fails, with `DocumentCorrupt`.
    pub fn extract(&self, document: &mut Document<'_>) -> Result<ExtractionResult> {
        let bytes = document.read_all()?;
        let layer = self.reader.open(bytes)?;
        let total = layer.page_count();

        let pages: Vec<String> = (0..total)
            .map(|index| layer.page_text(index).unwrap_or_default())
            .collect();

        let result = ExtractionResult::new(pages, Provenance::Direct);
        debug!(pages = total, words = result.word_count(), "direct extraction done");
        Ok(result)
    }
}
