// OCR extraction - rasterize, sanitize and recognize every page
use tracing::{debug, info, warn};

use super::image_sanitizer;
use super::ocr_engine::{Recognizer, TesseractRecognizer};
use crate::config::OcrConfig;
use crate::system_pdf_renderer::{PdftoppmRasterizer, RasterDocument, Rasterizer};
use crate::types::{
    CancelToken, Document, ExtractionResult, OcrQuality, ProgressObserver, Provenance, Result,
    ScribeError,
};

/// Outcome of recognizing a single page.
pub type PageOutcome = std::result::Result<String, ScribeError>;

/// Per-page outcomes of one OCR pass, in page order.
#[derive(Debug)]
pub struct OcrRun {
    pub pages: Vec<PageOutcome>,
    pub total_pages: usize,
    pub cancelled: bool,
}

impl OcrRun {
    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|page| page.is_err()).count()
    }

    /// Failed pages become empty strings; a cancelled run is `Partial`.
    pub fn into_result(self) -> ExtractionResult {
        let provenance = if self.cancelled {
            Provenance::Partial
        } else {
            Provenance::Ocr
        };
        let mut warnings = Vec::new();
        let pages: Vec<String> = self
            .pages
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|e| {
                    warnings.push(e.to_string());
                    String::new()
                })
            })
            .collect();
        if self.cancelled {
            warnings.push(format!(
                "OCR cancelled after {} of {} pages",
                pages.len(),
                self.total_pages
            ));
        }
        ExtractionResult {
            pages,
            provenance,
            warnings,
        }
    }
}

pub struct OcrExtractor {
    rasterizer: Box<dyn Rasterizer>,
    recognizer: Box<dyn Recognizer>,
    languages: Vec<String>,
}

impl OcrExtractor {
    pub fn new(
        rasterizer: Box<dyn Rasterizer>,
        recognizer: Box<dyn Recognizer>,
        languages: Vec<String>,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            languages,
        }
    }

    /// pdftoppm + tesseract at the configured executable paths.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            Box::new(PdftoppmRasterizer::new(&config.pdftoppm_path)),
            Box::new(TesseractRecognizer::new(&config.tesseract_path)),
            config.languages.clone(),
        )
    }

    /// Recognize every page in order.
    ///
    /// Page failures are kept as `Err` entries and reported to the observer;
    /// only an engine that cannot run at all aborts the pass. The cancel
    /// token is checked before each page.
    pub fn extract(
        &self,
        document: &mut Document<'_>,
        quality: OcrQuality,
        observer: Option<&dyn ProgressObserver>,
        cancel: Option<&CancelToken>,
    ) -> Result<OcrRun> {
        let bytes = document.read_all()?;
        let raster = self.rasterizer.open(bytes)?;
        let total_pages = raster.page_count();

        let mut run = OcrRun {
            pages: Vec::with_capacity(total_pages),
            total_pages,
            cancelled: false,
        };
        if total_pages == 0 {
            return Ok(run);
        }
        self.recognizer.check_available()?;

        let dpi = quality.dpi();
        let psm = quality.page_segmentation_mode();
        info!(pages = total_pages, dpi, psm, "starting OCR");

        for index in 0..total_pages {
            if cancel.is_some_and(|token| token.is_cancelled()) {
                info!(done = index, total = total_pages, "OCR cancelled");
                run.cancelled = true;
                break;
            }

            let outcome = match self.recognize_page(raster.as_ref(), index, dpi, psm) {
                Err(ScribeError::OcrEngineUnavailable(reason)) => {
                    return Err(ScribeError::OcrEngineUnavailable(reason));
                }
                Err(ScribeError::PageRecognitionFailed { reason, .. }) => {
                    Err(ScribeError::PageRecognitionFailed { page: index, reason })
                }
                Err(other) => Err(ScribeError::PageRecognitionFailed {
                    page: index,
                    reason: other.to_string(),
                }),
                Ok(text) => Ok(text),
            };

            let note = match &outcome {
                Ok(text) => {
                    debug!(page = index, chars = text.len(), "page recognized");
                    None
                }
                Err(e) => {
                    warn!(page = index, error = %e, "page recognition failed");
                    Some(e.to_string())
                }
            };
            if let Some(observer) = observer {
                observer.on_progress(index + 1, total_pages, note.as_deref());
            }
            run.pages.push(outcome);
        }

        Ok(run)
    }

    fn recognize_page(
        &self,
        raster: &dyn RasterDocument,
        index: usize,
        dpi: u32,
        psm: u8,
    ) -> Result<String> {
        let bitmap = raster.render(index, dpi)?;
        let cleaned = image_sanitizer::sanitize(&bitmap);
        self.recognizer.recognize(&cleaned, &self.languages, psm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_pages_keep_their_slot() {
        let run = OcrRun {
            pages: vec![
                Ok("first".to_string()),
                Err(ScribeError::PageRecognitionFailed {
                    page: 1,
                    reason: "blurry".into(),
                }),
                Ok("third".to_string()),
            ],
            total_pages: 3,
            cancelled: false,
        };
        assert_eq!(run.failed_pages(), 1);

        let result = run.into_result();
        assert_eq!(result.pages, vec!["first", "", "third"]);
        assert_eq!(result.provenance, Provenance::Ocr);
        assert_eq!(result.warnings, vec!["recognition failed on page 1: blurry"]);
    }

    #[test]
    fn cancelled_run_is_partial() {
        let run = OcrRun {
            pages: vec![Ok("one".to_string())],
            total_pages: 4,
            cancelled: true,
        };
        let result = run.into_result();
        assert_eq!(result.provenance, Provenance::Partial);
        assert_eq!(result.page_count(), 1);
        assert_eq!(result.warnings, vec!["OCR cancelled after 1 of 4 pages"]);
    }
}
