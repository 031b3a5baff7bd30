// Extraction router - picks direct and/or OCR extraction per policy and
// reconciles the two when both ran.
use tracing::{info, warn};

use super::direct_extraction::DirectExtractor;
use super::ocr_extraction::OcrExtractor;
use crate::config::{ExtractionSettings, ReconcileStrategy, ScribeConfig};
use crate::types::{
    CancelToken, Document, ExtractionPolicy, ExtractionResult, OcrQuality, ProgressObserver,
    Provenance, Result, ScribeError,
};

/// Observer note sent when `Auto` falls back to OCR.
pub const INCOMPLETE_DIRECT_NOTE: &str = "Direct text looks incomplete, applying OCR...";
/// Observer note sent when a direct-only extraction is rescued by OCR.
pub const EMPTY_DIRECT_NOTE: &str = "No embedded text found, applying OCR...";

pub struct ExtractionRouter {
    direct: DirectExtractor,
    ocr: OcrExtractor,
    settings: ExtractionSettings,
}

impl ExtractionRouter {
    pub fn new(direct: DirectExtractor, ocr: OcrExtractor, settings: ExtractionSettings) -> Self {
        Self {
            direct,
            ocr,
            settings,
        }
    }

    /// lopdf for the text layer, pdftoppm + tesseract for OCR.
    pub fn from_config(config: &ScribeConfig) -> Self {
        Self::new(
            DirectExtractor::default(),
            OcrExtractor::from_config(&config.ocr),
            config.extraction,
        )
    }

    pub fn extract(
        &self,
        document: &mut Document<'_>,
        policy: ExtractionPolicy,
        quality: OcrQuality,
        observer: Option<&dyn ProgressObserver>,
        cancel: Option<&CancelToken>,
    ) -> Result<ExtractionResult> {
        info!(?policy, ?quality, bytes = document.len(), "extracting");
        match policy {
            ExtractionPolicy::OcrOnly => self.run_ocr(document, quality, observer, cancel),
            ExtractionPolicy::DirectOnly => {
                self.extract_direct_only(document, quality, observer, cancel)
            }
            ExtractionPolicy::Auto => self.extract_auto(document, quality, observer, cancel),
        }
    }

    fn run_ocr(
        &self,
        document: &mut Document<'_>,
        quality: OcrQuality,
        observer: Option<&dyn ProgressObserver>,
        cancel: Option<&CancelToken>,
    ) -> Result<ExtractionResult> {
        let run = self.ocr.extract(document, quality, observer, cancel)?;
        if run.failed_pages() > 0 {
            warn!(failed = run.failed_pages(), total = run.total_pages, "OCR finished with failed pages");
        }
        Ok(run.into_result())
    }

    fn extract_direct_only(
        &self,
        document: &mut Document<'_>,
        quality: OcrQuality,
        observer: Option<&dyn ProgressObserver>,
        cancel: Option<&CancelToken>,
    ) -> Result<ExtractionResult> {
        let direct = self.direct.extract(document)?;
        let rescue =
            self.settings.direct_only_rescue && direct.page_count() > 0 && direct.is_blank();
        if !rescue {
            return Ok(direct);
        }

        info!(pages = direct.page_count(), "direct text empty, rescuing with OCR");
        if let Some(observer) = observer {
            observer.on_progress(0, direct.page_count(), Some(EMPTY_DIRECT_NOTE));
        }
        document.rewind();
        match self.run_ocr(document, quality, observer, cancel) {
            Ok(mut ocr) => {
                if ocr.provenance == Provenance::Ocr {
                    ocr.provenance = Provenance::OcrRescue;
                }
                Ok(ocr)
            }
            Err(ScribeError::OcrEngineUnavailable(reason)) => Ok(keep_direct(direct, reason)),
            Err(e) => Err(e),
        }
    }

    fn extract_auto(
        &self,
        document: &mut Document<'_>,
        quality: OcrQuality,
        observer: Option<&dyn ProgressObserver>,
        cancel: Option<&CancelToken>,
    ) -> Result<ExtractionResult> {
        let direct = self.direct.extract(document)?;
        if direct.page_count() == 0 {
            return Ok(direct);
        }

        let words = direct.word_count();
        if words >= self.settings.word_threshold {
            info!(words, threshold = self.settings.word_threshold, "direct text accepted");
            return Ok(direct);
        }

        info!(words, threshold = self.settings.word_threshold, "direct text too short, running OCR");
        if let Some(observer) = observer {
            observer.on_progress(0, direct.page_count(), Some(INCOMPLETE_DIRECT_NOTE));
        }
        document.rewind();
        match self.run_ocr(document, quality, observer, cancel) {
            Ok(ocr) if ocr.provenance == Provenance::Partial => Ok(ocr),
            Ok(ocr) => Ok(reconcile(direct, ocr, self.settings.reconcile)),
            Err(ScribeError::OcrEngineUnavailable(reason)) => Ok(keep_direct(direct, reason)),
            Err(e) => Err(e),
        }
    }
}

/// Choose between a direct and an OCR result of the same document.
pub fn reconcile(
    direct: ExtractionResult,
    ocr: ExtractionResult,
    strategy: ReconcileStrategy,
) -> ExtractionResult {
    let ocr_wins = match strategy {
        ReconcileStrategy::MostWords => ocr.word_count() > direct.word_count(),
        ReconcileStrategy::PreferOcr => true,
    };
    let winner = if ocr_wins { "ocr" } else { "direct" };
    info!(
        direct_words = direct.word_count(),
        ocr_words = ocr.word_count(),
        ?strategy,
        winner,
        "reconciled"
    );
    if ocr_wins {
        ocr
    } else {
        direct
    }
}

fn keep_direct(mut direct: ExtractionResult, reason: String) -> ExtractionResult {
    warn!(%reason, "OCR unavailable, keeping direct text");
    direct
        .warnings
        .push(format!("OCR unavailable, kept direct text: {}", reason));
    direct
}
