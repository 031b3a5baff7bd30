//! PDF to text with a direct text-layer pass and an OCR fallback.
//!
//! [`ExtractionRouter`] decides per document whether the embedded text is
//! enough or OCR has to run, and [`document_emitter::emit`] turns the result
//! into plain text or a DOCX file.

pub mod config;
pub mod document_emitter;
pub mod pdf_extraction;
pub mod system_pdf_renderer;
pub mod types;

pub use config::{ExtractionSettings, OcrConfig, ReconcileStrategy, ScribeConfig};
pub use document_emitter::{emit, OutputFormat};
pub use pdf_extraction::{DirectExtractor, ExtractionRouter, OcrExtractor};
pub use system_pdf_renderer::{PdftoppmRasterizer, RasterDocument, Rasterizer};
pub use types::{
    CancelToken, Document, ExtractionPolicy, ExtractionResult, OcrQuality, ProgressObserver,
    Provenance, Result, ScribeError,
};

/// Extract text from `pdf` with the default engines described by `config`.
pub fn extract(
    pdf: &[u8],
    policy: ExtractionPolicy,
    quality: OcrQuality,
    config: &ScribeConfig,
    observer: Option<&dyn ProgressObserver>,
    cancel: Option<&CancelToken>,
) -> Result<ExtractionResult> {
    let router = ExtractionRouter::from_config(config);
    let mut document = Document::new(pdf);
    router.extract(&mut document, policy, quality, observer, cancel)
}
