// PDF extraction module
pub mod direct_extraction;
pub mod extraction_router;
pub mod image_sanitizer;
pub mod lopdf_helper;
pub mod ocr_engine;
pub mod ocr_extraction;

pub use direct_extraction::DirectExtractor;
pub use extraction_router::{reconcile, ExtractionRouter};
pub use image_sanitizer::sanitize;
pub use lopdf_helper::{LopdfReader, TextLayer, TextLayerReader};
pub use ocr_engine::{Recognizer, TesseractRecognizer};
pub use ocr_extraction::{OcrExtractor, OcrRun, PageOutcome};
