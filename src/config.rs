// Configuration for pdfscribe
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{OcrQuality, Result, ScribeError};

pub const DEFAULT_WORD_THRESHOLD: usize = 50;
pub const PDFTOPPM_ENV: &str = "PDFSCRIBE_PDFTOPPM";
pub const TESSERACT_ENV: &str = "PDFSCRIBE_TESSERACT";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScribeConfig {
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub extraction: ExtractionSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OcrConfig {
    #[serde(default = "default_pdftoppm")]
    pub pdftoppm_path: PathBuf,
    #[serde(default = "default_tesseract")]
    pub tesseract_path: PathBuf,
    /// Recognized simultaneously, e.g. `["por", "eng"]` becomes `-l por+eng`.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub quality: OcrQuality,
}

fn default_pdftoppm() -> PathBuf {
    PathBuf::from("pdftoppm")
}

fn default_tesseract() -> PathBuf {
    PathBuf::from("tesseract")
}

fn default_languages() -> Vec<String> {
    vec!["por".to_string(), "eng".to_string()]
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            pdftoppm_path: default_pdftoppm(),
            tesseract_path: default_tesseract(),
            languages: default_languages(),
            quality: OcrQuality::default(),
        }
    }
}

/// How a direct result and an OCR result are reconciled once both exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcileStrategy {
    /// Strictly more words wins; a tie keeps the direct text.
    #[default]
    MostWords,
    /// OCR output replaces the direct text whenever OCR ran.
    PreferOcr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractionSettings {
    /// Direct results with fewer words than this trigger OCR under `Auto`.
    #[serde(default = "default_word_threshold")]
    pub word_threshold: usize,
    #[serde(default)]
    pub reconcile: ReconcileStrategy,
    /// Opt-in: run OCR when a direct-only extraction is completely empty.
    #[serde(default)]
    pub direct_only_rescue: bool,
}

fn default_word_threshold() -> usize {
    DEFAULT_WORD_THRESHOLD
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            word_threshold: DEFAULT_WORD_THRESHOLD,
            reconcile: ReconcileStrategy::default(),
            direct_only_rescue: false,
        }
    }
}

impl ScribeConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ScribeError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Optional file, then environment overrides for the engine executables.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the OCR engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.ocr.languages.is_empty() {
            return Err(ScribeError::Config("at least one OCR language is required".into()));
        }
        if let Some(code) = self
            .ocr
            .languages
            .iter()
            .find(|code| code.is_empty() || code.contains(|c: char| c == '+' || c.is_whitespace()))
        {
            return Err(ScribeError::Config(format!("invalid OCR language code {:?}", code)));
        }
        Ok(())
    }

    pub fn apply_env(&mut self) {
        if let Ok(path) = env::var(PDFTOPPM_ENV) {
            self.ocr.pdftoppm_path = path.into();
        }
        if let Ok(path) = env::var(TESSERACT_ENV) {
            self.ocr.tesseract_path = path.into();
        }
    }
}
