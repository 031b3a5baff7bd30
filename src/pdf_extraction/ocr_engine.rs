// OCR engine - character recognition through the tesseract CLI
use image::{GrayImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

use crate::types::{Result, ScribeError};

pub trait Recognizer {
    /// `OcrEngineUnavailable` when the engine cannot be invoked at all.
    fn check_available(&self) -> Result<()>;

    /// Recognize `image` with all `languages` active at once.
    fn recognize(&self, image: &GrayImage, languages: &[String], psm: u8) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractRecognizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn unavailable(&self, e: std::io::Error) -> ScribeError {
        ScribeError::OcrEngineUnavailable(format!("cannot run {}: {}", self.program.display(), e))
    }
}

/// Tesseract's `-l` argument, e.g. `por+eng`.
pub fn language_arg(languages: &[String]) -> String {
    languages.join("+")
}

impl Recognizer for TesseractRecognizer {
    fn check_available(&self) -> Result<()> {
        Command::new(&self.program)
            .arg("--version")
            .output()
            .map(|_| ())
            .map_err(|e| self.unavailable(e))
    }

    fn recognize(&self, image: &GrayImage, languages: &[String], psm: u8) -> Result<String> {
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("page.png");
        image.save_with_format(&image_path, ImageFormat::Png)?;

        let langs = language_arg(languages);
        debug!(langs = %langs, psm, "running tesseract");

        let output = Command::new(&self.program)
            .arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&langs)
            .arg("--psm")
            .arg(psm.to_string())
            .output()
            .map_err(|e| self.unavailable(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::PageRecognitionFailed {
                page: 0,
                reason: format!("tesseract failed: {}", stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
