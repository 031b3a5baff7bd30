// System PDF renderer using pdftoppm
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};
use tracing::debug;

use crate::pdf_extraction::lopdf_helper;
use crate::types::{Result, ScribeError};

/// Turns PDF bytes into something that can render pages to bitmaps.
pub trait Rasterizer {
    /// Fails with `OcrEngineUnavailable` when the rendering engine cannot run.
    fn open(&self, pdf: &[u8]) -> Result<Box<dyn RasterDocument>>;
}

pub trait RasterDocument {
    fn page_count(&self) -> usize;

    /// Render a 0-based page at `dpi`.
    fn render(&self, page: usize, dpi: u32) -> Result<DynamicImage>;
}

/// Renders pages with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn check_available(&self) -> Result<()> {
        Command::new(&self.program)
            .arg("-v")
            .output()
            .map(|_| ())
            .map_err(|e| {
                ScribeError::OcrEngineUnavailable(format!(
                    "cannot run {}: {}",
                    self.program.display(),
                    e
                ))
            })
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn open(&self, pdf: &[u8]) -> Result<Box<dyn RasterDocument>> {
        self.check_available()?;
        let page_count = lopdf_helper::page_count(pdf)?;

        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile()?;
        file.write_all(pdf)?;
        file.flush()?;

        Ok(Box::new(PdftoppmDocument {
            program: self.program.clone(),
            file,
            page_count,
        }))
    }
}

struct PdftoppmDocument {
    program: PathBuf,
    file: NamedTempFile,
    page_count: usize,
}

impl RasterDocument for PdftoppmDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render(&self, page: usize, dpi: u32) -> Result<DynamicImage> {
        let temp_dir = TempDir::new()?;
        let output_prefix = temp_dir.path().join("page");

        // 0-based here, pdftoppm counts from 1
        let page_number = (page + 1).to_string();
        debug!(page, dpi, "rendering with pdftoppm");

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-singlefile")
            .arg(self.file.path())
            .arg(&output_prefix)
            .output()
            .map_err(|e| {
                ScribeError::OcrEngineUnavailable(format!(
                    "cannot run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScribeError::PageRecognitionFailed {
                page,
                reason: format!("pdftoppm failed: {}", stderr.trim()),
            });
        }

        // -singlefile writes <prefix>.png without a page suffix
        let output_file = output_prefix.with_extension("png");
        Ok(image::open(&output_file)?)
    }
}
