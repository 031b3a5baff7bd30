// Shared fixtures: in-memory PDFs and scripted OCR engines
#![allow(dead_code)]

use image::{DynamicImage, GrayImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use pdfscribe::config::ExtractionSettings;
use pdfscribe::pdf_extraction::{
    DirectExtractor, ExtractionRouter, OcrExtractor, Recognizer, TextLayer, TextLayerReader,
};
use pdfscribe::{RasterDocument, Rasterizer, Result, ScribeError};

/// Build a PDF whose pages carry the given text (`None` = no text operators).
pub fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = match text {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => Vec::new(),
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

/// `n` words: "w0 w1 w2 ..."
pub fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
}

/// Text layer with scripted page texts, independent of the input bytes.
#[derive(Clone)]
pub struct ScriptedTextLayer {
    pub pages: Vec<Option<String>>,
}

impl TextLayerReader for ScriptedTextLayer {
    fn open(&self, _pdf: &[u8]) -> Result<Box<dyn TextLayer>> {
        Ok(Box::new(self.clone()))
    }
}

impl TextLayer for ScriptedTextLayer {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Option<String> {
        self.pages.get(index).cloned().flatten()
    }
}

/// Renders page `i` as a blank image `i + 1` pixels wide so the recognizer
/// can tell pages apart after sanitizing.
pub struct FakeRasterizer {
    pub pages: usize,
    pub available: bool,
    pub opened: Rc<Cell<usize>>,
}

impl FakeRasterizer {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            available: true,
            opened: Rc::new(Cell::new(0)),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(0)
        }
    }
}

impl Rasterizer for FakeRasterizer {
    fn open(&self, _pdf: &[u8]) -> Result<Box<dyn RasterDocument>> {
        if !self.available {
            return Err(ScribeError::OcrEngineUnavailable("fake rasterizer offline".into()));
        }
        self.opened.set(self.opened.get() + 1);
        Ok(Box::new(FakeRaster { pages: self.pages }))
    }
}

struct FakeRaster {
    pages: usize,
}

impl RasterDocument for FakeRaster {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn render(&self, page: usize, _dpi: u32) -> Result<DynamicImage> {
        Ok(DynamicImage::ImageLuma8(GrayImage::new(page as u32 + 1, 2)))
    }
}

/// Returns `texts[page]`, failing on the pages listed in `failing`.
pub struct FakeRecognizer {
    pub texts: Vec<String>,
    pub failing: HashSet<usize>,
    pub calls: Rc<Cell<usize>>,
    pub seen_languages: Rc<std::cell::RefCell<Vec<String>>>,
    pub seen_psm: Rc<Cell<u8>>,
}

impl FakeRecognizer {
    pub fn new<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            failing: HashSet::new(),
            calls: Rc::new(Cell::new(0)),
            seen_languages: Rc::default(),
            seen_psm: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing_on(mut self, pages: &[usize]) -> Self {
        self.failing.extend(pages.iter().copied());
        self
    }
}

impl Recognizer for FakeRecognizer {
    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    fn recognize(&self, image: &GrayImage, languages: &[String], psm: u8) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        *self.seen_languages.borrow_mut() = languages.to_vec();
        self.seen_psm.set(psm);

        let page = image.width() as usize - 1;
        if self.failing.contains(&page) {
            return Err(ScribeError::PageRecognitionFailed {
                page,
                reason: "unreadable scan".into(),
            });
        }
        Ok(self.texts.get(page).cloned().unwrap_or_default())
    }
}

pub fn languages() -> Vec<String> {
    vec!["por".to_string(), "eng".to_string()]
}

pub fn router(
    direct: DirectExtractor,
    rasterizer: FakeRasterizer,
    recognizer: FakeRecognizer,
    settings: ExtractionSettings,
) -> ExtractionRouter {
    let ocr = OcrExtractor::new(Box::new(rasterizer), Box::new(recognizer), languages());
    ExtractionRouter::new(direct, ocr, settings)
}

pub fn scripted_direct(pages: Vec<Option<String>>) -> DirectExtractor {
    DirectExtractor::new(Box::new(ScriptedTextLayer { pages }))
}
