// pdfscribe - PDF to text/DOCX with OCR fallback
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdfscribe::pdf_extraction::{Recognizer, TesseractRecognizer};
use pdfscribe::{
    emit, Document, ExtractionPolicy, ExtractionRouter, OcrQuality, OutputFormat,
    PdftoppmRasterizer, ScribeConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "PDF text extraction with OCR fallback")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from a PDF
    Extract(ExtractArgs),
    /// Report whether pdftoppm and tesseract can be run
    Check,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    pdf_file: PathBuf,
    #[arg(short, long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,
    #[arg(short, long, value_enum)]
    quality: Option<Quality>,
    #[arg(short, long, value_enum, default_value_t = Format::Txt)]
    format: Format,
    /// Output file, defaults to the PDF name with a .txt/.docx extension
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the text instead of writing a file
    #[arg(long, conflicts_with_all = ["output", "json"])]
    stdout: bool,
    /// Print the full result (pages, provenance, warnings) as JSON
    #[arg(long)]
    json: bool,
    /// Direct results with fewer words run OCR in auto mode
    #[arg(long)]
    word_threshold: Option<usize>,
    /// OCR languages joined with '+', e.g. por+eng
    #[arg(long)]
    lang: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Direct,
    Ocr,
    Auto,
}

impl From<Mode> for ExtractionPolicy {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Direct => ExtractionPolicy::DirectOnly,
            Mode::Ocr => ExtractionPolicy::OcrOnly,
            Mode::Auto => ExtractionPolicy::Auto,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Quality {
    Low,
    Medium,
    High,
}

impl From<Quality> for OcrQuality {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Low => OcrQuality::Low,
            Quality::Medium => OcrQuality::Medium,
            Quality::High => OcrQuality::High,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Txt,
    Docx,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Txt => OutputFormat::PlainText,
            Format::Docx => OutputFormat::WordDocument,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ScribeConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Extract(args) => run_extract(args, config),
        Command::Check => run_check(&config),
    }
}

fn run_extract(args: ExtractArgs, mut config: ScribeConfig) -> Result<()> {
    if let Some(threshold) = args.word_threshold {
        config.extraction.word_threshold = threshold;
    }
    if let Some(lang) = &args.lang {
        config.ocr.languages = lang.split('+').map(str::to_string).collect();
    }
    config.validate().context("Invalid OCR settings")?;
    let quality = args.quality.map(OcrQuality::from).unwrap_or(config.ocr.quality);

    let bytes = fs::read(&args.pdf_file)
        .with_context(|| format!("Failed to read {}", args.pdf_file.display()))?;
    let mut document = Document::new(&bytes);
    let router = ExtractionRouter::from_config(&config);

    let observer = |current: usize, total: usize, note: Option<&str>| match note {
        Some(note) if current == 0 => eprintln!("{}", note),
        Some(note) => eprintln!("Page {} of {}: {}", current, total, note),
        None => eprintln!("Processed page {} of {} with OCR", current, total),
    };

    let result = router
        .extract(&mut document, args.mode.into(), quality, Some(&observer), None)
        .with_context(|| format!("Failed to extract text from {}", args.pdf_file.display()))?;

    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    eprintln!(
        "Extracted {} pages ({} words) via {:?}",
        result.page_count(),
        result.word_count(),
        result.provenance
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let text = result.text();
    if args.stdout {
        println!("{}", text);
        return Ok(());
    }

    let format = OutputFormat::from(args.format);
    let output = args
        .output
        .unwrap_or_else(|| default_output(&args.pdf_file, format));
    let payload = emit(&text, format)?;
    fs::write(&output, payload).with_context(|| format!("Failed to write {}", output.display()))?;
    eprintln!("Wrote {}", output.display());
    Ok(())
}

fn default_output(pdf: &Path, format: OutputFormat) -> PathBuf {
    pdf.with_extension(format.extension())
}

fn run_check(config: &ScribeConfig) -> Result<()> {
    let rasterizer = PdftoppmRasterizer::new(&config.ocr.pdftoppm_path);
    let recognizer = TesseractRecognizer::new(&config.ocr.tesseract_path);

    let mut ok = true;
    match rasterizer.check_available() {
        Ok(()) => println!("pdftoppm: ok ({})", rasterizer.program().display()),
        Err(e) => {
            ok = false;
            println!("pdftoppm: {}", e);
        }
    }
    match recognizer.check_available() {
        Ok(()) => println!("tesseract: ok ({})", recognizer.program().display()),
        Err(e) => {
            ok = false;
            println!("tesseract: {}", e);
        }
    }
    println!("languages: {}", config.ocr.languages.join("+"));

    if !ok {
        anyhow::bail!("OCR is unavailable; only direct extraction will work");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_swaps_extension() {
        let out = default_output(Path::new("/tmp/scan.pdf"), OutputFormat::WordDocument);
        assert_eq!(out, PathBuf::from("/tmp/scan.docx"));
    }

    #[test]
    fn cli_parses_extract() {
        let cli = Cli::parse_from(["pdfscribe", "extract", "in.pdf", "--mode", "ocr", "--format", "docx"]);
        match cli.command {
            Command::Extract(args) => {
                assert!(matches!(args.mode, Mode::Ocr));
                assert!(matches!(args.format, Format::Docx));
            }
            Command::Check => panic!("expected extract"),
        }
    }
}
