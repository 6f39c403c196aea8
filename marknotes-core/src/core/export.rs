//! Exporting a single note as a Markdown or PDF download.
//!
//! Markdown export writes the raw note content. PDF export needs a rendered
//! preview region and a [`DocumentRasterizer`]; the rasterizer is optional and
//! PDF export fails with [`ExportError::RasterizerUnavailable`] without one.
//! Finished files are handed to a [`DownloadSink`].

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::note::Note;

/// Supersampling factor applied when rasterizing the preview region.
pub const PDF_SUPERSAMPLE: f32 = 2.0;

/// A4 portrait page width in millimetres.
pub const PAGE_WIDTH_MM: f32 = 210.0;

/// A4 portrait page height in millimetres.
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// Margin kept on every side of the page.
pub const PAGE_MARGIN_MM: f32 = 10.0;

pub const MARKDOWN_MEDIA_TYPE: &str = "text/markdown;charset=utf-8";
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Target file format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Markdown => MARKDOWN_MEDIA_TYPE,
            Self::Pdf => PDF_MEDIA_TYPE,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Pdf => f.write_str("pdf"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "pdf" => Ok(Self::Pdf),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// A finished file ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Errors specific to export operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF export requires a document rasterizer, but none is installed")]
    RasterizerUnavailable,

    #[error("Rasterizing failed: {0}")]
    Rasterize(String),

    #[error("No rendered preview region to export")]
    MissingRenderTarget,

    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
}

/// Pixels produced by rasterizing a rendered region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width_px: u32,
    pub height_px: u32,
    /// Encoded image data, in whatever format the rasterizer's PDF writer expects.
    pub data: Vec<u8>,
}

/// Where a raster image lands on the PDF page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// Capability that turns rendered HTML into a PDF page.
pub trait DocumentRasterizer {
    fn rasterize(&self, html: &str, scale: f32) -> Result<RasterImage, ExportError>;

    fn write_pdf(&self, image: &RasterImage, placement: &Placement) -> Result<Vec<u8>, ExportError>;
}

/// Receives finished files.
pub trait DownloadSink {
    /// Stores `file` and returns where it went.
    fn deliver(&self, file: &ExportedFile) -> Result<PathBuf, ExportError>;
}

/// Writes exported files into a directory, creating it as needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, file: &ExportedFile) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&file.file_name);
        fs::write(&path, &file.bytes)?;
        Ok(path)
    }
}

/// Keeps delivered files in memory. Clones share the same file list.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Rc<RefCell<Vec<ExportedFile>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<ExportedFile> {
        self.files.borrow().clone()
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&self, file: &ExportedFile) -> Result<PathBuf, ExportError> {
        self.files.borrow_mut().push(file.clone());
        Ok(PathBuf::from(&file.file_name))
    }
}

/// Builds export files for notes and hands them to a sink.
pub struct Exporter {
    rasterizer: Option<Box<dyn DocumentRasterizer>>,
    sink: Box<dyn DownloadSink>,
}

impl Exporter {
    pub fn new(sink: Box<dyn DownloadSink>) -> Self {
        Self { rasterizer: None, sink }
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn DocumentRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn supports_pdf(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// Exports `note` and delivers the file.
    ///
    /// `region` is the rendered preview HTML; it is required for PDF output
    /// and ignored for Markdown.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::MissingRenderTarget`] for a PDF export without
    /// a region, [`ExportError::RasterizerUnavailable`] when no rasterizer is
    /// installed, or any rasterizer or sink error. Nothing is delivered on
    /// error.
    pub fn export(
        &self,
        note: &Note,
        format: ExportFormat,
        region: Option<&str>,
    ) -> Result<PathBuf, ExportError> {
        let file = match format {
            ExportFormat::Markdown => markdown_file(note),
            ExportFormat::Pdf => {
                let region = region.ok_or(ExportError::MissingRenderTarget)?;
                self.pdf_file(note, region)?
            }
        };
        let path = self.sink.deliver(&file)?;
        log::info!("Exported note {} to {}", note.id, path.display());
        Ok(path)
    }

    fn pdf_file(&self, note: &Note, region: &str) -> Result<ExportedFile, ExportError> {
        let rasterizer = self
            .rasterizer
            .as_ref()
            .ok_or(ExportError::RasterizerUnavailable)?;

        let image = rasterizer.rasterize(region, PDF_SUPERSAMPLE)?;
        let placement = fit_to_page(image.width_px, image.height_px);
        let bytes = rasterizer.write_pdf(&image, &placement)?;

        Ok(ExportedFile {
            file_name: export_file_name(&note.title, ExportFormat::Pdf),
            media_type: PDF_MEDIA_TYPE,
            bytes,
        })
    }
}

/// The Markdown download for `note`: its raw content under a sanitized name.
pub fn markdown_file(note: &Note) -> ExportedFile {
    ExportedFile {
        file_name: export_file_name(&note.title, ExportFormat::Markdown),
        media_type: MARKDOWN_MEDIA_TYPE,
        bytes: note.content.as_bytes().to_vec(),
    }
}

/// `<sanitized title>.<extension>` for `format`.
pub fn export_file_name(title: &str, format: ExportFormat) -> String {
    format!("{}.{}", sanitize_file_name(title), format.extension())
}

/// Turns a note title into a safe file name stem.
///
/// Keeps the part before the first `.`, trims it, replaces each of
/// `\ / : * ? " < > |` with `-` and each run of whitespace with `_`.
pub fn sanitize_file_name(title: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let invalid = INVALID.get_or_init(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("valid regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));

    let stem = title.split('.').next().unwrap_or("").trim();
    let stem = invalid.replace_all(stem, "-");
    let stem = whitespace.replace_all(&stem, "_");
    if stem.is_empty() { "untitled".to_string() } else { stem.into_owned() }
}

/// Places a `width_px` × `height_px` image on one A4 page.
///
/// The image spans the page width inside the margins. If that makes it taller
/// than the printable height it is scaled down to fit and centred
/// horizontally. Aspect ratio is always preserved.
pub fn fit_to_page(width_px: u32, height_px: u32) -> Placement {
    let max_width = PAGE_WIDTH_MM - 2.0 * PAGE_MARGIN_MM;
    let max_height = PAGE_HEIGHT_MM - 2.0 * PAGE_MARGIN_MM;

    if width_px == 0 || height_px == 0 {
        return Placement { x_mm: PAGE_MARGIN_MM, y_mm: PAGE_MARGIN_MM, width_mm: 0.0, height_mm: 0.0 };
    }

    let aspect = height_px as f32 / width_px as f32;
    let (width_mm, height_mm) = if max_width * aspect > max_height {
        (max_height / aspect, max_height)
    } else {
        (max_width, max_width * aspect)
    };

    Placement {
        x_mm: (PAGE_WIDTH_MM - width_mm) / 2.0,
        y_mm: PAGE_MARGIN_MM,
        width_mm,
        height_mm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRasterizer;

    impl DocumentRasterizer for FakeRasterizer {
        fn rasterize(&self, html: &str, scale: f32) -> Result<RasterImage, ExportError> {
            Ok(RasterImage {
                width_px: (400.0 * scale) as u32,
                height_px: (300.0 * scale) as u32,
                data: html.as_bytes().to_vec(),
            })
        }

        fn write_pdf(&self, image: &RasterImage, placement: &Placement) -> Result<Vec<u8>, ExportError> {
            let mut out = format!("%PDF {}x{} @{:.1}\n", image.width_px, image.height_px, placement.width_mm)
                .into_bytes();
            out.extend_from_slice(&image.data);
            Ok(out)
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("My: Notes?"), "My-_Notes-");
        assert_eq!(sanitize_file_name("welcome.md"), "welcome");
        assert_eq!(sanitize_file_name("  spaced   out  "), "spaced_out");
        assert_eq!(sanitize_file_name(r#"a\b/c:d*e?f"g<h>i|j"#), "a-b-c-d-e-f-g-h-i-j");
        assert_eq!(sanitize_file_name("tabs\tand\nlines"), "tabs_and_lines");
        assert_eq!(sanitize_file_name(""), "untitled");
        assert_eq!(sanitize_file_name(".hidden"), "untitled");
    }

    #[test]
    fn test_markdown_file() {
        let note = Note::new("My: Notes?", "# Hi\n");
        let file = markdown_file(&note);
        assert_eq!(file.file_name, "My-_Notes-.md");
        assert_eq!(file.media_type, "text/markdown;charset=utf-8");
        assert_eq!(file.bytes, b"# Hi\n");
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("docx".parse::<ExportFormat>().is_err());
        assert_eq!(serde_json::to_string(&ExportFormat::Markdown).unwrap(), "\"markdown\"");
    }

    #[test]
    fn test_fit_wide_image_spans_printable_width() {
        let p = fit_to_page(800, 600);
        assert_eq!(p.width_mm, 190.0);
        assert!((p.height_mm - 142.5).abs() < 0.01);
        assert_eq!(p.x_mm, 10.0);
        assert_eq!(p.y_mm, 10.0);
    }

    #[test]
    fn test_fit_tall_image_is_shrunk_to_printable_height() {
        let p = fit_to_page(500, 2000);
        assert!((p.height_mm - 277.0).abs() < 0.01);
        assert!((p.width_mm - 69.25).abs() < 0.01);
        assert!((p.x_mm - (210.0 - 69.25) / 2.0).abs() < 0.01);
        let ratio = p.height_mm / p.width_mm;
        assert!((ratio - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_pdf_without_rasterizer_is_reported() {
        let sink = MemorySink::new();
        let exporter = Exporter::new(Box::new(sink.clone()));
        let note = Note::new("n", "c");

        let result = exporter.export(&note, ExportFormat::Pdf, Some("<p>c</p>"));

        assert!(matches!(result, Err(ExportError::RasterizerUnavailable)));
        assert!(sink.files().is_empty(), "no partial file");
    }

    #[test]
    fn test_pdf_without_region_is_missing_target() {
        let exporter = Exporter::new(Box::new(MemorySink::new())).with_rasterizer(Box::new(FakeRasterizer));
        let result = exporter.export(&Note::new("n", "c"), ExportFormat::Pdf, None);
        assert!(matches!(result, Err(ExportError::MissingRenderTarget)));
    }

    #[test]
    fn test_pdf_export_uses_supersampled_raster() {
        let sink = MemorySink::new();
        let exporter = Exporter::new(Box::new(sink.clone())).with_rasterizer(Box::new(FakeRasterizer));
        assert!(exporter.supports_pdf());

        exporter
            .export(&Note::new("Report.draft", "c"), ExportFormat::Pdf, Some("<p>c</p>"))
            .unwrap();

        let files = sink.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "Report.pdf");
        assert_eq!(files[0].media_type, "application/pdf");
        assert!(files[0].bytes.starts_with(b"%PDF 800x600 @190.0"));
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("exports"));
        let exporter = Exporter::new(Box::new(sink));

        let path = exporter
            .export(&Note::new("Groceries", "- eggs"), ExportFormat::Markdown, None)
            .unwrap();

        assert_eq!(path, dir.path().join("exports").join("Groceries.md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "- eggs");
    }
}
