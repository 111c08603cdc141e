//! Text extraction: turn one discovered file into a [`ConversionResult`].
//!
//! The engine sits behind the [`TextExtractor`] trait so the driver only
//! sees `bytes -> text`. [`convert_file`] is the isolation boundary: a read
//! error, an engine error or even an engine panic ends up as a
//! [`FileError`] for that file and nothing else.
//!
//! ## Why spawn_blocking?
//!
//! PDFium is a C++ library that does CPU-heavy, blocking work. Running it on
//! Tokio's blocking pool keeps the async worker free, and a panic inside the
//! engine surfaces as a `JoinError` instead of tearing down the run.

use crate::config::{ExtractionConfig, PageSeparator};
use crate::error::{ExtractionError, FileError, Pdf2TxtError};
use crate::pipeline::discover::DiscoveredFile;
use pdfium_auto::{DownloadProgress, LibraryLocation};
use pdfium_render::prelude::{PdfDocument, PdfiumError, PdfiumInternalError};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of converting one file: the extracted text, or why there is none.
pub type ConversionResult = Result<String, FileError>;

/// An engine converting raw document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Read `file` and run it through `extractor`.
///
/// Never fails the run: every error is folded into the returned result.
pub async fn convert_file(
    extractor: &Arc<dyn TextExtractor>,
    file: &DiscoveredFile,
) -> ConversionResult {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| FileError::ReadFailed {
            detail: e.to_string(),
        })?;
    debug!("Read {} ({} bytes)", file.relative.display(), bytes.len());

    let extractor = Arc::clone(extractor);
    match tokio::task::spawn_blocking(move || extractor.extract(&bytes)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(FileError::TaskFailed {
            detail: e.to_string(),
        }),
    }
}

/// How far into the file the `%PDF-` header may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Reject data without a `%PDF-` header before handing it to PDFium.
fn check_pdf_header(bytes: &[u8]) -> Result<(), ExtractionError> {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if window.windows(5).any(|w| w == b"%PDF-") {
        Ok(())
    } else {
        Err(ExtractionError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Text extractor backed by PDFium.
///
/// Construction binds the library once as a startup check; each
/// [`TextExtractor::extract`] call binds its own `Pdfium` instance on the
/// blocking thread it runs on.
#[derive(Debug, Clone)]
pub struct PdfiumExtractor {
    location: LibraryLocation,
    password: Option<String>,
    separator: PageSeparator,
}

impl PdfiumExtractor {
    /// Use the library at `location`, failing now if it cannot be bound.
    pub fn new(
        location: LibraryLocation,
        password: Option<String>,
        separator: PageSeparator,
    ) -> Result<Self, Pdf2TxtError> {
        pdfium_auto::bind(&location).map_err(|e| Pdf2TxtError::EngineUnavailable(e.to_string()))?;
        Ok(Self {
            location,
            password,
            separator,
        })
    }

    /// Locate PDFium (downloading it if the config allows) and bind it.
    ///
    /// Blocking: call from a blocking context.
    pub fn from_config(
        config: &ExtractionConfig,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<Self, Pdf2TxtError> {
        let (location, source) = pdfium_auto::locate(config.allow_download, on_progress)
            .map_err(|e| Pdf2TxtError::EngineUnavailable(e.to_string()))?;
        info!("Using PDFium from {} ({})", location, source);
        Self::new(
            location,
            config.password.clone(),
            config.page_separator.clone(),
        )
    }

    pub fn location(&self) -> &LibraryLocation {
        &self.location
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        check_pdf_header(bytes)?;

        let pdfium =
            pdfium_auto::bind(&self.location).map_err(|e| ExtractionError::Other(e.to_string()))?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, self.password.as_deref())
            .map_err(load_error)?;

        let pages = page_texts(&document)?;
        debug!("Extracted {} pages", pages.len());

        Ok(pages.join(self.separator.as_str()))
    }
}

/// Classify a document load failure.
fn load_error(e: PdfiumError) -> ExtractionError {
    match e {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            ExtractionError::Encrypted
        }
        other => {
            let err_str = format!("{:?}", other);
            if err_str.contains("Password") || err_str.contains("password") {
                ExtractionError::Encrypted
            } else {
                ExtractionError::Malformed(err_str)
            }
        }
    }
}

/// Text of every page, in page order.
fn page_texts(document: &PdfDocument<'_>) -> Result<Vec<String>, ExtractionError> {
    document
        .pages()
        .iter()
        .enumerate()
        .map(|(idx, page)| {
            page.text()
                .map(|text| text.all())
                .map_err(|e| ExtractionError::PageText {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })
        })
        .collect()
}
