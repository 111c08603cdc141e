//! Error types for the edgequake-pdf2txt library.
//!
//! Two tiers, matching the two ways a batch run can go wrong:
//!
//! * [`Pdf2TxtError`]: **Fatal**: the run cannot start or cannot continue
//!   (input root missing, output root not creatable, PDF engine unavailable).
//!   Returned as `Err` from [`crate::convert::convert_dir`].
//!
//! * [`FileError`]: **Non-fatal**: one file could not be read, extracted or
//!   written. Stored in [`crate::output::FileReport`]; the run moves on to the
//!   next file.
//!
//! [`ExtractionError`] is what a [`crate::pipeline::extract::TextExtractor`]
//! returns. The converter folds it into [`FileError::ExtractionFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2txt library.
#[derive(Debug, Error)]
pub enum Pdf2TxtError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input root does not exist.
    #[error("Input directory not found: '{path}'\nCheck the path exists.")]
    InputNotFound { path: PathBuf },

    /// Input root exists but is a file, socket, …
    #[error("Input path is not a directory: '{path}'")]
    InputNotADirectory { path: PathBuf },

    /// Process cannot list the input root.
    #[error("Permission denied reading '{path}'\nTry: chmod +rx {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Output root could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The text-extraction engine could not be acquired at startup.
    #[error(
        "PDF text engine unavailable: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If that is not possible, you can:\n\
  • Check your internet connection and try again.\n\
  • Install libpdfium system-wide.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    EngineUnavailable(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2TxtError {
    /// Classify an I/O error raised while opening the input root.
    pub(crate) fn from_input_io(path: PathBuf, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Pdf2TxtError::InputNotFound { path },
            std::io::ErrorKind::PermissionDenied => Pdf2TxtError::PermissionDenied { path },
            _ => Pdf2TxtError::Internal(format!("cannot read '{}': {err}", path.display())),
        }
    }
}

/// A non-fatal error for a single file.
///
/// Carries strings rather than sources so reports can be cloned and
/// serialised into the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileError {
    /// The file could not be read into memory.
    #[error("cannot read file: {detail}")]
    ReadFailed { detail: String },

    /// The extraction engine rejected the file. Displays the engine's message as-is.
    #[error("{detail}")]
    ExtractionFailed { detail: String },

    /// Text was extracted but the output file could not be written.
    #[error("cannot write '{path}': {detail}")]
    WriteFailed { path: PathBuf, detail: String },

    /// The blocking extraction task panicked or was cancelled.
    #[error("extraction task failed: {detail}")]
    TaskFailed { detail: String },
}

/// Errors produced by a text extractor for a single document.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// No `%PDF-` header near the start of the data.
    #[error("not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The document needs a password, or the supplied one is wrong.
    #[error("encrypted document")]
    Encrypted,

    /// The engine could not parse the document.
    #[error("malformed PDF: {0}")]
    Malformed(String),

    /// A single page's text layer could not be read.
    #[error("page {page}: {detail}")]
    PageText { page: usize, detail: String },

    /// Any other extractor-specific failure.
    #[error("{0}")]
    Other(String),
}

impl From<ExtractionError> for FileError {
    fn from(e: ExtractionError) -> Self {
        FileError::ExtractionFailed {
            detail: e.to_string(),
        }
    }
}
