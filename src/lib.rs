//! # edgequake-pdf2txt
//!
//! Recursively extract plain text from every PDF under a directory, writing
//! one `.txt` per document into an output tree that mirrors the input.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input root
//!  │
//!  ├─ 0. Engine    bind PDFium once at startup (download on first run)
//!  ├─ 1. Discover  walk the tree for *.pdf (case-insensitive)
//!  ├─ 2. Extract   read bytes → PDFium → text, one file at a time
//!  ├─ 3. Write     <output>/<relative path>.txt, atomic overwrite
//!  └─ 4. Report    OK / ERR line per file + run summary
//! ```
//!
//! A file that cannot be read or parsed is reported and skipped; it never
//! stops the run. Only setup failures are returned as errors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2txt::{convert_dir, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let summary = convert_dir("papers/", &config).await?;
//!     for file in &summary.files {
//!         println!("{file}");
//!     }
//!     println!("{}", summary.summary_line());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom engines
//!
//! Anything implementing [`TextExtractor`] can replace PDFium via
//! [`ExtractionConfigBuilder::extractor`], which is also how the test-suite
//! runs without a PDFium binary.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2txt` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageSeparator, DEFAULT_OUTPUT_DIR};
pub use convert::{convert_dir, convert_dir_sync};
pub use error::{ExtractionError, FileError, Pdf2TxtError};
pub use output::{FileOutcome, FileReport, RunSummary};
pub use pipeline::discover::{discover, DiscoveredFile, DiscoveryOptions};
pub use pipeline::extract::{convert_file, ConversionResult, PdfiumExtractor, TextExtractor};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
