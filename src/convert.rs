//! Run driver: wire discovery, extraction and writing over a directory.
//!
//! Files are processed strictly one after another. Only setup problems are
//! fatal (engine unavailable, bad input root, output root not creatable);
//! once the loop starts every file gets a [`FileReport`] and the run always
//! reaches the end.

use crate::config::ExtractionConfig;
use crate::error::Pdf2TxtError;
use crate::output::{FileReport, RunSummary};
use crate::pipeline::discover::{self, DiscoveredFile, DiscoveryOptions};
use crate::pipeline::extract::{self, PdfiumExtractor, TextExtractor};
use crate::pipeline::write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract text from every matching file under `input_root`.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(RunSummary)` whenever the run got past setup, even if some or all
/// files failed (check `summary.failed`).
///
/// # Errors
/// Returns `Err(Pdf2TxtError)` only for fatal errors:
/// - No extraction engine could be acquired
/// - Input root missing, not a directory, or unreadable
/// - Output root cannot be created
pub async fn convert_dir(
    input_root: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RunSummary, Pdf2TxtError> {
    let total_start = Instant::now();

    // ── Step 1: Acquire the extraction engine ────────────────────────────
    let extractor = resolve_extractor(config).await?;

    // ── Step 2: Resolve and validate roots ───────────────────────────────
    let input_root = std::path::absolute(input_root.as_ref())
        .map_err(|e| Pdf2TxtError::from_input_io(input_root.as_ref().to_path_buf(), &e))?;
    discover::check_root(&input_root)?;

    let requested = config.resolve_output_root(&input_root);
    let output_root =
        std::path::absolute(&requested).map_err(|source| Pdf2TxtError::OutputDirFailed {
            path: requested.clone(),
            source,
        })?;
    info!(
        "Extracting {} files from {} into {}",
        config.suffix(),
        input_root.display(),
        output_root.display()
    );

    // ── Step 3: Ensure output root ───────────────────────────────────────
    tokio::fs::create_dir_all(&output_root)
        .await
        .map_err(|source| Pdf2TxtError::OutputDirFailed {
            path: output_root.clone(),
            source,
        })?;

    // ── Step 4: Discover ─────────────────────────────────────────────────
    let options = DiscoveryOptions::from_config(config, &output_root);
    let root = input_root.clone();
    let files: Vec<DiscoveredFile> = tokio::task::spawn_blocking(move || {
        discover::discover(&root, &options).map(|found| found.collect::<Vec<_>>())
    })
    .await
    .map_err(|e| Pdf2TxtError::Internal(format!("Discovery task panicked: {}", e)))??;

    let total = files.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }
    if total == 0 {
        info!("No {} files found under {}", config.suffix(), input_root.display());
        return Ok(RunSummary {
            input_root,
            output_root,
            discovered: 0,
            converted: 0,
            failed: 0,
            files: Vec::new(),
            duration_ms: total_start.elapsed().as_millis() as u64,
        });
    }
    info!("Found {} files", total);

    // ── Step 5: Convert and write, one file at a time ────────────────────
    let suffix = config.suffix();
    let mut reports: Vec<FileReport> = Vec::with_capacity(total);
    for (i, file) in files.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(&file.relative, index, total);
        }

        let result = extract::convert_file(&extractor, file).await;
        let report = write::write_result(&output_root, &suffix, file, result).await;

        match report.error() {
            None => {
                debug!("{}", report);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(&report, index, total);
                }
            }
            Some(e) => {
                warn!("{}: {}", file.relative.display(), e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(&report, index, total);
                }
            }
        }
        reports.push(report);
    }

    // ── Step 6: Summarise ────────────────────────────────────────────────
    let converted = reports.iter().filter(|r| r.is_success()).count();
    let summary = RunSummary {
        input_root,
        output_root,
        discovered: total,
        converted,
        failed: total - converted,
        files: reports,
        duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Run complete: {}/{} files, {}ms total",
        summary.converted, summary.discovered, summary.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, converted);
    }

    Ok(summary)
}

/// Synchronous wrapper around [`convert_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_dir_sync(
    input_root: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RunSummary, Pdf2TxtError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TxtError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_dir(input_root, config))
}

/// Pick the extractor: a caller-supplied one, otherwise PDFium.
///
/// Binding PDFium may download the library, so it runs on the blocking pool.
async fn resolve_extractor(
    config: &ExtractionConfig,
) -> Result<Arc<dyn TextExtractor>, Pdf2TxtError> {
    if let Some(ref extractor) = config.extractor {
        return Ok(Arc::clone(extractor));
    }

    let config = config.clone();
    let pdfium = tokio::task::spawn_blocking(move || PdfiumExtractor::from_config(&config, None))
        .await
        .map_err(|e| Pdf2TxtError::Internal(format!("Engine setup panicked: {}", e)))??;
    Ok(Arc::new(pdfium))
}
