//! Progress-callback trait for per-file events during a run.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to be told
//! about each file as the driver reaches it. The CLI uses this to print the
//! operator log and drive its progress bar; library users can forward events
//! wherever they like.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2txt::{ConversionProgressCallback, ExtractionConfig, FileReport};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter(AtomicUsize);
//!
//! impl ConversionProgressCallback for FailureCounter {
//!     fn on_file_error(&self, report: &FileReport, _index: usize, _total: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{report}");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(FailureCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::FileReport;
use std::path::Path;
use std::sync::Arc;

/// Called by the driver as it processes each discovered file.
///
/// Files are processed one at a time, so calls never overlap, but the trait
/// is `Send + Sync` so a callback can be shared with other threads. All
/// methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after discovery.
    ///
    /// # Arguments
    /// * `total_files`: number of matching files found (may be 0)
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is read.
    ///
    /// # Arguments
    /// * `relative`: path relative to the input root
    /// * `index`   : 1-based position in the run
    /// * `total`   : total files in the run
    fn on_file_start(&self, relative: &Path, index: usize, total: usize) {
        let _ = (relative, index, total);
    }

    /// Called after a file's text has been written.
    fn on_file_complete(&self, report: &FileReport, index: usize, total: usize) {
        let _ = (report, index, total);
    }

    /// Called when a file could not be read, extracted or written.
    fn on_file_error(&self, report: &FileReport, index: usize, total: usize) {
        let _ = (report, index, total);
    }

    /// Called once after every file has been attempted.
    ///
    /// # Arguments
    /// * `total_files`  : files attempted
    /// * `success_count`: files converted and written
    fn on_run_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use crate::output::FileOutcome;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        successes: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_run_start(&self, total_files: usize) {
            self.total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _relative: &Path, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _report: &FileReport, _index: usize, _total: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _report: &FileReport, _index: usize, _total: usize) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_run_complete(&self, _total_files: usize, success_count: usize) {
            self.successes.store(success_count, Ordering::SeqCst);
        }
    }

    fn report(name: &str, outcome: FileOutcome) -> FileReport {
        FileReport {
            relative_path: PathBuf::from(name),
            outcome,
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        let ok = report(
            "a.pdf",
            FileOutcome::Converted {
                output_path: PathBuf::from("out/a.txt"),
                chars: 3,
            },
        );
        cb.on_run_start(1);
        cb.on_file_start(Path::new("a.pdf"), 1, 1);
        cb.on_file_complete(&ok, 1, 1);
        cb.on_file_error(&ok, 1, 1);
        cb.on_run_complete(1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_run_start(2);
        cb.on_file_start(Path::new("a.pdf"), 1, 2);
        cb.on_file_complete(
            &report(
                "a.pdf",
                FileOutcome::Converted {
                    output_path: PathBuf::from("a.txt"),
                    chars: 10,
                },
            ),
            1,
            2,
        );
        cb.on_file_start(Path::new("b.pdf"), 2, 2);
        cb.on_file_error(
            &report(
                "b.pdf",
                FileOutcome::Failed {
                    error: FileError::ExtractionFailed {
                        detail: "encrypted document".into(),
                    },
                },
            ),
            2,
            2,
        );
        cb.on_run_complete(2, 1);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 1);
    }
}
