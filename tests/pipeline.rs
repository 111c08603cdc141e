//! Whole-run tests for `convert_dir` with an in-process fake extractor.
//!
//! These need no PDFium binary: the extractor decides what to return from
//! the bytes it is given, so each test sets up exactly the failures it wants.

use edgequake_pdf2txt::{
    convert_dir, convert_dir_sync, ConversionProgressCallback, ExtractionConfig, ExtractionError,
    FileError, FileReport, Pdf2TxtError, TextExtractor,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// `ENCRYPTED` → encrypted error, `FAIL:<msg>` → error with `<msg>`,
/// anything else → `"text:" + contents`.
struct FakeExtractor;

impl TextExtractor for FakeExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let s = String::from_utf8_lossy(bytes);
        if s == "ENCRYPTED" {
            return Err(ExtractionError::Encrypted);
        }
        if let Some(msg) = s.strip_prefix("FAIL:") {
            return Err(ExtractionError::Other(msg.to_string()));
        }
        Ok(format!("text:{s}"))
    }
}

/// `RUST_LOG=edgequake_pdf2txt=debug cargo test --test pipeline -- --nocapture`
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn put(root: &Path, rel: &str, contents: &str) {
    let p = root.join(rel);
    std::fs::create_dir_all(p.parent().unwrap()).unwrap();
    std::fs::write(p, contents).unwrap();
}

/// Every regular file under `root` as `relative/path -> contents`.
fn tree(root: &Path) -> BTreeMap<String, String> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (rel, std::fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

fn config_into(output: &Path) -> ExtractionConfig {
    ExtractionConfig::builder()
        .output_root(output)
        .extractor(Arc::new(FakeExtractor))
        .build()
        .unwrap()
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl EventLog {
    fn push(&self, s: String) {
        self.0.lock().unwrap().push(s);
    }
    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl ConversionProgressCallback for EventLog {
    fn on_run_start(&self, total_files: usize) {
        self.push(format!("start {total_files}"));
    }
    fn on_file_start(&self, relative: &Path, index: usize, total: usize) {
        self.push(format!("file {index}/{total} {}", relative.display()));
    }
    fn on_file_complete(&self, report: &FileReport, _index: usize, _total: usize) {
        self.push(report.to_string());
    }
    fn on_file_error(&self, report: &FileReport, _index: usize, _total: usize) {
        self.push(report.to_string());
    }
    fn on_run_complete(&self, total_files: usize, success_count: usize) {
        self.push(format!("done {success_count}/{total_files}"));
    }
}

// ── Discovery + mirroring ────────────────────────────────────────────────────

#[tokio::test]
async fn nested_tree_is_mirrored() {
    init_tracing();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    put(input.path(), "a.pdf", "A");
    put(input.path(), "docs/a.PDF", "DOCS-A");
    put(input.path(), "docs/deep/er/c.Pdf", "C");
    put(input.path(), "docs/readme.md", "not a pdf");
    put(input.path(), "docs/archive.pdf.zip", "nope");

    let summary = convert_dir(input.path(), &config_into(output.path()))
        .await
        .unwrap();

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.converted, 3);
    assert_eq!(summary.failed, 0);

    let expected: BTreeMap<String, String> = [
        ("a.txt", "text:A"),
        ("docs/a.txt", "text:DOCS-A"),
        ("docs/deep/er/c.txt", "text:C"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(tree(output.path()), expected);
}

#[tokio::test]
async fn custom_extension_is_honoured() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    put(input.path(), "x.pdf", "P");
    put(input.path(), "y.DOC", "D");

    let config = ExtractionConfig::builder()
        .output_root(output.path())
        .extension(".doc")
        .extractor(Arc::new(FakeExtractor))
        .build()
        .unwrap();
    let summary = convert_dir(input.path(), &config).await.unwrap();

    assert_eq!(summary.discovered, 1);
    assert_eq!(
        tree(output.path()).into_keys().collect::<Vec<_>>(),
        vec!["y.txt"]
    );
}

// ── Failure isolation ────────────────────────────────────────────────────────

#[tokio::test]
async fn one_bad_file_does_not_stop_the_run() {
    init_tracing();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    put(input.path(), "a_good.pdf", "fine");
    put(input.path(), "bad.pdf", "ENCRYPTED");
    put(input.path(), "c_broken.pdf", "FAIL:xref table is corrupt");
    put(input.path(), "d_good.pdf", "also fine");

    let summary = convert_dir(input.path(), &config_into(output.path()))
        .await
        .unwrap();

    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.converted, 2);
    assert_eq!(summary.failed, 2);

    let lines: Vec<String> = summary.files.iter().map(|r| r.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "OK a_good.pdf",
            "ERR bad.pdf: encrypted document",
            "ERR c_broken.pdf: xref table is corrupt",
            "OK d_good.pdf",
        ]
    );
    assert!(matches!(
        summary.files[1].error(),
        Some(FileError::ExtractionFailed { .. })
    ));

    let out = tree(output.path());
    assert!(!out.contains_key("bad.txt"));
    assert!(!out.contains_key("c_broken.txt"));
    assert_eq!(out["d_good.txt"], "text:also fine");
}

// ── Idempotence ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn rerun_overwrites_instead_of_duplicating() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    put(input.path(), "one.pdf", "1");
    put(input.path(), "sub/two.pdf", "2");
    let config = config_into(output.path());

    convert_dir(input.path(), &config).await.unwrap();
    let first = tree(output.path());

    // Stale content from an older run must be replaced wholesale.
    std::fs::write(output.path().join("one.txt"), "stale and much longer content").unwrap();

    convert_dir(input.path(), &config).await.unwrap();
    let second = tree(output.path());

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

// ── Empty input ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn no_matching_files_creates_only_the_output_root() {
    let input = tempfile::tempdir().unwrap();
    put(input.path(), "notes.txt", "hello");
    let output = input.path().join("fresh/out");

    let log = Arc::new(EventLog::default());
    let config = ExtractionConfig::builder()
        .output_root(&output)
        .extractor(Arc::new(FakeExtractor))
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let summary = convert_dir(input.path(), &config).await.unwrap();

    assert_eq!(summary.discovered, 0);
    assert!(summary.files.is_empty());
    assert!(output.is_dir());
    assert!(tree(&output).is_empty());
    assert_eq!(log.events(), vec!["start 0"]);
}

// ── Default output root ──────────────────────────────────────────────────────

#[tokio::test]
async fn default_output_root_is_not_rescanned() {
    let input = tempfile::tempdir().unwrap();
    put(input.path(), "paper.pdf", "P");
    // Leftover from someone's manual copy; lives inside the output root.
    put(input.path(), "text-output/leftover.pdf", "L");

    let config = ExtractionConfig::builder()
        .extractor(Arc::new(FakeExtractor))
        .build()
        .unwrap();
    let summary = convert_dir(input.path(), &config).await.unwrap();

    assert_eq!(summary.discovered, 1);
    assert_eq!(summary.output_root, input.path().join("text-output"));
    assert_eq!(
        std::fs::read_to_string(input.path().join("text-output/paper.txt")).unwrap(),
        "text:P"
    );
}

#[tokio::test]
async fn output_root_inside_input_is_skipped_however_spelled() {
    let parent = tempfile::tempdir().unwrap();
    let input = parent.path().join("in");
    put(&input, "a.txt", "A");
    let output = parent.path().join("in/../in/out");

    let config = ExtractionConfig::builder()
        .output_root(&output)
        .extension("txt")
        .extractor(Arc::new(FakeExtractor))
        .build()
        .unwrap();

    let first = convert_dir(&input, &config).await.unwrap();
    let second = convert_dir(&input, &config).await.unwrap();

    assert_eq!(first.discovered, 1);
    assert_eq!(second.discovered, 1);
    let lines: Vec<String> = second.files.iter().map(|r| r.to_string()).collect();
    assert_eq!(lines, vec!["OK a.txt"]);
    assert_eq!(
        tree(&input.join("out")).into_keys().collect::<Vec<_>>(),
        vec!["a.txt"]
    );
}

// ── Fatal setup errors ───────────────────────────────────────────────────────

#[tokio::test]
async fn missing_input_is_fatal_and_writes_nothing() {
    let parent = tempfile::tempdir().unwrap();
    let input = parent.path().join("does-not-exist");

    let config = ExtractionConfig::builder()
        .extractor(Arc::new(FakeExtractor))
        .build()
        .unwrap();
    let err = convert_dir(&input, &config).await.unwrap_err();

    assert!(matches!(err, Pdf2TxtError::InputNotFound { .. }), "got {err:?}");
    assert!(!input.exists(), "default output root must not resurrect the input");
}

#[tokio::test]
async fn uncreatable_output_root_is_fatal() {
    let input = tempfile::tempdir().unwrap();
    put(input.path(), "a.pdf", "A");
    let blocker = input.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let err = convert_dir(input.path(), &config_into(&blocker.join("out")))
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2TxtError::OutputDirFailed { .. }), "got {err:?}");
}

#[tokio::test]
async fn unavailable_engine_is_fatal() {
    let input = tempfile::tempdir().unwrap();
    put(input.path(), "a.pdf", "A");

    std::env::set_var("PDFIUM_LIB_PATH", input.path().join("no-such-libpdfium.so"));
    let config = ExtractionConfig::builder()
        .allow_download(false)
        .build()
        .unwrap();
    let result = convert_dir(input.path(), &config).await;
    std::env::remove_var("PDFIUM_LIB_PATH");

    let err = result.unwrap_err();
    assert!(matches!(err, Pdf2TxtError::EngineUnavailable(_)), "got {err:?}");
    assert!(!input.path().join("text-output").exists());
}

// ── Progress events ──────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_events_follow_processing_order() {
    init_tracing();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    put(input.path(), "a.pdf", "A");
    put(input.path(), "b.pdf", "ENCRYPTED");

    let log = Arc::new(EventLog::default());
    let config = ExtractionConfig::builder()
        .output_root(output.path())
        .extractor(Arc::new(FakeExtractor))
        .progress_callback(log.clone())
        .build()
        .unwrap();
    convert_dir(input.path(), &config).await.unwrap();

    assert_eq!(
        log.events(),
        vec![
            "start 2",
            "file 1/2 a.pdf",
            "OK a.pdf",
            "file 2/2 b.pdf",
            "ERR b.pdf: encrypted document",
            "done 1/2",
        ]
    );
}

// ── Sync wrapper ─────────────────────────────────────────────────────────────

#[test]
fn sync_wrapper_runs_the_same_pipeline() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    put(input.path(), "x/y.pdf", "Y");

    let summary = convert_dir_sync(input.path(), &config_into(output.path())).unwrap();

    assert_eq!(summary.converted, 1);
    let written: PathBuf = output.path().join("x/y.txt");
    assert_eq!(std::fs::read_to_string(written).unwrap(), "text:Y");
}
