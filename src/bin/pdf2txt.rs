//! CLI binary for edgequake-pdf2txt.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, acquires the PDF engine up front and prints the
//! operator log.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2txt::{
    convert_dir, ConversionProgressCallback, ExtractionConfig, FileReport, PageSeparator,
    PdfiumExtractor, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Operator log + progress bar ──────────────────────────────────────────────

/// Prints one `OK`/`ERR` line per file and, on a terminal, keeps a progress
/// bar pinned below the log.
struct CliReporter {
    /// Present only when stderr is a terminal and progress is enabled.
    bar: Option<ProgressBar>,
    /// Colour the line prefixes.
    color: bool,
    /// Only print failures.
    quiet: bool,
    /// Keep stdout clean for `--json`.
    ok_to_stderr: bool,
    /// e.g. "PDF"
    label: String,
}

impl CliReporter {
    fn new(show_progress: bool, quiet: bool, json: bool, extension: &str) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>4}/{len} files  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);
            bar.set_style(style);
            bar.set_prefix("Extracting");
            bar
        });

        Arc::new(Self {
            bar,
            color: std::io::stderr().is_terminal(),
            quiet,
            ok_to_stderr: json,
            label: extension.to_uppercase(),
        })
    }

    fn info(&self, line: String) {
        if self.quiet {
            return;
        }
        match (&self.bar, self.ok_to_stderr) {
            (Some(bar), _) => bar.println(line),
            (None, true) => eprintln!("{line}"),
            (None, false) => println!("{line}"),
        }
    }

    fn error(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl ConversionProgressCallback for CliReporter {
    fn on_run_start(&self, total_files: usize) {
        if total_files == 0 {
            self.finish();
            self.info(format!("No {} files found.", self.label));
            return;
        }
        self.info(format!("Found {} {} files", total_files, self.label));
        if let Some(ref bar) = self.bar {
            bar.set_length(total_files as u64);
            bar.enable_steady_tick(Duration::from_millis(80));
        }
    }

    fn on_file_start(&self, relative: &Path, _index: usize, _total: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_message(relative.display().to_string());
        }
    }

    fn on_file_complete(&self, report: &FileReport, _index: usize, _total: usize) {
        let line = report.to_string();
        self.info(if self.color {
            line.replacen("OK", &green("OK"), 1)
        } else {
            line
        });
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn on_file_error(&self, report: &FileReport, _index: usize, _total: usize) {
        let line = report.to_string();
        self.error(if self.color {
            line.replacen("ERR", &red("ERR"), 1)
        } else {
            line
        });
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn on_run_complete(&self, _total_files: usize, _success_count: usize) {
        self.finish();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract every PDF under ./papers into ./papers/text-output
  pdf2txt papers

  # Mirror into a separate tree
  pdf2txt ~/Documents/scans ~/texts

  # Separate pages with form feeds (pdftotext style)
  pdf2txt --separator formfeed papers out

  # Machine-readable run summary
  pdf2txt --json papers > summary.json

OUTPUT:
  papers/2024/report.PDF  →  <output>/2024/report.txt
  One line per file: "OK <path>" on stdout, "ERR <path>: <reason>" on stderr.
  A file that fails is skipped; the exit code stays 0.

EXIT CODES:
  0  run completed (including "no files found" and per-file failures)
  1  missing argument, unreadable input, output not creatable,
     or PDF engine unavailable

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips lookup and download
  PDFIUM_AUTO_CACHE_DIR   Override the PDFium cache directory
  RUST_LOG                Log filter (e.g. edgequake_pdf2txt=debug)

SETUP:
  PDFium (~30 MB) is looked up on the system and otherwise downloaded on
  first run into ~/.cache/pdf2txt/pdfium-7690/. Use --no-download to forbid it.
"#;

/// Extract plain text from every PDF under a directory.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2txt",
    version,
    about = "Extract plain text from every PDF under a directory into a mirrored tree",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory to scan recursively.
    input: PathBuf,

    /// Output directory [default: <INPUT>/text-output].
    output: Option<PathBuf>,

    /// File extension to collect (case-insensitive).
    #[arg(short, long, env = "PDF2TXT_EXTENSION", default_value = "pdf")]
    extension: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2TXT_PASSWORD")]
    password: Option<String>,

    /// Page separator: blank, none, formfeed, or a custom string.
    #[arg(long, env = "PDF2TXT_SEPARATOR", default_value = "blank")]
    separator: String,

    /// Follow symlinked directories (loops are detected and skipped).
    #[arg(long, env = "PDF2TXT_FOLLOW_LINKS")]
    follow_links: bool,

    /// Never download PDFium; fail if no local copy is found.
    #[arg(long, env = "PDF2TXT_NO_DOWNLOAD")]
    no_download: bool,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2TXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2TXT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit with 1 rather than clap's default of 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar and operator log cover normal feedback; library
    // logs only surface on request or when there is no bar to watch.
    let show_progress = !cli.quiet && !cli.no_progress && std::io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli, None)?;

    // ── Acquire the PDF engine before touching the filesystem ────────────
    // Locating may download PDFium on first run; block_in_place keeps the
    // progress closure borrow valid without a 'static bound.
    let extractor = if show_progress {
        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        dl_bar.set_prefix("PDF engine");

        let bar = dl_bar.clone();
        let result = tokio::task::block_in_place(|| {
            PdfiumExtractor::from_config(
                &config,
                Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length() != Some(t) {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }),
            )
        });
        dl_bar.finish_and_clear();
        result
    } else {
        tokio::task::block_in_place(|| PdfiumExtractor::from_config(&config, None))
    }
    .context("Cannot start: PDF text engine unavailable")?;

    let reporter = CliReporter::new(show_progress, cli.quiet, cli.json, &config.extension);
    let mut config = build_config(&cli, Some(reporter.clone() as ProgressCallback))?;
    config.extractor = Some(Arc::new(extractor));

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = convert_dir(&cli.input, &config)
        .await
        .context("Extraction failed")?;

    if summary.discovered > 0 {
        let elapsed = format!("({}ms)", summary.duration_ms);
        reporter.info(if reporter.color {
            format!("{}  {}", bold(&summary.summary_line()), dim(&elapsed))
        } else {
            format!("{}  {}", summary.summary_line(), elapsed)
        });
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .extension(cli.extension.clone())
        .page_separator(parse_separator(&cli.separator))
        .follow_links(cli.follow_links)
        .allow_download(!cli.no_download);

    if let Some(ref output) = cli.output {
        builder = builder.output_root(output.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--separator` into `PageSeparator`.
///
/// Custom separators accept `\n` and `\f` escapes.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "blank" => PageSeparator::Blank,
        "none" | "" => PageSeparator::None,
        "formfeed" | "ff" => PageSeparator::FormFeed,
        _ => PageSeparator::Custom(s.replace("\\n", "\n").replace("\\f", "\x0c")),
    }
}
