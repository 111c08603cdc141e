//! Configuration types for a batch extraction run.
//!
//! Every knob lives in [`ExtractionConfig`], built via
//! [`ExtractionConfigBuilder`]. Callers set only what they care about and
//! rely on the documented defaults for the rest.

use crate::error::Pdf2TxtError;
use crate::pipeline::extract::TextExtractor;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the output directory created inside the input root when no
/// output root is given.
pub const DEFAULT_OUTPUT_DIR: &str = "text-output";

/// Configuration for a directory extraction run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2txt::{ExtractionConfig, PageSeparator};
///
/// let config = ExtractionConfig::builder()
///     .output_root("/tmp/texts")
///     .page_separator(PageSeparator::FormFeed)
///     .build()
///     .unwrap();
/// assert_eq!(config.extension, "pdf");
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Where the mirrored `.txt` tree goes. Default: `<input>/text-output`.
    pub output_root: Option<PathBuf>,

    /// File extension to collect, without the dot, matched ASCII
    /// case-insensitively. Default: `pdf`.
    pub extension: String,

    /// PDF user password applied to every document.
    pub password: Option<String>,

    /// Text inserted between consecutive pages. Default: a blank line.
    pub page_separator: PageSeparator,

    /// Traverse symlinked directories. Default: false.
    ///
    /// When enabled, symlink loops are detected and skipped with a warning.
    pub follow_links: bool,

    /// Allow downloading PDFium when no local copy is found. Default: true.
    pub allow_download: bool,

    /// Pre-constructed extractor. Takes precedence over binding PDFium.
    pub extractor: Option<Arc<dyn TextExtractor>>,

    /// Per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            output_root: None,
            extension: "pdf".to_string(),
            password: None,
            page_separator: PageSeparator::default(),
            follow_links: false,
            allow_download: true,
            extractor: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("output_root", &self.output_root)
            .field("extension", &self.extension)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("page_separator", &self.page_separator)
            .field("follow_links", &self.follow_links)
            .field("allow_download", &self.allow_download)
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn TextExtractor>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The output root for `input_root`: the configured one, or
    /// `<input_root>/text-output`.
    pub fn resolve_output_root(&self, input_root: &Path) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| input_root.join(DEFAULT_OUTPUT_DIR))
    }

    /// The file-name suffix being matched, e.g. `.pdf`.
    pub fn suffix(&self) -> String {
        format!(".{}", self.extension)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_root = Some(path.into());
        self
    }

    /// Extension to collect. A leading dot is accepted and stripped.
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.config.extension = ext.into();
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn follow_links(mut self, v: bool) -> Self {
        self.config.follow_links = v;
        self
    }

    pub fn allow_download(mut self, v: bool) -> Self {
        self.config.allow_download = v;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, normalising and validating the extension.
    pub fn build(mut self) -> Result<ExtractionConfig, Pdf2TxtError> {
        let ext = self.config.extension.trim().trim_start_matches('.').to_string();
        if ext.is_empty() {
            return Err(Pdf2TxtError::InvalidConfig(
                "Extension must not be empty".into(),
            ));
        }
        if ext.contains(['/', '\\']) {
            return Err(Pdf2TxtError::InvalidConfig(format!(
                "Extension must not contain path separators, got '{ext}'"
            )));
        }
        self.config.extension = ext;
        Ok(self.config)
    }
}

/// How consecutive pages are joined in the extracted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// A blank line, `"\n\n"`. (default)
    #[default]
    Blank,
    /// Pages concatenated directly.
    None,
    /// ASCII form feed, `"\x0c"`, the pdftotext convention.
    FormFeed,
    /// Custom string inserted verbatim.
    Custom(String),
}

impl PageSeparator {
    pub fn as_str(&self) -> &str {
        match self {
            PageSeparator::Blank => "\n\n",
            PageSeparator::None => "",
            PageSeparator::FormFeed => "\x0c",
            PageSeparator::Custom(s) => s,
        }
    }
}
