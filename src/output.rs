//! Result types returned by a run.
//!
//! [`FileReport`] doubles as the operator log line: its `Display` form is
//! `OK <relpath>` or `ERR <relpath>: <reason>`.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// What happened to one discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Text extracted and written to `output_path`.
    Converted { output_path: PathBuf, chars: usize },
    /// Nothing was written for this file.
    Failed { error: FileError },
}

/// Per-file entry of a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// Path relative to the input root.
    pub relative_path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FileOutcome::Converted { .. })
    }

    pub fn error(&self) -> Option<&FileError> {
        match &self.outcome {
            FileOutcome::Failed { error } => Some(error),
            FileOutcome::Converted { .. } => None,
        }
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rel = slash_path(&self.relative_path);
        match &self.outcome {
            FileOutcome::Converted { .. } => write!(f, "OK {rel}"),
            FileOutcome::Failed { error } => write!(f, "ERR {rel}: {error}"),
        }
    }
}

/// Render a relative path with `/` separators on every platform.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Aggregate result of [`crate::convert::convert_dir`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Matching files found.
    pub discovered: usize,
    /// Files whose text was written.
    pub converted: usize,
    /// Files that produced no output.
    pub failed: usize,
    /// One entry per discovered file, in processing order.
    pub files: Vec<FileReport>,
    /// Wall-clock time for the whole run.
    pub duration_ms: u64,
}

impl RunSummary {
    /// The closing log line.
    pub fn summary_line(&self) -> String {
        format!("Done. {} converted, {} failed", self.converted, self.failed)
    }
}
