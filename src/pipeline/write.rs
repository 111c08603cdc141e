//! Output writing: mirror the input tree under the output root.
//!
//! `<input>/a/b/c.PDF` becomes `<output>/a/b/c.txt`. Writes go to a sibling
//! `.tmp` file that is renamed into place, so a reader never sees a
//! half-written text file and a rerun simply replaces the previous one.

use crate::error::FileError;
use crate::output::{FileOutcome, FileReport};
use crate::pipeline::discover::{has_suffix, DiscoveredFile};
use crate::pipeline::extract::ConversionResult;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension given to every output file.
pub const OUTPUT_EXTENSION: &str = "txt";

/// Where the text for `file` goes.
///
/// The matched `suffix` is replaced (case-insensitively) by `.txt`.
pub fn output_path_for(output_root: &Path, file: &DiscoveredFile, suffix: &str) -> PathBuf {
    let rel = &file.relative;
    let renamed = match rel.file_name() {
        Some(name) if has_suffix(name, suffix) => {
            let name = name.to_string_lossy();
            let stem = &name[..name.len() - suffix.len()];
            rel.with_file_name(format!("{stem}.{OUTPUT_EXTENSION}"))
        }
        _ => rel.with_extension(OUTPUT_EXTENSION),
    };
    output_root.join(renamed)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(".tmp");
    PathBuf::from(s)
}

/// Write `text` as the full contents of `path`, creating parent directories.
///
/// Atomic write: write to temp, then rename over any existing file.
pub async fn write_text(path: &Path, text: &str) -> Result<(), FileError> {
    let fail = |e: std::io::Error| FileError::WriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let tmp = tmp_path(path);
    let written = match tokio::fs::write(&tmp, text).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(fail(e));
    }
    Ok(())
}

/// Write a successful conversion and build the file's report.
///
/// A failed conversion writes nothing and is reported as-is.
pub async fn write_result(
    output_root: &Path,
    suffix: &str,
    file: &DiscoveredFile,
    result: ConversionResult,
) -> FileReport {
    let outcome = match result {
        Ok(text) => {
            let output_path = output_path_for(output_root, file, suffix);
            match write_text(&output_path, &text).await {
                Ok(()) => {
                    debug!("Wrote {}", output_path.display());
                    FileOutcome::Converted {
                        output_path,
                        chars: text.chars().count(),
                    }
                }
                Err(error) => FileOutcome::Failed { error },
            }
        }
        Err(error) => FileOutcome::Failed { error },
    };

    FileReport {
        relative_path: file.relative.clone(),
        outcome,
    }
}
