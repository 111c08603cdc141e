//! File discovery: lazily walk the input root for files with the target
//! extension.
//!
//! The walk is sorted by file name so runs over the same tree log files in
//! the same order. The output root is pruned when it sits inside the input
//! root (the default `<input>/text-output` does).

use crate::config::ExtractionConfig;
use crate::error::Pdf2TxtError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, FilterEntry, WalkDir};

/// A regular file under the input root whose name carries the target extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// `path` relative to the input root.
    pub relative: PathBuf,
}

/// Options controlling a walk.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Suffix including the dot, e.g. `.pdf`. Matched ASCII case-insensitively.
    pub suffix: String,
    /// Traverse symlinked directories.
    pub follow_links: bool,
    /// Directory to skip entirely.
    pub exclude: Option<PathBuf>,
}

impl DiscoveryOptions {
    pub fn from_config(config: &ExtractionConfig, output_root: &Path) -> Self {
        Self {
            suffix: config.suffix(),
            follow_links: config.follow_links,
            exclude: Some(output_root.to_path_buf()),
        }
    }
}

type EntryFilter = Box<dyn FnMut(&DirEntry) -> bool + Send>;

/// Lazy, single-pass iterator over matching files.
pub struct DiscoveredFiles {
    root: PathBuf,
    suffix: String,
    walk: FilterEntry<walkdir::IntoIter, EntryFilter>,
}

impl Iterator for DiscoveredFiles {
    type Item = DiscoveredFile;

    fn next(&mut self) -> Option<DiscoveredFile> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    // Unreadable subdirectory or symlink loop: skip it, keep walking.
                    warn!("Skipping entry during discovery: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !has_suffix(entry.file_name(), &self.suffix) {
                continue;
            }

            let path = entry.into_path();
            let relative = match path.strip_prefix(&self.root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };
            debug!("Discovered {}", relative.display());
            return Some(DiscoveredFile { path, relative });
        }
    }
}

/// Check that `root` is an existing, listable directory.
pub fn check_root(root: &Path) -> Result<(), Pdf2TxtError> {
    let meta = std::fs::metadata(root)
        .map_err(|e| Pdf2TxtError::from_input_io(root.to_path_buf(), &e))?;
    if !meta.is_dir() {
        return Err(Pdf2TxtError::InputNotADirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(|e| Pdf2TxtError::from_input_io(root.to_path_buf(), &e))?;
    Ok(())
}

/// Start a walk of `root`.
///
/// Fails up front if `root` is missing, not a directory, or unreadable.
/// Problems deeper in the tree are logged and skipped while iterating.
pub fn discover(root: &Path, options: &DiscoveryOptions) -> Result<DiscoveredFiles, Pdf2TxtError> {
    let root = std::path::absolute(root)
        .map_err(|e| Pdf2TxtError::from_input_io(root.to_path_buf(), &e))?;
    check_root(&root)?;
    // Walk the resolved root so entry paths compare against a resolved exclude.
    let root = std::fs::canonicalize(&root)
        .map_err(|e| Pdf2TxtError::from_input_io(root.clone(), &e))?;

    let exclude = options
        .exclude
        .as_ref()
        .and_then(|p| std::fs::canonicalize(p).ok());
    let follow_links = options.follow_links;
    let filter: EntryFilter = Box::new(move |entry: &DirEntry| match exclude {
        Some(ref skip) => !is_excluded(entry, skip, follow_links),
        None => true,
    });

    let walk = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(options.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(filter);

    Ok(DiscoveredFiles {
        root,
        suffix: options.suffix.clone(),
        walk,
    })
}

/// Whether `entry` is the already-resolved directory `skip`.
///
/// Without link following every walked path under the resolved root is
/// itself resolved, so a path comparison suffices. With it, a directory may
/// be reached through a symlink and has to be resolved first.
fn is_excluded(entry: &DirEntry, skip: &Path, follow_links: bool) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    if entry.path() == skip {
        return true;
    }
    follow_links && std::fs::canonicalize(entry.path()).is_ok_and(|p| p == skip)
}

/// Whether `name` ends with `suffix`, ignoring ASCII case.
pub fn has_suffix(name: &OsStr, suffix: &str) -> bool {
    let name = name.to_string_lossy();
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options(exclude: Option<PathBuf>) -> DiscoveryOptions {
        DiscoveryOptions {
            suffix: ".pdf".into(),
            follow_links: false,
            exclude,
        }
    }

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, b"%PDF-1.4").unwrap();
    }

    fn relatives(files: DiscoveredFiles) -> Vec<String> {
        let mut v: Vec<String> = files
            .map(|f| crate::output::slash_path(&f.relative))
            .collect();
        v.sort();
        v
    }

    #[test]
    fn suffix_match_ignores_case() {
        assert!(has_suffix(OsStr::new("a.pdf"), ".pdf"));
        assert!(has_suffix(OsStr::new("a.PDF"), ".pdf"));
        assert!(has_suffix(OsStr::new("a.Pdf"), ".pdf"));
        assert!(has_suffix(OsStr::new(".pdf"), ".pdf"));
        assert!(!has_suffix(OsStr::new("a.pdfx"), ".pdf"));
        assert!(!has_suffix(OsStr::new("apdf"), ".pdf"));
        assert!(!has_suffix(OsStr::new("pdf"), ".pdf"));
        assert!(!has_suffix(OsStr::new("é.txt"), ".pdf"));
    }

    #[test]
    fn finds_nested_files_only_once() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.pdf");
        touch(dir.path(), "x/b.PDF");
        touch(dir.path(), "x/y/z/c.pdf");
        touch(dir.path(), "x/notes.txt");
        touch(dir.path(), "x/y/d.pdf.bak");
        fs::create_dir_all(dir.path().join("folder.pdf")).unwrap();

        let files = discover(dir.path(), &options(None)).unwrap();
        assert_eq!(relatives(files), vec!["a.pdf", "x/b.PDF", "x/y/z/c.pdf"]);
    }

    #[test]
    fn paths_are_absolute_and_consistent() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "sub/a.pdf");

        let found: Vec<_> = discover(dir.path(), &options(None)).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert!(found[0].path.is_absolute());
        assert!(found[0].path.ends_with(&found[0].relative));
    }

    #[test]
    fn excluded_directory_is_pruned() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep.pdf");
        touch(dir.path(), "text-output/stale.pdf");

        let exclude = std::path::absolute(dir.path().join("text-output")).unwrap();
        let files = discover(dir.path(), &options(Some(exclude))).unwrap();
        assert_eq!(relatives(files), vec!["keep.pdf"]);
    }

    #[test]
    fn excluded_directory_is_pruned_however_spelled() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep.pdf");
        touch(dir.path(), "out/stale.pdf");
        let name = dir.path().file_name().unwrap();

        let dotted = dir.path().join("..").join(name).join("./out");
        let files = discover(dir.path(), &options(Some(dotted))).unwrap();
        assert_eq!(relatives(files), vec!["keep.pdf"]);
    }

    #[cfg(unix)]
    #[test]
    fn excluded_directory_is_pruned_through_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep.pdf");
        touch(dir.path(), "out/stale.pdf");
        std::os::unix::fs::symlink(dir.path().join("out"), dir.path().join("alias")).unwrap();

        let mut follow = options(Some(dir.path().join("alias")));
        follow.follow_links = true;
        let found = relatives(discover(dir.path(), &follow).unwrap());
        assert_eq!(found, vec!["keep.pdf"]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("nope"), &options(None))
            .err()
            .expect("missing root must fail");
        assert!(matches!(err, Pdf2TxtError::InputNotFound { .. }), "got {err:?}");
    }

    #[test]
    fn file_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.pdf");
        let err = discover(&dir.path().join("a.pdf"), &options(None))
            .err()
            .expect("file root must fail");
        assert!(matches!(err, Pdf2TxtError::InputNotADirectory { .. }));
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(discover(dir.path(), &options(None)).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_dirs_followed_only_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        touch(outside.path(), "linked.pdf");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        // A loop back to the root must not hang the walk.
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        assert_eq!(discover(dir.path(), &options(None)).unwrap().count(), 0);

        let mut follow = options(None);
        follow.follow_links = true;
        let found = relatives(discover(dir.path(), &follow).unwrap());
        assert_eq!(found, vec!["link/linked.pdf"]);
    }
}
