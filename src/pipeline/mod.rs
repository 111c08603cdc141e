//! Pipeline stages for directory-to-text extraction.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the extraction engine can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ extract ──▶ write
//! (walkdir)    (PDFium)    (mirrored .txt tree)
//! ```
//!
//! 1. [`discover`]: walk the input root lazily, yielding matching files
//! 2. [`extract`] : read one file and hand its bytes to a [`extract::TextExtractor`];
//!    any failure becomes a per-file error, never a fatal one
//! 3. [`write`]   : map the file's relative path under the output root and
//!    write the text atomically

pub mod discover;
pub mod extract;
pub mod write;
