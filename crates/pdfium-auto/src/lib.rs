//! # pdfium-auto
//!
//! Find a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, downloading one into a per-user cache when
//! nothing is installed.
//!
//! ## Resolution order
//!
//! [`locate`] walks the following sources and stops at the first hit:
//!
//! 1. `PDFIUM_LIB_PATH`: an explicit path. If it is set but points nowhere,
//!    that is an error; there is no silent fallback.
//! 2. The cache directory ([`cache_dir`]) from a previous download.
//! 3. A PDFium library installed on the system library path.
//! 4. A fresh download from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    only when the caller allows it.
//!
//! ```rust,no_run
//! use pdfium_auto::{bind, locate};
//!
//! let (location, source) = locate(true, None).expect("PDFium unavailable");
//! eprintln!("using {location} ({source})");
//! let pdfium = bind(&location).expect("bind failed");
//! ```
//!
//! ## Environment variables
//!
//! - `PDFIUM_LIB_PATH`: path to an existing pdfium library.
//! - `PDFIUM_AUTO_CACHE_DIR`: override the cache root.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Progress hook: `(bytes_downloaded, total_bytes_if_known)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("Unsupported platform for PDFium download: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("PDFIUM_LIB_PATH points to '{0}', which does not exist")]
    OverrideMissing(PathBuf),

    #[error("PDFium library not found (searched: {searched}) and downloading is disabled")]
    NotFound { searched: String },

    #[error("Cannot prepare cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDFium download failed: {0}")]
    Download(String),

    #[error("PDFium archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from {location}: {reason}")]
    Bind { location: String, reason: String },
}

/// Where the PDFium library lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryLocation {
    /// A specific shared library file.
    File(PathBuf),
    /// Whatever the dynamic loader finds on the system search path.
    System,
}

impl fmt::Display for LibraryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryLocation::File(p) => write!(f, "{}", p.display()),
            LibraryLocation::System => f.write_str("system library path"),
        }
    }
}

/// Which resolution step produced the [`LibraryLocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibrarySource {
    EnvOverride,
    Cache,
    System,
    Downloaded,
}

impl fmt::Display for LibrarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LibrarySource::EnvOverride => "PDFIUM_LIB_PATH",
            LibrarySource::Cache => "cache",
            LibrarySource::System => "system",
            LibrarySource::Downloaded => "downloaded",
        })
    }
}

/// Release asset for the running platform.
#[derive(Debug)]
struct PlatformAsset {
    /// e.g. `pdfium-linux-x64.tgz`
    archive: String,
    /// e.g. `lib/libpdfium.so`
    member: String,
    /// e.g. `libpdfium.so`
    file_name: &'static str,
}

fn platform_asset() -> Result<PlatformAsset, PdfiumAutoError> {
    platform_asset_for(std::env::consts::OS, std::env::consts::ARCH)
}

fn platform_asset_for(os: &str, arch: &str) -> Result<PlatformAsset, PdfiumAutoError> {
    let unsupported = || PdfiumAutoError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    };

    let (os_tag, dir, file_name) = match os {
        "macos" => ("mac", "lib", "libpdfium.dylib"),
        "linux" => ("linux", "lib", "libpdfium.so"),
        "windows" => ("win", "bin", "pdfium.dll"),
        _ => return Err(unsupported()),
    };
    let arch_tag = match (os, arch) {
        (_, "x86_64") => "x64",
        (_, "aarch64") => "arm64",
        ("windows", "x86") => "x86",
        _ => return Err(unsupported()),
    };

    Ok(PlatformAsset {
        archive: format!("pdfium-{os_tag}-{arch_tag}.tgz"),
        member: format!("{dir}/{file_name}"),
        file_name,
    })
}

/// Per-version cache directory for downloaded libraries.
///
/// Defaults to `<platform cache dir>/pdf2txt/pdfium-{VERSION}`; override the
/// root with `PDFIUM_AUTO_CACHE_DIR`.
pub fn cache_dir() -> PathBuf {
    let root = match std::env::var_os("PDFIUM_AUTO_CACHE_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join("pdf2txt"),
    };
    root.join(format!("pdfium-{PDFIUM_VERSION}"))
}

/// Find a PDFium library, downloading it when `allow_download` is set and
/// nothing else is available.
pub fn locate(
    allow_download: bool,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<(LibraryLocation, LibrarySource), PdfiumAutoError> {
    if let Some(path) = std::env::var_os("PDFIUM_LIB_PATH").filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        if !path.is_file() {
            return Err(PdfiumAutoError::OverrideMissing(path));
        }
        return Ok((LibraryLocation::File(path), LibrarySource::EnvOverride));
    }

    let asset = platform_asset();
    let cached = asset.as_ref().ok().map(|a| cache_dir().join(a.file_name));
    if let Some(ref path) = cached {
        if path.is_file() {
            return Ok((LibraryLocation::File(path.clone()), LibrarySource::Cache));
        }
    }

    if Pdfium::bind_to_system_library().is_ok() {
        return Ok((LibraryLocation::System, LibrarySource::System));
    }

    if !allow_download {
        let mut searched = vec!["PDFIUM_LIB_PATH".to_string()];
        if let Some(path) = cached {
            searched.push(path.display().to_string());
        }
        searched.push("system library path".to_string());
        return Err(PdfiumAutoError::NotFound {
            searched: searched.join(", "),
        });
    }

    let asset = asset?;
    let path = download_to_cache(&asset, on_progress)?;
    Ok((LibraryLocation::File(path), LibrarySource::Downloaded))
}

/// Bind to the library at `location` and initialise PDFium.
pub fn bind(location: &LibraryLocation) -> Result<Pdfium, PdfiumAutoError> {
    let bindings = match location {
        LibraryLocation::File(path) => Pdfium::bind_to_library(path),
        LibraryLocation::System => Pdfium::bind_to_system_library(),
    };
    bindings.map(Pdfium::new).map_err(|e| PdfiumAutoError::Bind {
        location: location.to_string(),
        reason: format!("{e:?}"),
    })
}

fn download_to_cache(
    asset: &PlatformAsset,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<PathBuf, PdfiumAutoError> {
    let dir = cache_dir();
    std::fs::create_dir_all(&dir).map_err(|source| PdfiumAutoError::CacheDir {
        path: dir.clone(),
        source,
    })?;

    let url = format!("{RELEASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", asset.archive);
    let archive = fetch(&url, on_progress)?;

    let dest = dir.join(asset.file_name);
    extract_member(&archive, &asset.member, &dest)?;
    Ok(dest)
}

fn fetch(url: &str, on_progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("read error: {e}"))),
        };
        body.extend_from_slice(&chunk[..n]);
        if let Some(cb) = on_progress {
            cb(body.len() as u64, total);
        }
    }
    Ok(body)
}

/// Unpack `member` from a `.tgz` archive into `dest`.
///
/// The file is unpacked next to `dest` and renamed into place, so a crash
/// mid-extraction never leaves a truncated library in the cache.
fn extract_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    let entries = tar
        .entries()
        .map_err(|e| PdfiumAutoError::Extract(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| PdfiumAutoError::Extract(e.to_string()))?;
        let matches = entry
            .path()
            .map(|p| p.to_string_lossy().trim_start_matches("./") == member)
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let partial = dest.with_extension("partial");
        entry
            .unpack(&partial)
            .map_err(|e| PdfiumAutoError::Extract(format!("unpack {member}: {e}")))?;
        return std::fs::rename(&partial, dest)
            .map_err(|e| PdfiumAutoError::Extract(format!("install {}: {e}", dest.display())));
    }

    Err(PdfiumAutoError::Extract(format!(
        "'{member}' not found in archive"
    )))
}
