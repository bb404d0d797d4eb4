//! Package asset acquisition and unpacking.
//!
//! An asset is a single file (usually an archive) holding one platform's
//! package payload. Assets are downloaded or copied into a scratch
//! directory, validated against a checksum, and unpacked in place.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use glob::Pattern;
use tar::Archive;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

use crate::{fileio, httpx};

/// Errors acquiring, validating or unpacking an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid url")]
    InvalidUrl,

    #[error("unsupported checksum algorithm")]
    UnsupportedChecksum,

    #[error("failed to decode checksum string")]
    InvalidChecksumString,

    #[error("invalid extraction pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Http(#[from] httpx::HttpError),

    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),
}

/// A downloaded or copied package asset for a specific platform.
#[derive(Debug, Clone)]
pub struct Asset {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub checksum: Vec<u8>,
}

impl Asset {
    /// The directory the asset resides in.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Compares the asset checksum against a `sha256-<hex>` string.
    pub fn validate(&self, checksum_str: &str) -> Result<bool, AssetError> {
        let (algo, hex_str) = checksum_str
            .split_once('-')
            .ok_or(AssetError::UnsupportedChecksum)?;
        if algo != "sha256" {
            return Err(AssetError::UnsupportedChecksum);
        }
        let expected = hex::decode(hex_str).map_err(|_| AssetError::InvalidChecksumString)?;
        Ok(self.checksum == expected)
    }
}

/// Downloads an asset from the remote url into the local dir.
pub fn download(dir: &Path, raw_url: &str) -> Result<Asset, AssetError> {
    let url = reqwest::Url::parse(raw_url).map_err(|_| AssetError::InvalidUrl)?;
    let name = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|s| !s.is_empty())
        .ok_or(AssetError::InvalidUrl)?
        .to_string();
    let path = dir.join(&name);

    let mut body = httpx::get_body(raw_url, "application/octet-stream")?;
    let mut file = BufWriter::new(File::create(&path)?);
    let size = io::copy(&mut body, &mut file)?;
    drop(file);

    let checksum = fileio::calc_checksum(&path)?;
    Ok(Asset {
        name,
        path,
        size,
        checksum,
    })
}

/// Copies an asset from a local path into the local dir.
pub fn copy(dir: &Path, src: &Path) -> Result<Asset, AssetError> {
    let name = src
        .file_name()
        .ok_or(AssetError::InvalidUrl)?
        .to_string_lossy()
        .into_owned();
    let path = dir.join(&name);
    let size = fileio::copy_file(src, &path)?;
    let checksum = fileio::calc_checksum(&path)?;
    Ok(Asset {
        name,
        path,
        size,
        checksum,
    })
}

/// Unpacks an asset into the directory where the asset resides.
///
/// Dispatches on the filename suffix: `.zip` and `.tar.gz`/`.tgz` are
/// extracted, anything else is treated as "not an archive" and yields a
/// zero file count so single-file assets pass through untouched.
///
/// If a non-empty glob `pattern` is supplied, only archive members whose
/// stored name matches it are written. Members are extracted flat: each
/// one lands next to the archive under its base name, and directory
/// entries are skipped.
///
/// Returns the number of files written.
pub fn unpack(path: &Path, pattern: &str) -> Result<usize, AssetError> {
    let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
    let name = path.to_string_lossy();
    if name.ends_with(".zip") {
        return unpack_zip(path, pattern, &dir);
    }
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        return unpack_tar_gz(path, pattern, &dir);
    }
    debug!(asset = %path.display(), "not an archive, skipping unpack");
    Ok(0)
}

fn compile_pattern(pattern: &str) -> Result<Option<Pattern>, AssetError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Ok(Some(Pattern::new(pattern)?))
}

/// Flat extraction target for an archive member.
fn member_dest(dir: &Path, member: &str) -> Option<PathBuf> {
    let base = Path::new(member).file_name()?;
    Some(dir.join(base))
}

fn unpack_zip(path: &Path, pattern: &str, dir: &Path) -> Result<usize, AssetError> {
    let pattern = compile_pattern(pattern)?;
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut count = 0;
    for i in 0..archive.len() {
        let mut member = archive.by_index(i)?;
        if member.is_dir() {
            continue;
        }
        let name = member.name().to_string();
        if let Some(p) = &pattern {
            if !p.matches(&name) {
                continue;
            }
        }
        let Some(dest) = member_dest(dir, &name) else {
            continue;
        };
        let mut file = File::create(&dest)?;
        io::copy(&mut member, &mut file)?;
        count += 1;
    }
    Ok(count)
}

fn unpack_tar_gz(path: &Path, pattern: &str, dir: &Path) -> Result<usize, AssetError> {
    let pattern = compile_pattern(pattern)?;
    let mut archive = Archive::new(GzDecoder::new(File::open(path)?));
    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().into_owned();
        if let Some(p) = &pattern {
            if !p.matches(&name) {
                continue;
            }
        }
        let Some(dest) = member_dest(dir, &name) else {
            continue;
        };
        let mut file = File::create(&dest)?;
        io::copy(&mut entry, &mut file)?;
        count += 1;
    }
    Ok(count)
}
