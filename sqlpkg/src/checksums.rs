//! Asset checksum manifests (`checksums.txt`).
//!
//! A checksum manifest is a plain-text sibling of the package assets:
//! one `<sha-256 hex>  <filename>` record per line. Parsed values are
//! normalized to `sha256-<hex>` strings.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::httpx;
use crate::spec::AssetPath;

/// The checksum manifest filename.
pub const FILE_NAME: &str = "checksums.txt";

/// Errors reading or parsing a checksum manifest.
#[derive(Debug, Error)]
pub enum ChecksumError {
    #[error("invalid checksum file")]
    InvalidFile,

    #[error("invalid checksum value")]
    InvalidSum,

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Http(#[from] httpx::HttpError),
}

/// Checks if a checksum manifest exists at the given location, so callers
/// can treat a missing manifest as a non-fatal skip.
pub fn exists(path: &AssetPath) -> bool {
    path.exists()
}

/// Loads asset checksums from a local or remote manifest into a map,
/// where keys are filenames and values are `sha256-<hex>` strings.
pub fn read(path: &AssetPath) -> Result<BTreeMap<String, String>, ChecksumError> {
    let data = match path {
        AssetPath::Remote(url) => httpx::get_bytes(url)?,
        AssetPath::Local(p) => fs::read(Path::new(p))?,
    };
    parse(&String::from_utf8_lossy(&data))
}

/// Parses checksum data into a map, where keys are filenames and values
/// are checksums.
///
/// Expects data in the following format:
///
/// ```text
/// 5072e5737...(sha-256 checksum)  sqlean-linux-x86.zip
/// f86f443ac...(sha-256 checksum)  sqlean-macos-arm64.zip
/// ```
fn parse(data: &str) -> Result<BTreeMap<String, String>, ChecksumError> {
    let mut sums = BTreeMap::new();
    for line in data.lines() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(sum), Some(file), None) = (fields.next(), fields.next(), fields.next()) else {
            // want `checksum filename` line format
            return Err(ChecksumError::InvalidFile);
        };
        if sum.len() != 64 {
            // want a sha-256 checksum
            return Err(ChecksumError::InvalidSum);
        }
        sums.insert(file.to_string(), format!("sha256-{}", sum.to_lowercase()));
    }
    Ok(sums)
}
