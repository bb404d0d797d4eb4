//! Package spec files (`sqlpkg.json`).
//!
//! A spec describes a package's identity, metadata and per-platform asset
//! locations. Specs are resolved from a package identifier (owner/name
//! pair, GitHub repo shorthand, URL or local path), expanded with template
//! variables and pinned to a concrete version during installation.

mod asset_path;
mod resolve;

pub use asset_path::AssetPath;
pub use resolve::{read, read_local, read_remote, ResolutionError};

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::httpx;

/// Name of the folder with installed packages.
pub const DIR_NAME: &str = ".sqlpkg";

/// The package spec filename.
pub const FILE_NAME: &str = "sqlpkg.json";

/// Default asset url templates for known providers.
fn download_base(hostname: &str) -> &'static str {
    match hostname {
        "github.com" => "{repository}/releases/download/{version}",
        _ => "",
    }
}

/// Errors specific to spec handling.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("platform is not supported")]
    PlatformNotSupported,

    #[error("asset path is not set")]
    NoAssetPath,

    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Http(#[from] httpx::HttpError),
}

/// A package spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository: String,
    /// Where the spec was actually loaded from. Runtime-only in the
    /// canonical spec document, but persisted in registry sidecars and
    /// lockfile entries so installs can be reproduced.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub specfile: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub license: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub assets: Assets,
}

/// Archives of package files, each for a specific platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<AssetPath>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pattern: String,
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksums: BTreeMap<String, String>,
}

impl Package {
    /// The owner-name pair that uniquely identifies the package.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Substitutes template variables in assets with real values.
    ///
    /// When the version is the `latest` placeholder, `{version}` expands
    /// to `{latest}` instead of a concrete value, to be replaced later
    /// when the actual version is resolved.
    pub fn expand_vars(&mut self) {
        let path_empty = self
            .assets
            .path
            .as_ref()
            .map(|p| p.value().is_empty())
            .unwrap_or(true);
        if path_empty {
            let base = download_base(&httpx::hostname(&self.repository));
            self.assets.path = Some(AssetPath::Remote(base.to_string()));
        }

        let version = if self.version == "latest" {
            "{latest}".to_string()
        } else {
            self.version.clone()
        };

        if let Some(path) = &mut self.assets.path {
            let expanded = expand(
                path.value(),
                &[
                    ("repository", &self.repository),
                    ("owner", &self.owner),
                    ("name", &self.name),
                    ("version", &version),
                ],
            );
            path.set_value(expanded);
        }
        for file in self.assets.files.values_mut() {
            *file = expand(file, &[("version", &version)]);
        }
    }

    /// Forces a specific package version instead of the `latest`
    /// placeholder, replacing every `{latest}` occurrence in the asset
    /// path and filenames.
    pub fn replace_latest(&mut self, version: &str) {
        if self.version != "latest" {
            return;
        }
        self.version = version.to_string();
        if let Some(path) = &mut self.assets.path {
            let replaced = path.value().replace("{latest}", version);
            path.set_value(replaced);
        }
        for file in self.assets.files.values_mut() {
            *file = file.replace("{latest}", version);
        }
    }

    /// Determines the asset location for a specific platform
    /// (OS + architecture).
    pub fn asset_path(&self, os: &str, arch: &str) -> Result<AssetPath, SpecError> {
        let platform = format!("{os}-{arch}");
        let asset = self
            .assets
            .files
            .get(&platform)
            .ok_or(SpecError::PlatformNotSupported)?;
        let path = match &self.assets.path {
            Some(p) if !p.value().is_empty() => p,
            _ => return Err(SpecError::NoAssetPath),
        };
        Ok(path.join(asset))
    }

    /// Writes the package spec file to the specified directory.
    pub fn save(&self, dir: &Path) -> Result<(), SpecError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(dir.join(FILE_NAME), data)?;
        Ok(())
    }
}

/// Returns the package directory under the given base path.
pub fn dir(base: &Path, owner: &str, name: &str) -> PathBuf {
    base.join(DIR_NAME).join(owner).join(name)
}

/// Returns the path to the package spec file under the given base path.
pub fn path(base: &Path, owner: &str, name: &str) -> PathBuf {
    dir(base, owner, name).join(FILE_NAME)
}

/// Substitutes `{key}` placeholders in a string.
///
/// Operates over a closed set of recognized keys supplied by the caller;
/// this is deliberately not a general templating engine.
fn expand(s: &str, vars: &[(&str, &str)]) -> String {
    let mut out = s.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Package {
        let json = r#"{
            "owner": "nalgeon",
            "name": "example",
            "version": "0.1.0",
            "homepage": "https://github.com/nalgeon/sqlite-example/blob/main/README.md",
            "repository": "https://github.com/nalgeon/sqlite-example",
            "authors": ["Anton Zhiyanov"],
            "license": "MIT",
            "description": "Example extension.",
            "keywords": ["sqlite-example"],
            "assets": {
                "path": "{repository}/releases/download/{version}",
                "files": {
                    "darwin-amd64": "example-macos-{version}-x86.zip",
                    "darwin-arm64": "example-macos-{version}-arm64.zip",
                    "linux-amd64": "example-linux-{version}-x86.zip",
                    "windows-amd64": "example-win-{version}-x64.zip"
                }
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_full_name() {
        let pkg = sample();
        assert_eq!(pkg.full_name(), "nalgeon/example");
    }

    #[test]
    fn test_parse_tags_asset_path_remote() {
        let pkg = sample();
        assert!(pkg.assets.path.as_ref().unwrap().is_remote());
    }

    #[test]
    fn test_expand_vars() {
        let mut pkg = sample();
        pkg.expand_vars();
        assert_eq!(
            pkg.assets.path.as_ref().unwrap().value(),
            "https://github.com/nalgeon/sqlite-example/releases/download/0.1.0"
        );
        assert_eq!(
            pkg.assets.files["linux-amd64"],
            "example-linux-0.1.0-x86.zip"
        );
    }

    #[test]
    fn test_expand_vars_idempotent() {
        let mut pkg = sample();
        pkg.expand_vars();
        let once = pkg.clone();
        pkg.expand_vars();
        assert_eq!(pkg, once);
    }

    #[test]
    fn test_expand_vars_infers_github_path() {
        let mut pkg = sample();
        pkg.assets.path = None;
        pkg.expand_vars();
        assert_eq!(
            pkg.assets.path.as_ref().unwrap().value(),
            "https://github.com/nalgeon/sqlite-example/releases/download/0.1.0"
        );
    }

    #[test]
    fn test_expand_vars_unknown_provider() {
        let mut pkg = sample();
        pkg.repository = "https://example.org/owner/repo".to_string();
        pkg.assets.path = None;
        pkg.expand_vars();
        assert_eq!(pkg.assets.path.as_ref().unwrap().value(), "");
    }

    #[test]
    fn test_expand_vars_latest_placeholder() {
        let mut pkg = sample();
        pkg.version = "latest".to_string();
        pkg.expand_vars();
        assert_eq!(
            pkg.assets.path.as_ref().unwrap().value(),
            "https://github.com/nalgeon/sqlite-example/releases/download/{latest}"
        );
        assert_eq!(
            pkg.assets.files["linux-amd64"],
            "example-linux-{latest}-x86.zip"
        );
    }

    #[test]
    fn test_replace_latest() {
        let mut pkg = sample();
        pkg.version = "latest".to_string();
        pkg.expand_vars();
        pkg.replace_latest("0.2.0");
        assert_eq!(pkg.version, "0.2.0");
        assert_eq!(
            pkg.assets.path.as_ref().unwrap().value(),
            "https://github.com/nalgeon/sqlite-example/releases/download/0.2.0"
        );
        assert_eq!(
            pkg.assets.files["linux-amd64"],
            "example-linux-0.2.0-x86.zip"
        );
    }

    #[test]
    fn test_replace_latest_noop_for_pinned_version() {
        let mut pkg = sample();
        pkg.expand_vars();
        let before = pkg.clone();
        pkg.replace_latest("9.9.9");
        assert_eq!(pkg, before);
    }

    #[test]
    fn test_asset_path() {
        let mut pkg = sample();
        pkg.expand_vars();
        let path = pkg.asset_path("linux", "amd64").unwrap();
        assert!(path.is_remote());
        assert_eq!(
            path.value(),
            "https://github.com/nalgeon/sqlite-example/releases/download/0.1.0/example-linux-0.1.0-x86.zip"
        );
    }

    #[test]
    fn test_asset_path_unsupported_platform() {
        let mut pkg = sample();
        pkg.expand_vars();
        let err = pkg.asset_path("plan9", "mips").unwrap_err();
        assert!(matches!(err, SpecError::PlatformNotSupported));
    }

    #[test]
    fn test_asset_path_missing_base() {
        let mut pkg = sample();
        pkg.assets.path = None;
        let err = pkg.asset_path("linux", "amd64").unwrap_err();
        assert!(matches!(err, SpecError::NoAssetPath));
    }

    #[test]
    fn test_save_round_trip() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut pkg = sample();
        pkg.specfile = "testdata/sqlpkg.json".to_string();
        pkg.save(temp.path()).unwrap();

        let back = read_local(&temp.path().join(FILE_NAME)).unwrap();
        assert_eq!(back, pkg);
    }

    #[test]
    fn test_dir_and_path() {
        let base = Path::new("/base");
        assert_eq!(
            dir(base, "nalgeon", "example"),
            PathBuf::from("/base/.sqlpkg/nalgeon/example")
        );
        assert_eq!(
            path(base, "nalgeon", "example"),
            PathBuf::from("/base/.sqlpkg/nalgeon/example/sqlpkg.json")
        );
    }

    #[test]
    fn test_expand_closed_key_set() {
        // unknown placeholders are left as-is
        assert_eq!(expand("{unknown}/x", &[("name", "y")]), "{unknown}/x");
        assert_eq!(expand("hello, {name}", &[("name", "world")]), "hello, world");
    }
}
