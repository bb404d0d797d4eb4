//! Error types for package management operations.

use std::io;

use crate::assets::AssetError;
use crate::checksums::ChecksumError;
use crate::github::GithubError;
use crate::lockfile::LockfileError;
use crate::spec::SpecError;

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors that can occur during package management operations.
#[derive(Debug)]
pub enum ManagerError {
    /// The package spec could not be resolved or parsed.
    SpecReadFailed(SpecError),

    /// The latest release version could not be resolved.
    VersionResolveFailed(GithubError),

    /// The checksum manifest could not be read.
    ChecksumsReadFailed(ChecksumError),

    /// No asset is published for the current platform.
    UnsupportedPlatform { os: String, arch: String },

    /// The spec has no asset base path to download from.
    NoAssetPath,

    /// The asset location does not exist.
    AssetNotFound(String),

    /// Downloading or copying the asset failed.
    AssetFetchFailed { location: String, reason: String },

    /// The asset checksum could not be checked.
    ValidateFailed { asset: String, reason: String },

    /// The downloaded asset does not match its recorded checksum.
    ChecksumMismatch,

    /// Archive extraction failed.
    UnpackFailed { asset: String, reason: String },

    /// Moving downloaded files into the registry failed.
    InstallFilesFailed(io::Error),

    /// Writing the installed spec sidecar failed.
    SpecWriteFailed(SpecError),

    /// Removing the quarantine attribute failed.
    DequarantineFailed(String),

    /// The lockfile could not be read or written.
    LockfileFailed(LockfileError),

    /// The package is not present in the registry.
    NotInstalled,

    /// No extension file was found in the package directory.
    ExtensionNotFound,

    /// The identifier is not a valid `owner/name` pair.
    InvalidPackageName(String),

    /// One or more packages in a batch operation failed.
    BatchFailed { failed: usize },

    /// A local repository already exists.
    AlreadyInitialized,

    /// Filesystem operation failed.
    Io(io::Error),
}

impl std::fmt::Display for ManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SpecReadFailed(source) => {
                write!(f, "failed to read package spec: {}", source)
            }
            Self::VersionResolveFailed(source) => {
                write!(f, "failed to resolve the latest version: {}", source)
            }
            Self::ChecksumsReadFailed(source) => {
                write!(f, "failed to read checksums: {}", source)
            }
            Self::UnsupportedPlatform { os, arch } => {
                write!(f, "unsupported platform: {}-{}", os, arch)
            }
            Self::NoAssetPath => write!(f, "asset path is not set"),
            Self::AssetNotFound(location) => {
                write!(f, "asset does not exist: {}", location)
            }
            Self::AssetFetchFailed { location, reason } => {
                write!(f, "failed to download asset: {}: {}", location, reason)
            }
            Self::ValidateFailed { asset, reason } => {
                write!(f, "failed to validate asset: {}: {}", asset, reason)
            }
            Self::ChecksumMismatch => write!(f, "asset checksum is invalid"),
            Self::UnpackFailed { asset, reason } => {
                write!(f, "failed to unpack asset: {}: {}", asset, reason)
            }
            Self::InstallFilesFailed(source) => {
                write!(f, "failed to copy downloaded files: {}", source)
            }
            Self::SpecWriteFailed(source) => {
                write!(f, "failed to write package spec: {}", source)
            }
            Self::DequarantineFailed(reason) => {
                write!(f, "failed to dequarantine files: {}", reason)
            }
            Self::LockfileFailed(source) => {
                write!(f, "failed to save lockfile: {}", source)
            }
            Self::NotInstalled => write!(f, "package is not installed"),
            Self::ExtensionNotFound => write!(f, "extension file is not found"),
            Self::InvalidPackageName(name) => {
                write!(f, "invalid package name: {}", name)
            }
            Self::BatchFailed { failed } => {
                write!(f, "failed to install {} packages", failed)
            }
            Self::AlreadyInitialized => {
                write!(f, "local repository already exists")
            }
            Self::Io(source) => write!(f, "{}", source),
        }
    }
}

impl std::error::Error for ManagerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SpecReadFailed(source) => Some(source),
            Self::VersionResolveFailed(source) => Some(source),
            Self::ChecksumsReadFailed(source) => Some(source),
            Self::InstallFilesFailed(source) => Some(source),
            Self::SpecWriteFailed(source) => Some(source),
            Self::LockfileFailed(source) => Some(source),
            Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for ManagerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<LockfileError> for ManagerError {
    fn from(err: LockfileError) -> Self {
        Self::LockfileFailed(err)
    }
}

impl ManagerError {
    pub(crate) fn fetch(location: &str, err: AssetError) -> Self {
        Self::AssetFetchFailed {
            location: location.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn validate(asset: &str, err: AssetError) -> Self {
        Self::ValidateFailed {
            asset: asset.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn unpack(asset: &str, err: AssetError) -> Self {
        Self::UnpackFailed {
            asset: asset.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unsupported_platform() {
        let err = ManagerError::UnsupportedPlatform {
            os: "plan9".to_string(),
            arch: "mips".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported platform: plan9-mips");
    }

    #[test]
    fn test_display_not_installed() {
        assert_eq!(
            ManagerError::NotInstalled.to_string(),
            "package is not installed"
        );
    }

    #[test]
    fn test_display_batch_failed() {
        let err = ManagerError::BatchFailed { failed: 2 };
        assert_eq!(err.to_string(), "failed to install 2 packages");
    }
}
