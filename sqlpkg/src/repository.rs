//! Repository location and layout.
//!
//! A repository is the directory that holds the `.sqlpkg` registry and
//! the lockfile. It is either project-local (a `.sqlpkg` folder in the
//! current directory) or the user's home directory.

use std::env;
use std::path::{Path, PathBuf};

use crate::spec;

/// The root directory packages are installed under.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    local: bool,
}

impl Repository {
    /// Determines the repository for the current process.
    ///
    /// If the current directory contains a `.sqlpkg` folder, the
    /// repository is project-local. Otherwise it is the home directory,
    /// falling back to the current directory when the home directory
    /// cannot be determined.
    pub fn locate() -> Self {
        let cwd = PathBuf::from(".");
        if cwd.join(spec::DIR_NAME).is_dir() {
            return Self {
                root: cwd,
                local: true,
            };
        }
        match dirs::home_dir() {
            Some(home) => Self {
                root: home,
                local: false,
            },
            None => Self {
                root: cwd,
                local: false,
            },
        }
    }

    /// A repository rooted at an explicit directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            local: true,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the repository is project-local as opposed to the
    /// user-wide one in the home directory.
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// The registry directory holding all installed packages.
    pub fn registry_dir(&self) -> PathBuf {
        self.root.join(spec::DIR_NAME)
    }

    /// The directory a package is installed into.
    pub fn package_dir(&self, owner: &str, name: &str) -> PathBuf {
        spec::dir(&self.root, owner, name)
    }

    /// The path to an installed package's spec sidecar.
    pub fn spec_path(&self, owner: &str, name: &str) -> PathBuf {
        spec::path(&self.root, owner, name)
    }
}

/// Scratch root for in-flight downloads, one directory per package.
pub fn default_temp_root() -> PathBuf {
    env::temp_dir()
}

/// Splits a `owner/name` pair into its parts.
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
    let (owner, name) = full_name.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}
