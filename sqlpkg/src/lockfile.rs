//! The lockfile (`sqlpkg.lock`).
//!
//! Records the exact version and asset set of every installed package so
//! a repository can be reproduced with a single batch install. The whole
//! document is rewritten on every save.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::{Assets, Package};

/// The lockfile filename.
pub const FILE_NAME: &str = "sqlpkg.lock";

#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Installed package index, keyed by the owner-name pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub packages: BTreeMap<String, Package>,
}

/// Returns the path to the lockfile under the given base path.
pub fn path(dir: &Path) -> PathBuf {
    dir.join(FILE_NAME)
}

/// Reads the lockfile from the specified directory. A missing file is
/// treated as an empty lockfile.
pub fn load(dir: &Path) -> Result<Lockfile, LockfileError> {
    let file = path(dir);
    let data = match fs::read_to_string(&file) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Lockfile::default()),
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_str(&data)?)
}

impl Lockfile {
    /// Checks if a package is in the lockfile.
    pub fn has(&self, full_name: &str) -> bool {
        self.packages.contains_key(full_name)
    }

    /// Adds a package to the lockfile, replacing any previous entry.
    ///
    /// Only the fields needed to reproduce the install are kept: the
    /// identity, the resolved version, the specfile location and the
    /// expanded assets.
    pub fn add(&mut self, pkg: &Package) {
        let entry = Package {
            owner: pkg.owner.clone(),
            name: pkg.name.clone(),
            version: pkg.version.clone(),
            specfile: pkg.specfile.clone(),
            assets: Assets {
                path: pkg.assets.path.clone(),
                pattern: pkg.assets.pattern.clone(),
                files: pkg.assets.files.clone(),
                checksums: pkg.assets.checksums.clone(),
            },
            ..Package::default()
        };
        self.packages.insert(pkg.full_name(), entry);
    }

    /// Removes a package from the lockfile.
    pub fn remove(&mut self, full_name: &str) {
        self.packages.remove(full_name);
    }

    /// Writes the lockfile to the specified directory.
    pub fn save(&self, dir: &Path) -> Result<(), LockfileError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path(dir), data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Package {
        Package {
            owner: "nalgeon".to_string(),
            name: "example".to_string(),
            version: "0.1.0".to_string(),
            specfile: "https://example.org/sqlpkg.json".to_string(),
            description: "Example extension.".to_string(),
            license: "MIT".to_string(),
            ..Package::default()
        }
    }

    #[test]
    fn test_load_missing_is_empty() {
        let temp = TempDir::new().unwrap();
        let lck = load(temp.path()).unwrap();
        assert!(lck.packages.is_empty());
    }

    #[test]
    fn test_add_trims_entry() {
        let mut lck = Lockfile::default();
        lck.add(&sample());
        assert!(lck.has("nalgeon/example"));

        let entry = &lck.packages["nalgeon/example"];
        assert_eq!(entry.version, "0.1.0");
        assert_eq!(entry.specfile, "https://example.org/sqlpkg.json");
        // metadata is not persisted
        assert!(entry.description.is_empty());
        assert!(entry.license.is_empty());
    }

    #[test]
    fn test_add_replaces_existing() {
        let mut lck = Lockfile::default();
        lck.add(&sample());

        let mut updated = sample();
        updated.version = "0.2.0".to_string();
        lck.add(&updated);

        assert_eq!(lck.packages.len(), 1);
        assert_eq!(lck.packages["nalgeon/example"].version, "0.2.0");
    }

    #[test]
    fn test_remove() {
        let mut lck = Lockfile::default();
        lck.add(&sample());
        lck.remove("nalgeon/example");
        assert!(!lck.has("nalgeon/example"));
        // removing a missing entry is a no-op
        lck.remove("nalgeon/example");
    }

    #[test]
    fn test_save_round_trip() {
        let temp = TempDir::new().unwrap();
        let mut lck = Lockfile::default();
        lck.add(&sample());
        lck.save(temp.path()).unwrap();

        let back = load(temp.path()).unwrap();
        assert_eq!(back.packages.len(), 1);
        assert_eq!(back.packages["nalgeon/example"].version, "0.1.0");
    }
}
