//! Package installer: the staged install and update workflow.
//!
//! An install runs through the following stages:
//! 1. Resolve and read the package spec
//! 2. Resolve the `latest` version against the release provider
//! 3. Compare against the installed version
//! 4. Read the asset checksum manifest
//! 5. Build the asset location for the current platform
//! 6. Download or copy the asset into a scratch directory
//! 7. Validate the asset checksum
//! 8. Unpack the asset
//! 9. Move the files into the registry and write the spec sidecar
//! 10. Dequarantine extension files (macOS)
//! 11. Record the package in the lockfile

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::assets::{self, Asset};
use crate::lockfile::{self, Lockfile};
use crate::repository::{self, Repository};
use crate::spec::{self, AssetPath, Package, SpecError};
use crate::{checksums, fileio, github, httpx, platform, version};

use super::error::{ManagerError, ManagerResult};
use super::registry;

/// Result of an install or update attempt for a single package.
#[derive(Debug)]
pub enum InstallOutcome {
    /// The package was downloaded and placed into the registry.
    Installed(Package),
    /// The installed version is already current, nothing was changed.
    UpToDate { version: String },
}

/// Per-package results of a batch install or update.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<(String, ManagerResult<InstallOutcome>)>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.results.len() - self.failed()
    }
}

/// Installs, updates and reinstalls packages in a repository.
pub struct PackageInstaller<'a> {
    repo: &'a Repository,
    temp_root: PathBuf,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            temp_root: repository::default_temp_root(),
        }
    }

    /// Override the scratch root for in-flight downloads.
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    /// Installs a new package or updates an existing one.
    pub fn install(&self, identifier: &str) -> ManagerResult<InstallOutcome> {
        let mut pkg = self.read_spec(identifier)?;
        self.resolve_version(&mut pkg)?;

        if !self.has_new_version(&pkg) {
            return Ok(InstallOutcome::UpToDate {
                version: pkg.version,
            });
        }

        self.read_checksums(&mut pkg)?;
        let location = self.build_asset_path(&pkg)?;
        let asset = self.fetch_asset(&pkg, &location)?;
        self.validate_asset(&pkg, &asset)?;
        self.unpack_asset(&pkg, &asset)?;
        self.install_files(&pkg, &asset)?;
        self.dequarantine_files(&pkg)?;
        self.add_to_lockfile(&pkg)?;

        Ok(InstallOutcome::Installed(pkg))
    }

    /// Installs the exact version of a package recorded in the lockfile.
    ///
    /// The lockfile entry pins the version and the fully expanded assets,
    /// so version resolution and the checksum manifest are not consulted.
    /// The lockfile itself is left untouched.
    pub fn install_locked(&self, locked: &Package) -> ManagerResult<InstallOutcome> {
        let source = if locked.specfile.is_empty() {
            // older lockfiles may not record the specfile
            debug!(package = %locked.full_name(), "missing specfile, falling back to owner/name");
            locked.full_name()
        } else {
            locked.specfile.clone()
        };

        let mut pkg = self.read_spec(&source)?;
        debug!(version = %locked.version, "locked version");
        pkg.version = locked.version.clone();
        pkg.assets = locked.assets.clone();

        if !self.has_new_version(&pkg) {
            return Ok(InstallOutcome::UpToDate {
                version: pkg.version,
            });
        }

        let location = self.build_asset_path(&pkg)?;
        let asset = self.fetch_asset(&pkg, &location)?;
        self.validate_asset(&pkg, &asset)?;
        self.unpack_asset(&pkg, &asset)?;
        self.install_files(&pkg, &asset)?;
        self.dequarantine_files(&pkg)?;

        Ok(InstallOutcome::Installed(pkg))
    }

    /// Installs every package recorded in the lockfile.
    pub fn install_all(&self, lck: &Lockfile) -> BatchReport {
        let mut report = BatchReport::default();
        for (full_name, locked) in &lck.packages {
            let result = self.install_locked(locked);
            report.results.push((full_name.clone(), result));
        }
        report
    }

    /// Updates an installed package to the latest version.
    ///
    /// Unlike [`install`](Self::install), requires the package to be
    /// present in the registry.
    pub fn update(&self, full_name: &str) -> ManagerResult<InstallOutcome> {
        let (owner, name) = repository::split_full_name(full_name)
            .ok_or_else(|| ManagerError::InvalidPackageName(full_name.to_string()))?;
        let installed = spec::read_local(&self.repo.spec_path(owner, name))
            .map_err(|_| ManagerError::NotInstalled)?;
        debug!(package = %installed.full_name(), version = %installed.version, "found installed package");

        let source = if installed.specfile.is_empty() {
            installed.full_name()
        } else {
            installed.specfile.clone()
        };
        self.install(&source)
    }

    /// Updates every installed package to its latest version.
    pub fn update_all(&self) -> ManagerResult<BatchReport> {
        let packages = registry::installed_packages(self.repo)?;
        let mut report = BatchReport::default();
        for pkg in packages {
            let result = self.update(&pkg.full_name());
            report.results.push((pkg.full_name(), result));
        }
        Ok(report)
    }

    /// Resolves the identifier to a spec and expands template variables.
    fn read_spec(&self, identifier: &str) -> ManagerResult<Package> {
        let mut pkg = spec::read(identifier).map_err(ManagerError::SpecReadFailed)?;
        pkg.expand_vars();
        debug!(specfile = %pkg.specfile, "found package spec");
        debug!(package = %pkg.full_name(), version = %pkg.version, "read package");
        Ok(pkg)
    }

    /// Resolves the `latest` placeholder to a concrete release version.
    ///
    /// Only GitHub-hosted repositories are queried; for other providers
    /// the placeholder is left as-is.
    fn resolve_version(&self, pkg: &mut Package) -> ManagerResult<()> {
        if pkg.version != "latest" {
            return Ok(());
        }

        let hostname = httpx::hostname(&pkg.repository);
        if hostname != github::HOSTNAME {
            debug!(provider = %hostname, "unknown provider, not resolving version");
            return Ok(());
        }

        let (owner, repo) = github::parse_repo_url(&pkg.repository)
            .map_err(ManagerError::VersionResolveFailed)?;
        let tag = github::latest_tag(&owner, &repo).map_err(ManagerError::VersionResolveFailed)?;
        pkg.replace_latest(&tag);
        debug!(version = %tag, "resolved latest version");
        Ok(())
    }

    /// Checks if the package is newer than the installed one.
    fn has_new_version(&self, pkg: &Package) -> bool {
        let installed_path = self.repo.spec_path(&pkg.owner, &pkg.name);
        let Ok(installed) = spec::read_local(&installed_path) else {
            return true;
        };
        debug!(version = %installed.version, "local package version");

        if installed.version.is_empty() {
            // not explicitly versioned, always assume there is a later one
            return true;
        }
        if installed.version == pkg.version {
            return false;
        }
        version::compare(&installed.version, &pkg.version) == std::cmp::Ordering::Less
    }

    /// Loads the asset checksum manifest, if the package publishes one.
    fn read_checksums(&self, pkg: &mut Package) -> ManagerResult<()> {
        let Some(base) = &pkg.assets.path else {
            return Ok(());
        };
        let manifest = base.join(checksums::FILE_NAME);
        if !checksums::exists(&manifest) {
            debug!("missing asset checksum file");
            return Ok(());
        }
        let sums = checksums::read(&manifest).map_err(ManagerError::ChecksumsReadFailed)?;
        debug!(count = sums.len(), "read checksums");
        pkg.assets.checksums = sums;
        Ok(())
    }

    /// Builds the asset location for the current platform and verifies
    /// that it exists.
    fn build_asset_path(&self, pkg: &Package) -> ManagerResult<AssetPath> {
        let (os, arch) = (platform::os(), platform::arch());
        debug!(platform = %platform::key(), "checking asset for platform");

        let location = match pkg.asset_path(os, arch) {
            Ok(location) => location,
            Err(SpecError::NoAssetPath) => return Err(ManagerError::NoAssetPath),
            Err(_) => {
                return Err(ManagerError::UnsupportedPlatform {
                    os: os.to_string(),
                    arch: arch.to_string(),
                })
            }
        };

        if !location.exists() {
            return Err(ManagerError::AssetNotFound(location.to_string()));
        }
        Ok(location)
    }

    /// Downloads or copies the asset into a fresh scratch directory.
    fn fetch_asset(&self, pkg: &Package, location: &AssetPath) -> ManagerResult<Asset> {
        debug!(location = %location, "downloading asset");
        let dir = spec::dir(&self.temp_root, &pkg.owner, &pkg.name);
        fileio::create_dir(&dir)?;

        let asset = match location {
            AssetPath::Remote(url) => assets::download(&dir, url),
            AssetPath::Local(path) => assets::copy(&dir, path.as_ref()),
        }
        .map_err(|e| ManagerError::fetch(location.value(), e))?;

        debug!(name = %asset.name, size = asset.size, "downloaded asset");
        Ok(asset)
    }

    /// Checks the asset against its recorded checksum. A missing manifest
    /// entry is not an error.
    fn validate_asset(&self, pkg: &Package, asset: &Asset) -> ManagerResult<()> {
        let Some(checksum_str) = pkg.assets.checksums.get(&asset.name) else {
            debug!("spec is missing asset checksum");
            return Ok(());
        };
        let ok = asset
            .validate(checksum_str)
            .map_err(|e| ManagerError::validate(&asset.name, e))?;
        if !ok {
            return Err(ManagerError::ChecksumMismatch);
        }
        debug!("asset checksum is valid");
        Ok(())
    }

    /// Unpacks the asset in place and deletes the archive. Non-archive
    /// assets are left untouched.
    fn unpack_asset(&self, pkg: &Package, asset: &Asset) -> ManagerResult<()> {
        let count = assets::unpack(&asset.path, &pkg.assets.pattern)
            .map_err(|e| ManagerError::unpack(&asset.name, e))?;
        if count == 0 {
            debug!(asset = %asset.name, "not an archive, skipping unpack");
            return Ok(());
        }
        fs::remove_file(&asset.path)?;
        debug!(count, asset = %asset.name, "unpacked files");
        Ok(())
    }

    /// Moves the scratch directory into the registry and writes the spec
    /// sidecar next to the installed files.
    fn install_files(&self, pkg: &Package, asset: &Asset) -> ManagerResult<()> {
        let pkg_dir = self.repo.package_dir(&pkg.owner, &pkg.name);
        fileio::move_dir(asset.dir(), &pkg_dir).map_err(ManagerError::InstallFilesFailed)?;
        pkg.save(&pkg_dir).map_err(ManagerError::SpecWriteFailed)?;
        Ok(())
    }

    /// Removes the macOS quarantine flag from installed extension files.
    /// A no-op on other platforms.
    fn dequarantine_files(&self, pkg: &Package) -> ManagerResult<()> {
        if platform::os() != "darwin" {
            return Ok(());
        }

        let pkg_dir = self.repo.package_dir(&pkg.owner, &pkg.name);
        let pattern = pkg_dir.join("*.dylib").to_string_lossy().into_owned();
        let paths: Vec<PathBuf> = glob::glob(&pattern)
            .map(|it| it.filter_map(Result::ok).collect())
            .unwrap_or_default();
        if paths.is_empty() {
            return Ok(());
        }

        let mut reasons = Vec::new();
        for path in &paths {
            if let Err(err) = fileio::dequarantine(path) {
                reasons.push(err.to_string());
            }
        }
        if !reasons.is_empty() {
            return Err(ManagerError::DequarantineFailed(reasons.join("; ")));
        }
        debug!(count = paths.len(), "removed files from quarantine");
        Ok(())
    }

    /// Records the installed package in the lockfile.
    fn add_to_lockfile(&self, pkg: &Package) -> ManagerResult<()> {
        let mut lck = lockfile::load(self.repo.root())?;
        lck.add(pkg);
        lck.save(self.repo.root())?;
        debug!("added package to the lockfile");
        Ok(())
    }
}
