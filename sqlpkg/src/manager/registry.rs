//! Registry queries: listing, inspecting and removing installed packages.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::lockfile::{self, Lockfile};
use crate::platform;
use crate::repository::{self, Repository};
use crate::spec::{self, Package};

use super::error::{ManagerError, ManagerResult};

/// Result of looking up the extension file for a package.
#[derive(Debug)]
pub enum WhichOutcome {
    /// A file matching the package name was found.
    Exact(PathBuf),
    /// No exact match; these files carry the expected extension.
    Candidates(Vec<PathBuf>),
}

/// Collects the specs of all installed packages, sorted by full name.
pub fn installed_packages(repo: &Repository) -> ManagerResult<Vec<Package>> {
    let pattern = repo
        .registry_dir()
        .join("*")
        .join("*")
        .join(spec::FILE_NAME)
        .to_string_lossy()
        .into_owned();
    let paths: Vec<PathBuf> = glob::glob(&pattern)
        .map(|it| it.filter_map(Result::ok).collect())
        .unwrap_or_default();

    let mut packages = Vec::new();
    for path in paths {
        let pkg = spec::read_local(&path).map_err(ManagerError::SpecReadFailed)?;
        packages.push(pkg);
    }
    packages.sort_by_key(Package::full_name);
    debug!(count = packages.len(), "gathered packages");
    Ok(packages)
}

/// Adds installed packages missing from the lockfile.
///
/// Packages listed only in the lockfile are left in place; the lockfile
/// is saved only if something was added.
pub fn reconcile_lockfile(
    repo: &Repository,
    lck: &mut Lockfile,
    packages: &[Package],
) -> ManagerResult<()> {
    let mut added = 0;
    for pkg in packages {
        if lck.has(&pkg.full_name()) {
            continue;
        }
        lck.add(pkg);
        added += 1;
    }
    if added == 0 {
        return Ok(());
    }
    lck.save(repo.root())?;
    debug!(added, "added packages to the lockfile");
    Ok(())
}

/// Loads the spec of an installed package, if any.
pub fn read_installed_spec(repo: &Repository, full_name: &str) -> Option<Package> {
    let (owner, name) = repository::split_full_name(full_name)?;
    let pkg = spec::read_local(&repo.spec_path(owner, name)).ok()?;
    debug!("found installed package");
    Some(pkg)
}

/// Loads the package spec, giving preference to already installed
/// packages.
pub fn find_spec(repo: &Repository, identifier: &str) -> ManagerResult<Package> {
    if let Some(pkg) = read_installed_spec(repo, identifier) {
        return Ok(pkg);
    }
    debug!("package is not installed");
    let mut pkg = spec::read(identifier).map_err(ManagerError::SpecReadFailed)?;
    pkg.expand_vars();
    Ok(pkg)
}

/// Checks if the package directory exists in the registry.
pub fn is_installed(repo: &Repository, pkg: &Package) -> bool {
    repo.spec_path(&pkg.owner, &pkg.name).exists()
}

/// Removes an installed package and its lockfile entry.
pub fn uninstall(repo: &Repository, full_name: &str) -> ManagerResult<()> {
    let (owner, name) = repository::split_full_name(full_name)
        .ok_or_else(|| ManagerError::InvalidPackageName(full_name.to_string()))?;

    let dir = repo.package_dir(owner, name);
    if !dir.exists() {
        debug!(dir = %dir.display(), "package dir not found");
        return Err(ManagerError::NotInstalled);
    }
    debug!(dir = %dir.display(), "deleting package dir");
    fs::remove_dir_all(&dir)?;

    let mut lck = lockfile::load(repo.root())?;
    if lck.has(full_name) {
        lck.remove(full_name);
        lck.save(repo.root())?;
        debug!("removed package from the lockfile");
    } else {
        debug!("package not listed in the lockfile");
    }
    Ok(())
}

/// Locates the extension file for an installed package.
///
/// Prefers files named after the package (`name.ext`, `name0.ext`,
/// `libname.ext`); otherwise returns every file with the platform's
/// shared library extension.
pub fn which(repo: &Repository, full_name: &str) -> ManagerResult<WhichOutcome> {
    let (owner, name) = repository::split_full_name(full_name)
        .ok_or_else(|| ManagerError::InvalidPackageName(full_name.to_string()))?;

    let dir = repo.package_dir(owner, name);
    if !dir.exists() {
        return Err(ManagerError::NotInstalled);
    }

    let ext = platform::library_ext(platform::os());
    if let Some(path) = find_exact(&dir, name, ext) {
        return Ok(WhichOutcome::Exact(path));
    }

    let candidates = glob_paths(&dir.join(format!("*{ext}")));
    Ok(WhichOutcome::Candidates(candidates))
}

fn find_exact(dir: &std::path::Path, name: &str, ext: &str) -> Option<PathBuf> {
    // e.g. text.dylib, text0.dylib, libtext.dylib
    let patterns = [
        format!("{name}{ext}"),
        format!("{name}[0-9]{ext}"),
        format!("lib{name}{ext}"),
    ];
    for pattern in patterns {
        let paths = glob_paths(&dir.join(pattern));
        if let Some(path) = paths.into_iter().next() {
            return Some(path);
        }
    }
    None
}

fn glob_paths(pattern: &std::path::Path) -> Vec<PathBuf> {
    glob::glob(&pattern.to_string_lossy())
        .map(|it| it.filter_map(Result::ok).collect())
        .unwrap_or_default()
}

/// Creates an empty project-local repository in the current directory.
pub fn init_local() -> ManagerResult<()> {
    let dir = std::path::Path::new(spec::DIR_NAME);
    if dir.exists() {
        return Err(ManagerError::AlreadyInitialized);
    }
    fs::create_dir(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install_fake(repo: &Repository, owner: &str, name: &str, version: &str) {
        let dir = repo.package_dir(owner, name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(spec::FILE_NAME),
            format!(
                r#"{{"owner": "{owner}", "name": "{name}", "version": "{version}",
                   "assets": {{"files": {{}}}}}}"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_installed_packages_sorted() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        install_fake(&repo, "zzz", "last", "1.0.0");
        install_fake(&repo, "aaa", "first", "1.0.0");

        let packages = installed_packages(&repo).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].full_name(), "aaa/first");
        assert_eq!(packages[1].full_name(), "zzz/last");
    }

    #[test]
    fn test_installed_packages_empty() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        assert!(installed_packages(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_reconcile_lockfile_adds_missing() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        install_fake(&repo, "nalgeon", "example", "0.1.0");

        let packages = installed_packages(&repo).unwrap();
        let mut lck = lockfile::load(repo.root()).unwrap();
        reconcile_lockfile(&repo, &mut lck, &packages).unwrap();

        assert!(lck.has("nalgeon/example"));
        // saved to disk as well
        let back = lockfile::load(repo.root()).unwrap();
        assert!(back.has("nalgeon/example"));
    }

    #[test]
    fn test_reconcile_lockfile_keeps_lock_only_entries() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());

        let mut lck = Lockfile::default();
        lck.add(&Package {
            owner: "gone".to_string(),
            name: "missing".to_string(),
            ..Package::default()
        });
        reconcile_lockfile(&repo, &mut lck, &[]).unwrap();
        assert!(lck.has("gone/missing"));
    }

    #[test]
    fn test_uninstall() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        install_fake(&repo, "nalgeon", "example", "0.1.0");

        let mut lck = Lockfile::default();
        lck.add(&Package {
            owner: "nalgeon".to_string(),
            name: "example".to_string(),
            ..Package::default()
        });
        lck.save(repo.root()).unwrap();

        uninstall(&repo, "nalgeon/example").unwrap();
        assert!(!repo.package_dir("nalgeon", "example").exists());
        let back = lockfile::load(repo.root()).unwrap();
        assert!(!back.has("nalgeon/example"));
    }

    #[test]
    fn test_uninstall_not_installed() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        let err = uninstall(&repo, "nalgeon/example").unwrap_err();
        assert!(matches!(err, ManagerError::NotInstalled));
    }

    #[test]
    fn test_uninstall_leaves_lockfile_on_missing_dir() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        let mut lck = Lockfile::default();
        lck.add(&Package {
            owner: "nalgeon".to_string(),
            name: "example".to_string(),
            ..Package::default()
        });
        lck.save(repo.root()).unwrap();

        assert!(uninstall(&repo, "nalgeon/example").is_err());
        let back = lockfile::load(repo.root()).unwrap();
        assert!(back.has("nalgeon/example"));
    }

    #[test]
    fn test_which_exact_and_candidates() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        install_fake(&repo, "nalgeon", "text", "0.1.0");
        let dir = repo.package_dir("nalgeon", "text");
        let ext = platform::library_ext(platform::os());

        fs::write(dir.join(format!("other{ext}")), "lib").unwrap();
        let got = which(&repo, "nalgeon/text").unwrap();
        let WhichOutcome::Candidates(paths) = got else {
            panic!("expected candidates");
        };
        assert_eq!(paths.len(), 1);

        fs::write(dir.join(format!("text{ext}")), "lib").unwrap();
        let got = which(&repo, "nalgeon/text").unwrap();
        let WhichOutcome::Exact(path) = got else {
            panic!("expected exact match");
        };
        assert_eq!(path, dir.join(format!("text{ext}")));
    }

    #[test]
    fn test_which_lib_prefix() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        install_fake(&repo, "nalgeon", "text", "0.1.0");
        let dir = repo.package_dir("nalgeon", "text");
        let ext = platform::library_ext(platform::os());

        fs::write(dir.join(format!("libtext{ext}")), "lib").unwrap();
        let got = which(&repo, "nalgeon/text").unwrap();
        assert!(matches!(got, WhichOutcome::Exact(_)));
    }

    #[test]
    fn test_which_not_installed() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        let err = which(&repo, "nalgeon/text").unwrap_err();
        assert!(matches!(err, ManagerError::NotInstalled));
    }

    #[test]
    fn test_find_spec_prefers_installed() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        install_fake(&repo, "nalgeon", "example", "0.1.0");

        let pkg = find_spec(&repo, "nalgeon/example").unwrap();
        assert_eq!(pkg.version, "0.1.0");
    }

    #[test]
    fn test_is_installed() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::at(temp.path());
        let pkg = Package {
            owner: "nalgeon".to_string(),
            name: "example".to_string(),
            ..Package::default()
        };
        assert!(!is_installed(&repo, &pkg));
        install_fake(&repo, "nalgeon", "example", "0.1.0");
        assert!(is_installed(&repo, &pkg));
    }
}
