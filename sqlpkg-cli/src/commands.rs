//! One function per CLI verb, printing progress as it goes.

use sqlpkg::manager::{self, InstallOutcome, ManagerError, ManagerResult, PackageInstaller};
use sqlpkg::{lockfile, Package, Repository, WhichOutcome};

/// Prints a note when operating on a project-local repository.
fn print_scope(repo: &Repository) {
    if repo.is_local() {
        println!("(local repository)");
    }
}

/// Installs a new package or updates an existing one.
pub fn install(repo: &Repository, package: &str) -> ManagerResult<()> {
    print_scope(repo);
    println!("> installing {package}...");

    let installer = PackageInstaller::new(repo);
    match installer.install(package)? {
        InstallOutcome::Installed(pkg) => {
            let dir = repo.package_dir(&pkg.owner, &pkg.name);
            println!("✓ installed package {} to {}", pkg.full_name(), dir.display());
        }
        InstallOutcome::UpToDate { .. } => {
            println!("✓ already at the latest version");
        }
    }
    Ok(())
}

/// Installs all packages from the lockfile.
pub fn install_all(repo: &Repository) -> ManagerResult<()> {
    print_scope(repo);

    let lck = lockfile::load(repo.root())?;
    if lck.packages.is_empty() {
        println!("no packages found in the lockfile");
        return Ok(());
    }

    let installer = PackageInstaller::new(repo);
    let report = installer.install_all(&lck);
    for (full_name, result) in &report.results {
        match result {
            Ok(InstallOutcome::Installed(pkg)) => {
                let dir = repo.package_dir(&pkg.owner, &pkg.name);
                println!("✓ installed package {} to {}", pkg.full_name(), dir.display());
            }
            Ok(InstallOutcome::UpToDate { version }) => {
                println!("✓ {full_name} is already at the {version} version");
            }
            Err(err) => println!("! {err}"),
        }
    }

    if report.failed() > 0 {
        return Err(ManagerError::BatchFailed {
            failed: report.failed(),
        });
    }
    println!("installed {} packages", report.results.len());
    Ok(())
}

/// Uninstalls a package.
pub fn uninstall(repo: &Repository, package: &str) -> ManagerResult<()> {
    print_scope(repo);
    println!("> uninstalling {package}...");
    manager::uninstall(repo, package)?;
    println!("✓ uninstalled package {package}");
    Ok(())
}

/// Updates a package to the latest version.
pub fn update(repo: &Repository, package: &str) -> ManagerResult<()> {
    print_scope(repo);
    println!("> updating {package}...");

    let installer = PackageInstaller::new(repo);
    match installer.update(package)? {
        InstallOutcome::Installed(pkg) => {
            println!("✓ updated package {} to {}", pkg.full_name(), pkg.version);
        }
        InstallOutcome::UpToDate { .. } => {
            println!("✓ already at the latest version");
        }
    }
    Ok(())
}

/// Updates all installed packages to the latest versions.
pub fn update_all(repo: &Repository) -> ManagerResult<()> {
    print_scope(repo);

    let installer = PackageInstaller::new(repo);
    let report = installer.update_all()?;
    if report.results.is_empty() {
        println!("no packages installed");
        return Ok(());
    }

    let mut count = 0;
    for (full_name, result) in &report.results {
        println!("> updating {full_name}...");
        match result {
            Ok(InstallOutcome::Installed(pkg)) => {
                println!("✓ updated package {} to {}", pkg.full_name(), pkg.version);
                count += 1;
            }
            Ok(InstallOutcome::UpToDate { .. }) => {
                println!("✓ already at the latest version");
            }
            Err(err) => {
                println!("! error updating {full_name}: {err}");
            }
        }
    }

    println!("updated {count} packages");
    Ok(())
}

/// Prints all installed packages.
pub fn list(repo: &Repository) -> ManagerResult<()> {
    let packages = manager::installed_packages(repo)?;

    let mut lck = lockfile::load(repo.root())?;
    manager::reconcile_lockfile(repo, &mut lck, &packages)?;

    print_scope(repo);
    if packages.is_empty() {
        println!("no packages installed");
        return Ok(());
    }

    let width = packages
        .iter()
        .map(|pkg| pkg.full_name().len())
        .max()
        .unwrap_or(0);
    for pkg in &packages {
        println!("{:width$}  {}", pkg.full_name(), pkg.description);
    }
    Ok(())
}

/// Prints information about a package (installed or not).
pub fn info(repo: &Repository, package: &str) -> ManagerResult<()> {
    let pkg = match manager::find_spec(repo, package) {
        Ok(pkg) => pkg,
        Err(err) => {
            tracing::debug!(error = %err, "spec lookup failed");
            println!("package not found");
            return Ok(());
        }
    };

    for line in describe(repo, &pkg) {
        println!("{line}");
    }
    Ok(())
}

/// Builds the detailed package description.
fn describe(repo: &Repository, pkg: &Package) -> Vec<String> {
    let mut lines = Vec::new();

    let mut header = pkg.full_name();
    if !pkg.version.is_empty() {
        header += &format!("@{}", pkg.version);
    }
    if !pkg.authors.is_empty() {
        header += &format!(" by {}", pkg.authors.join(", "));
    }
    lines.push(header);

    if !pkg.description.is_empty() {
        lines.push(pkg.description.clone());
    }
    if !pkg.repository.is_empty() {
        lines.push(pkg.repository.clone());
    }
    if !pkg.license.is_empty() {
        lines.push(format!("license: {}", pkg.license));
    }
    if manager::is_installed(repo, pkg) {
        lines.push("✓ installed".to_string());
    } else {
        lines.push("✘ not installed".to_string());
    }
    lines
}

/// Prints the path to the extension file.
pub fn which(repo: &Repository, package: &str) -> ManagerResult<()> {
    match manager::which(repo, package)? {
        WhichOutcome::Exact(path) => println!("{}", path.display()),
        WhichOutcome::Candidates(paths) if !paths.is_empty() => {
            println!("exact match not found");
            println!("possible matches:");
            for path in paths {
                println!("{}", path.display());
            }
        }
        WhichOutcome::Candidates(_) => return Err(ManagerError::ExtensionNotFound),
    }
    Ok(())
}

/// Creates an empty local package repository.
pub fn init() -> ManagerResult<()> {
    manager::init_local()?;
    println!("✓ created a local repository");
    Ok(())
}
