//! Package manager for SQLite extensions.
//!
//! Resolves package specs (`sqlpkg.json`) from local paths, URLs, GitHub
//! repositories or the central registry, downloads the platform-specific
//! asset, verifies its checksum and installs the extension files into a
//! repository directory (project-local `.sqlpkg` or the user's home).
//! Installed versions are pinned in a lockfile (`sqlpkg.lock`).

pub mod assets;
pub mod checksums;
pub mod fileio;
pub mod github;
pub mod httpx;
pub mod lockfile;
pub mod manager;
pub mod platform;
pub mod repository;
pub mod spec;
pub mod version;

pub use manager::{BatchReport, InstallOutcome, ManagerError, PackageInstaller, WhichOutcome};
pub use repository::Repository;
pub use spec::Package;
