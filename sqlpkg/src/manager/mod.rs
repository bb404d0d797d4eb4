//! Package management: installing, updating, listing and removing
//! packages in a repository.

mod error;
mod installer;
mod registry;

pub use error::{ManagerError, ManagerResult};
pub use installer::{BatchReport, InstallOutcome, PackageInstaller};
pub use registry::{
    find_spec, init_local, installed_packages, is_installed, read_installed_spec,
    reconcile_lockfile, uninstall, which, WhichOutcome,
};
