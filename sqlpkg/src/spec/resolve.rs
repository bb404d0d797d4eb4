//! Spec resolution: mapping a package identifier to a spec document.
//!
//! An identifier can be an owner-name pair (`nalgeon/sqlean`), a GitHub
//! repo shorthand (`github.com/nalgeon/sqlean`), a custom URL or a local
//! path. Candidate locations are generated in order and the first one
//! that reads and parses successfully wins.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{Package, SpecError, FILE_NAME};
use crate::httpx;

/// Central registry that hosts specs for packages that do not carry
/// their own `sqlpkg.json`.
const REGISTRY_OWNER: &str = "nalgeon";
const REGISTRY_REPO: &str = "sqlpkg";

// e.g. github.com/nalgeon/sqlean
fn github_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^github\.com/[\w\-.]+/[\w\-.]+$").unwrap())
}

// e.g. nalgeon/sqlean
fn owner_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w\-.]+/[\w\-.]+$").unwrap())
}

/// All candidate locations failed; keeps every per-candidate failure
/// for diagnostics.
#[derive(Debug)]
pub struct ResolutionError {
    pub attempts: Vec<(String, String)>,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (location, reason) in &self.attempts {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{location}: {reason}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionError {}

/// Retrieves the package spec for the given identifier.
///
/// Tries each candidate location in order and returns the first spec that
/// reads and parses successfully, recording where it was found in
/// `specfile`. If every candidate fails, returns an error listing each
/// attempted location with its failure reason.
pub fn read(identifier: &str) -> Result<Package, SpecError> {
    let mut attempts = Vec::new();
    for candidate in expand_identifier(identifier) {
        match read_candidate(&candidate) {
            Ok(mut pkg) => {
                pkg.specfile = candidate;
                return Ok(pkg);
            }
            Err(err) => {
                debug!(candidate, error = %err, "spec candidate failed");
                attempts.push((candidate, err.to_string()));
            }
        }
    }
    Err(ResolutionError { attempts }.into())
}

/// Generates candidate spec locations for an identifier.
fn expand_identifier(identifier: &str) -> Vec<String> {
    if github_pattern().is_match(identifier) {
        // the main branch of the github repository
        return vec![format!("https://{identifier}/raw/main/{FILE_NAME}")];
    }
    if owner_name_pattern().is_match(identifier) {
        // can be a local path or an owner-name pair, which in turn can
        // point to the author's repo or to the central registry
        return vec![
            identifier.to_string(),
            format!("https://github.com/{identifier}/raw/main/{FILE_NAME}"),
            format!(
                "https://github.com/{REGISTRY_OWNER}/{REGISTRY_REPO}/raw/main/pkg/{identifier}.json"
            ),
        ];
    }
    vec![identifier.to_string()]
}

fn read_candidate(location: &str) -> Result<Package, SpecError> {
    if httpx::is_url(location) {
        read_remote(location)
    } else {
        read_local(Path::new(location))
    }
}

/// Reads a package spec from a local file.
pub fn read_local(path: &Path) -> Result<Package, SpecError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Reads a package spec from a remote url.
pub fn read_remote(url: &str) -> Result<Package, SpecError> {
    Ok(httpx::get_json(url)?)
}
