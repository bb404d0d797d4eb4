//! Lenient semantic version comparison.
//!
//! Follows SemVer 2.0.0 precedence with some tolerances:
//! - allows a leading 'v' (e.g. `v1.2.3`)
//! - treats `MAJOR` as `MAJOR.0.0`
//! - treats `MAJOR.MINOR` as `MAJOR.MINOR.0`
//!
//! An unparseable version string sorts below any parseable one; two
//! unparseable strings compare equal. Build metadata never affects
//! precedence.

use std::cmp::Ordering;

use semver::Version;

/// Compares two version strings according to semantic version precedence.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(va), Some(vb)) => va.cmp_precedence(&vb),
    }
}

/// Parses a version string, tolerating a leading 'v' and partial
/// (major / major.minor) forms. Returns `None` if the string is not a
/// valid version.
pub fn parse(v: &str) -> Option<Version> {
    if v.is_empty() {
        return None;
    }
    let v = v.strip_prefix('v').unwrap_or(v);
    if let Ok(ver) = Version::parse(v) {
        return Some(ver);
    }
    // Partial forms may not carry pre-release or build parts.
    let padded = match v.split('.').count() {
        1 => format!("{v}.0.0"),
        2 => format!("{v}.0"),
        _ => return None,
    };
    if !padded.split('.').all(|part| {
        !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
    }) {
        return None;
    }
    Version::parse(&padded).ok()
}
