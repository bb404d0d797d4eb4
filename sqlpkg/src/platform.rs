//! Host platform identification.
//!
//! Package specs key their per-platform assets by an `os-arch` string
//! (e.g. `linux-amd64`, `darwin-arm64`). Both parts follow the naming
//! convention used by upstream release archives, which differs from Rust's
//! own identifiers for macOS and the two common 64-bit architectures.

use std::env;

/// Returns the platform key for the running host, e.g. `linux-amd64`.
pub fn key() -> String {
    format!("{}-{}", os(), arch())
}

/// Operating system name as used in platform keys.
pub fn os() -> &'static str {
    normalize_os(env::consts::OS)
}

/// Architecture name as used in platform keys.
pub fn arch() -> &'static str {
    normalize_arch(env::consts::ARCH)
}

fn normalize_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn normalize_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

/// Shared library file extension for the given OS, dot included.
///
/// Returns an empty string for an unrecognized OS.
pub fn library_ext(os: &str) -> &'static str {
    match os {
        "darwin" => ".dylib",
        "linux" => ".so",
        "windows" => ".dll",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let key = key();
        assert!(key.contains('-'));
        assert!(!key.starts_with('-'));
        assert!(!key.ends_with('-'));
    }

    #[test]
    fn test_normalize_os() {
        assert_eq!(normalize_os("macos"), "darwin");
        assert_eq!(normalize_os("linux"), "linux");
        assert_eq!(normalize_os("windows"), "windows");
    }

    #[test]
    fn test_normalize_arch() {
        assert_eq!(normalize_arch("x86_64"), "amd64");
        assert_eq!(normalize_arch("aarch64"), "arm64");
        assert_eq!(normalize_arch("x86"), "386");
        assert_eq!(normalize_arch("riscv64"), "riscv64");
    }

    #[test]
    fn test_library_ext() {
        assert_eq!(library_ext("darwin"), ".dylib");
        assert_eq!(library_ext("linux"), ".so");
        assert_eq!(library_ext("windows"), ".dll");
        assert_eq!(library_ext("plan9"), "");
    }
}
