//! High-level file operations.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Buffer size for reading files during checksum calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Checks if the specified path exists.
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Creates an empty directory.
///
/// If the directory already exists, deletes it and creates a new one.
pub fn create_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dir)
}

/// Moves the source directory to the destination.
///
/// If the destination already exists, deletes it before moving the source.
/// Falls back to a recursive copy when a plain rename fails (e.g. across
/// filesystems).
pub fn move_dir(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::remove_dir_all(dst) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    copy_dir_recursive(src, dst)?;
    fs::remove_dir_all(src)
}

/// Copies a single file from source to destination.
///
/// Returns the file size in bytes.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    fs::copy(src, dst)
}

/// Calculates the SHA-256 checksum of a file.
pub fn calc_checksum(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_vec())
}

/// Removes the macOS quarantine flag from a file.
///
/// A missing quarantine flag is not an error. On other platforms this is
/// a no-op.
#[cfg(target_os = "macos")]
pub fn dequarantine(path: &Path) -> io::Result<()> {
    use std::process::Command;

    let output = Command::new("xattr")
        .args(["-d", "com.apple.quarantine"])
        .arg(path)
        .output()?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("No such xattr") {
        return Ok(());
    }
    Err(io::Error::other(stderr.trim().to_string()))
}

#[cfg(not(target_os = "macos"))]
pub fn dequarantine(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exists() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("some.txt");
        assert!(!exists(&file));
        fs::write(&file, "data").unwrap();
        assert!(exists(&file));
    }

    #[test]
    fn test_create_dir_fresh() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("scratch");
        create_dir(&dir).unwrap();
        assert!(dir.is_dir());

        // stale contents are discarded
        fs::write(dir.join("stale.txt"), "old").unwrap();
        create_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join("stale.txt").exists());
    }

    #[test]
    fn test_move_dir_replaces_destination() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("new.txt"), "new").unwrap();
        fs::create_dir(&dst).unwrap();
        fs::write(dst.join("old.txt"), "old").unwrap();

        move_dir(&src, &dst).unwrap();
        assert!(!src.exists());
        assert!(dst.join("new.txt").exists());
        assert!(!dst.join("old.txt").exists());
    }

    #[test]
    fn test_copy_file() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "hello world").unwrap();

        let size = copy_file(&src, &dst).unwrap();
        assert_eq!(size, 11);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "hello world");
    }

    #[test]
    fn test_calc_checksum() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("test.txt");
        fs::write(&file, "hello world").unwrap();

        let sum = calc_checksum(&file).unwrap();
        // SHA-256 of "hello world"
        assert_eq!(
            hex::encode(&sum),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_calc_checksum_missing_file() {
        let result = calc_checksum(Path::new("/nonexistent/file.txt"));
        assert!(result.is_err());
    }
}
