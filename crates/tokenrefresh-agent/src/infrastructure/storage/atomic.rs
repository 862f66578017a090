//! Atomic file replacement shared by the config and settings stores.
//!
//! Content goes into a uniquely named temporary file in the target's directory
//! (created `0600` on Unix), which is then renamed over the target.  Readers see
//! either the old file or the new one, never a partial write.  If the target
//! already exists its permissions are applied to the temporary file before any
//! content is written.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

/// Replaces `path` with `content`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns the underlying I/O error; the temporary file is removed on failure.
pub fn write_atomically(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;

    if let Ok(meta) = fs::metadata(path) {
        if let Err(e) = fs::set_permissions(tmp.path(), meta.permissions()) {
            warn!(path = %path.display(), "could not copy file permissions: {e}");
        }
    }

    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomically_replaces_content() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.toml");
        fs::write(&path, "old").unwrap();

        // Act
        write_atomically(&path, b"new").unwrap();

        // Assert
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomically_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("file.toml");

        write_atomically(&path, b"x").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.toml");

        write_atomically(&path, b"secret").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_permissions_are_kept() {
        use std::os::unix::fs::PermissionsExt;

        // Arrange
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.toml");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        // Act
        write_atomically(&path, b"new").unwrap();

        // Assert
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
