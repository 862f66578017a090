//! Finds the credential tool on the user's `PATH`.

use std::ffi::OsStr;
use std::path::PathBuf;

/// File name of the credential tool executable on this platform.
#[cfg(windows)]
pub const CREDENTIAL_TOOL_EXE: &str = "gcloud.exe";
/// File name of the credential tool executable on this platform.
#[cfg(not(windows))]
pub const CREDENTIAL_TOOL_EXE: &str = "gcloud";

/// Returns the first `PATH` entry containing the credential tool, or the bare
/// executable name if none does.
///
/// Both `PATH` and `Path` are consulted because Windows environments can carry
/// either spelling.
pub fn locate_credential_tool() -> PathBuf {
    let path_var = std::env::var_os("PATH").or_else(|| std::env::var_os("Path"));
    locate_in(path_var.as_deref(), CREDENTIAL_TOOL_EXE)
}

/// Searches a `PATH`-style list for `exe`.
pub fn locate_in(path_var: Option<&OsStr>, exe: &str) -> PathBuf {
    path_var
        .into_iter()
        .flat_map(std::env::split_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(exe))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(exe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_in_returns_first_directory_containing_exe() {
        // Arrange
        let empty = TempDir::new().unwrap();
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(first.path().join("tool"), "").unwrap();
        std::fs::write(second.path().join("tool"), "").unwrap();
        let path_var =
            std::env::join_paths([empty.path(), first.path(), second.path()]).unwrap();

        // Act
        let found = locate_in(Some(&path_var), "tool");

        // Assert
        assert_eq!(found, first.path().join("tool"));
    }

    #[test]
    fn test_locate_in_falls_back_to_bare_name() {
        let empty = TempDir::new().unwrap();
        let path_var = std::env::join_paths([empty.path()]).unwrap();

        assert_eq!(locate_in(Some(&path_var), "tool"), PathBuf::from("tool"));
    }

    #[test]
    fn test_locate_in_without_path_variable_falls_back_to_bare_name() {
        assert_eq!(locate_in(None, "tool"), PathBuf::from("tool"));
    }

    #[test]
    fn test_locate_in_skips_directories_named_like_the_exe() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("tool")).unwrap();
        let path_var = std::env::join_paths([dir.path()]).unwrap();

        assert_eq!(locate_in(Some(&path_var), "tool"), PathBuf::from("tool"));
    }
}
