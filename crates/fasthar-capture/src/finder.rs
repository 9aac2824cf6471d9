use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Locates the capture binary, either at an explicit path or on `PATH`
pub struct CaptureBinaryFinder {
    custom_path: Option<PathBuf>,
    name: String,
}

impl CaptureBinaryFinder {
    /// Create a finder for `name`, preferring `custom_path` when given
    pub fn new(name: impl Into<String>, custom_path: Option<PathBuf>) -> Self {
        Self {
            custom_path,
            name: name.into(),
        }
    }

    /// Resolve the binary, checking the custom path first, then `PATH`
    pub fn find(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.custom_path {
            return Self::validate_path(path);
        }

        which::which(&self.name).map_err(|e| {
            Error::NotFound(format!(
                "{} is not on PATH ({}). Use --capture-bin to specify its location.",
                self.name, e
            ))
        })
    }

    /// Validate that a path exists and is executable
    fn validate_path(path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "no capture binary at {}",
                path.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::metadata(path)?.permissions();
            if permissions.mode() & 0o111 == 0 {
                return Err(Error::NotFound(format!(
                    "capture binary not executable: {}",
                    path.display()
                )));
            }
        }

        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_finder_accepts_executable_custom_path() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path();

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let finder = CaptureBinaryFinder::new("phantomjs", Some(path.to_path_buf()));
        assert_eq!(finder.find().unwrap(), path);
    }

    #[cfg(unix)]
    #[test]
    fn test_finder_rejects_non_executable_custom_path() {
        let temp = tempfile::NamedTempFile::new().unwrap();

        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o644))
                .unwrap();
        }

        let finder = CaptureBinaryFinder::new("phantomjs", Some(temp.path().to_path_buf()));
        let err = finder.find().unwrap_err();
        assert!(err.to_string().contains("not executable"));
    }

    #[test]
    fn test_finder_fails_when_custom_path_missing() {
        let finder = CaptureBinaryFinder::new("phantomjs", Some(PathBuf::from("/nonexistent/phantomjs")));
        let result = finder.find();

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_finder_fails_for_unknown_binary_on_path() {
        let finder = CaptureBinaryFinder::new("fasthar-no-such-capture-binary", None);

        assert!(matches!(finder.find(), Err(Error::NotFound(_))));
    }
}
