//! Platform directory resolution.
//!
//! Config and logs live under the OS configuration directory (XDG on Linux,
//! Known Folders on Windows, Library on macOS) unless `--config` points
//! somewhere else.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not determine OS configuration directory")]
    NoConfigDir,

    #[error("cannot create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

const APP_NAME: &str = "orrery";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppDirs {
    /// The OS locations, or `override_dir` when given.
    pub fn resolve(override_dir: Option<&Path>) -> Result<Self, PlatformError> {
        let config_dir = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => dirs::config_dir()
                .ok_or(PlatformError::NoConfigDir)?
                .join(APP_NAME),
        };
        Ok(Self::rooted_at(config_dir))
    }

    /// Directories for a config root; logs go in its `logs` sub-directory.
    pub fn rooted_at(config_dir: PathBuf) -> Self {
        let log_dir = config_dir.join("logs");
        Self {
            config_dir,
            log_dir,
        }
    }

    /// Create both directories on disk.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        for dir in [&self.config_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| PlatformError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_dir_is_used_verbatim() {
        let dirs = AppDirs::resolve(Some(Path::new("/tmp/orrery-test"))).unwrap();
        assert_eq!(dirs.config_dir, PathBuf::from("/tmp/orrery-test"));
        assert_eq!(dirs.log_dir, PathBuf::from("/tmp/orrery-test/logs"));
    }

    #[test]
    fn test_create_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = AppDirs::rooted_at(tmp.path().join("nested").join("orrery"));
        dirs.create_dirs().unwrap();
        assert!(dirs.config_dir.is_dir());
        assert!(dirs.log_dir.is_dir());
    }

    #[test]
    fn test_create_dirs_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = AppDirs::rooted_at(blocker.clone()).create_dirs().unwrap_err();
        assert!(matches!(err, PlatformError::Io { ref path, .. } if *path == blocker));
    }
}
