//! Work directory session
//!
//! The target expects to be run from its build directory, next to the list
//! files it reads. Setup enters that directory and cleanup leaves it again.

use std::env;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Tracks whether setup actually changed directory
#[derive(Debug)]
pub struct WorkDir {
    test_dir: PathBuf,
    entered: bool,
}

impl WorkDir {
    /// Enter `test_dir` unless the current directory already ends with it
    pub fn enter(test_dir: &Path) -> Result<Self> {
        let cwd = env::current_dir()?;
        if cwd.ends_with(test_dir) {
            tracing::debug!(dir = %cwd.display(), "already in test directory");
            return Ok(Self {
                test_dir: test_dir.to_path_buf(),
                entered: false,
            });
        }

        env::set_current_dir(test_dir).map_err(|e| Error::work_dir(test_dir, e))?;
        tracing::debug!(dir = %test_dir.display(), "entered test directory");
        Ok(Self {
            test_dir: test_dir.to_path_buf(),
            entered: true,
        })
    }

    /// Whether setup changed directory
    pub fn entered(&self) -> bool {
        self.entered
    }

    /// Return to `parent` if still inside the test directory
    pub fn leave(self, parent: &Path) -> Result<()> {
        let cwd = env::current_dir()?;
        if !cwd.ends_with(&self.test_dir) {
            return Ok(());
        }
        env::set_current_dir(parent).map_err(|e| Error::work_dir(parent, e))?;
        tracing::debug!(dir = %parent.display(), "left test directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Single test: the current directory is process-wide state
    #[test]
    fn test_enter_and_leave() {
        let original = env::current_dir().unwrap();
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        std::fs::create_dir_all(root.join("Proj/build")).unwrap();
        env::set_current_dir(&root).unwrap();

        let session = WorkDir::enter(Path::new("Proj/build")).unwrap();
        assert!(session.entered());
        assert!(env::current_dir().unwrap().ends_with("Proj/build"));

        // already inside: no-op
        let again = WorkDir::enter(Path::new("Proj/build")).unwrap();
        assert!(!again.entered());

        session.leave(Path::new("../..")).unwrap();
        assert_eq!(env::current_dir().unwrap(), root);

        let err = WorkDir::enter(Path::new("nope/build")).unwrap_err();
        assert!(matches!(err, Error::WorkDir { .. }));

        env::set_current_dir(original).unwrap();
    }
}
