//! Project discovery
//!
//! A project is any directory holding a `.srcc/` folder. It scopes the
//! project configuration layer.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-project configuration directory
pub const PROJECT_DIR: &str = ".srcc";

/// Represents an SRCC analysis project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .srcc/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .srcc configuration directory
    pub fn srcc_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.srcc_dir().join("config.yaml")
    }
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("no .srcc directory found in {searched_from} or any parent")]
    NotFound { searched_from: PathBuf },

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discover_walks_up() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(PROJECT_DIR)).unwrap();
        let nested = dir.path().join("cohorts/2024");
        std::fs::create_dir_all(&nested).unwrap();

        let project = Project::discover_from(&nested).unwrap();
        assert_eq!(project.root(), dir.path().canonicalize().unwrap());
        assert!(project.config_path().ends_with(".srcc/config.yaml"));
    }

    #[test]
    fn test_discover_not_found() {
        let dir = tempdir().unwrap();
        // Temp dirs normally have no .srcc ancestor
        let result = Project::discover_from(dir.path());
        if let Err(err) = result {
            assert!(matches!(err, ProjectError::NotFound { .. }));
        }
    }
}
