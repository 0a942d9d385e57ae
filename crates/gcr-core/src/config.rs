//! Persisted installation settings (`<config dir>/gcr/config.json`).
//!
//! The config is loaded once at process start and handed to the resolver
//! and executor as a plain value. Nothing in the crate reads it globally.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GcrError, Result};

/// Application name used for the config directory.
pub const APP_NAME: &str = "gcr";

/// Working directory suggested by `gcr configure`.
pub const DEFAULT_WORKING_DIR: &str = "~/gcr-workdir";

/// Installation settings written by `gcr configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub organization holding the student repositories.
    pub org_name: String,
    /// Directory that receives one checkout per student (`~` allowed).
    pub working_dir: String,
    /// Personal access token with `repo` scope.
    pub github_token: String,
}

impl Config {
    pub fn new(
        org_name: impl Into<String>,
        working_dir: impl Into<String>,
        github_token: impl Into<String>,
    ) -> Self {
        Self {
            org_name: org_name.into(),
            working_dir: working_dir.into(),
            github_token: github_token.into(),
        }
    }

    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(GcrError::ConfigDirUnavailable)?;
        Ok(dir.join(APP_NAME).join("config.json"))
    }

    /// Load the config from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GcrError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                GcrError::Io(e)
            }
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|source| GcrError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), org = %config.org_name, "Loaded config");
        Ok(config)
    }

    /// Write the config to `path`, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the working root, creating it on first use.
    pub fn working_path(&self) -> Result<PathBuf> {
        let path = expand_home(&self.working_dir);
        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|source| GcrError::WorkingRoot {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "Created working directory");
        }
        Ok(path)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config::new("cs101", "/tmp/work", "ghp_secret");

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("config.json")).unwrap_err();
        assert!(matches!(err, GcrError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"org_name": "cs101"}"#).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, GcrError::ConfigParse { .. }));
    }

    #[test]
    fn test_working_path_created_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("workdir");
        let config = Config::new("cs101", root.to_string_lossy(), "t");

        assert!(!root.exists());
        let resolved = config.working_path().unwrap();
        assert_eq!(resolved, root);
        assert!(root.is_dir());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/gcr-workdir"), home.join("gcr-workdir"));
        }
    }
}
