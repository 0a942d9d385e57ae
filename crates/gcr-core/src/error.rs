//! Error taxonomy for gcr.
//!
//! Only pre-execution problems live here. Anything that goes wrong while a
//! single target runs is recorded in that target's
//! [`RunResult`](crate::executor::RunResult) instead.

use std::path::PathBuf;

/// gcr domain errors.
#[derive(Debug, thiserror::Error)]
pub enum GcrError {
    #[error("could not open config file '{}', run 'gcr configure'", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("invalid config file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not determine the user configuration directory")]
    ConfigDirUnavailable,

    #[error("working directory '{}' is not accessible: {source}", path.display())]
    WorkingRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no checkout for '{name}' at '{}'", path.display())]
    TargetNotFound { name: String, path: PathBuf },

    #[error("conflicting options: {0}")]
    ConfigConflict(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gcr core operations.
pub type Result<T> = std::result::Result<T, GcrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_mentions_configure() {
        let err = GcrError::ConfigNotFound {
            path: PathBuf::from("/tmp/gcr/config.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/gcr/config.json"));
        assert!(msg.contains("gcr configure"));
    }

    #[test]
    fn test_target_not_found_names_target() {
        let err = GcrError::TargetNotFound {
            name: "hw1-alice".to_string(),
            path: PathBuf::from("/work/hw1-alice"),
        };
        let msg = err.to_string();
        assert!(msg.contains("hw1-alice"));
        assert!(msg.contains("/work/hw1-alice"));
    }

    #[test]
    fn test_config_conflict_display() {
        let err = GcrError::ConfigConflict("--errors-only and --success-only".to_string());
        assert!(err.to_string().starts_with("conflicting options"));
    }
}
