//! Error types for gcr-github

use thiserror::Error;

/// Errors from talking to GitHub or cloning repositories.
#[derive(Error, Debug)]
pub enum GithubError {
    /// Token rejected or lacking access to the organization.
    #[error("could not authenticate for github.com/{org}")]
    Unauthorized { org: String },

    /// Organization or repository does not exist (or is hidden from the token).
    #[error("not found on GitHub: {0}")]
    NotFound(String),

    /// Any other non-success API response.
    #[error("GitHub API returned {status} for {path}")]
    Api { status: u16, path: String },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Neither or both of a student name and `--all` were given.
    #[error("must provide either a student name or explicitly pass --all")]
    InvalidSelection,

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GithubError {
    fn from(err: reqwest::Error) -> Self {
        GithubError::Http(err.to_string())
    }
}

/// Result type for gcr-github operations
pub type Result<T> = std::result::Result<T, GithubError>;
