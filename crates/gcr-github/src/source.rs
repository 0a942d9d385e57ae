//! Repository listing abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The subset of a GitHub repository that checkout needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub ssh_url: String,
}

impl Repo {
    pub fn new(name: impl Into<String>, ssh_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ssh_url: ssh_url.into(),
        }
    }
}

/// Where student repositories come from.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Every repository in `org`.
    async fn list_repos(&self, org: &str) -> Result<Vec<Repo>>;

    /// One repository by exact name.
    async fn get_repo(&self, org: &str, name: &str) -> Result<Repo>;

    /// Confirm the organization exists and the credentials can see it.
    async fn verify_org(&self, org: &str) -> Result<()>;
}
