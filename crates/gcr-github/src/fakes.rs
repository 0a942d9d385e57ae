//! In-memory [`RepoSource`] (testing only)

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{GithubError, Result};
use crate::source::{Repo, RepoSource};

/// Organizations and their repositories held in a map.
#[derive(Debug, Default)]
pub struct MemoryRepoSource {
    orgs: Mutex<BTreeMap<String, Vec<Repo>>>,
}

impl MemoryRepoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `repo` to `org`, creating the organization if needed.
    pub fn insert(&self, org: &str, repo: Repo) {
        let mut orgs = self.orgs.lock().unwrap_or_else(|e| e.into_inner());
        orgs.entry(org.to_string()).or_default().push(repo);
    }

    fn with_org<T>(&self, org: &str, f: impl FnOnce(&[Repo]) -> Result<T>) -> Result<T> {
        let orgs = self.orgs.lock().unwrap_or_else(|e| e.into_inner());
        match orgs.get(org) {
            Some(repos) => f(repos),
            None => Err(GithubError::NotFound(format!("/orgs/{org}"))),
        }
    }
}

#[async_trait]
impl RepoSource for MemoryRepoSource {
    async fn list_repos(&self, org: &str) -> Result<Vec<Repo>> {
        self.with_org(org, |repos| Ok(repos.to_vec()))
    }

    async fn get_repo(&self, org: &str, name: &str) -> Result<Repo> {
        self.with_org(org, |repos| {
            repos
                .iter()
                .find(|r| r.name == name)
                .cloned()
                .ok_or_else(|| GithubError::NotFound(format!("/repos/{org}/{name}")))
        })
    }

    async fn verify_org(&self, org: &str) -> Result<()> {
        self.with_org(org, |_| Ok(()))
    }
}
