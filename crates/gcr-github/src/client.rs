//! GitHub REST client
//!
//! Only the three calls checkout and `gcr configure` need. Authenticates
//! with a personal access token carrying the `repo` scope.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{GithubError, Result};
use crate::source::{Repo, RepoSource};

/// Public GitHub API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Largest page size the API accepts.
const PER_PAGE: usize = 100;

/// [`RepoSource`] backed by the GitHub REST API.
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GithubClient {
    /// Client for api.github.com.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(GITHUB_API_URL, token)
    }

    /// Client for a GitHub Enterprise or test server.
    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(gcr_core::APP_NAME)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, org: &str, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GithubError::Unauthorized {
                org: org.to_string(),
            }),
            StatusCode::NOT_FOUND => Err(GithubError::NotFound(path.to_string())),
            s => Err(GithubError::Api {
                status: s.as_u16(),
                path: path.to_string(),
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, org: &str, path: &str) -> Result<T> {
        let body = self.get(org, path).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl RepoSource for GithubClient {
    async fn list_repos(&self, org: &str) -> Result<Vec<Repo>> {
        let mut repos = Vec::new();
        let mut page = 1;
        loop {
            let path = format!("/orgs/{org}/repos?per_page={PER_PAGE}&page={page}");
            let batch: Vec<Repo> = self.get_json(org, &path).await?;
            let done = batch.len() < PER_PAGE;
            repos.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        debug!(org = %org, count = repos.len(), "Listed repositories");
        Ok(repos)
    }

    async fn get_repo(&self, org: &str, name: &str) -> Result<Repo> {
        self.get_json(org, &format!("/repos/{org}/{name}")).await
    }

    async fn verify_org(&self, org: &str) -> Result<()> {
        self.get(org, &format!("/orgs/{org}")).await.map(|_| ())
    }
}
