//! Clone an assignment's student repositories into the working root.

use std::path::Path;
use std::process::Stdio;

use gcr_core::resolver::{target_name, SEPARATOR};
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{GithubError, Result};
use crate::source::{Repo, RepoSource};

/// Which repositories of an assignment to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Only `{assignment}-{student}`.
    Student(String),
    /// Every repository named `{assignment}-*`.
    All,
}

impl Selection {
    /// Exactly one of `student` and `all` must be given.
    pub fn from_args(student: Option<String>, all: bool) -> Result<Self> {
        match (student, all) {
            (Some(name), false) => Ok(Selection::Student(name)),
            (None, true) => Ok(Selection::All),
            _ => Err(GithubError::InvalidSelection),
        }
    }
}

/// What a checkout did, per repository name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub cloned: Vec<String>,
    pub existing: Vec<String>,
    /// Repository name and the reason its clone failed.
    pub failed: Vec<(String, String)>,
}

/// Fetch the selected repositories into `working_root`.
///
/// Listing errors abort; a failed clone is recorded and the loop moves on.
pub async fn checkout(
    source: &dyn RepoSource,
    org: &str,
    working_root: &Path,
    assignment: &str,
    selection: &Selection,
) -> Result<CheckoutSummary> {
    let repos: Vec<Repo> = match selection {
        Selection::Student(student) => {
            vec![source.get_repo(org, &target_name(assignment, student)).await?]
        }
        Selection::All => {
            let prefix = format!("{assignment}{SEPARATOR}");
            source
                .list_repos(org)
                .await?
                .into_iter()
                .filter(|r| r.name.starts_with(&prefix))
                .collect()
        }
    };
    info!(org = %org, assignment = %assignment, repos = repos.len(), "Checking out");

    let mut summary = CheckoutSummary::default();
    for repo in repos {
        if working_root.join(&repo.name).exists() {
            debug!(repo = %repo.name, "Already checked out");
            summary.existing.push(repo.name);
            continue;
        }
        match clone_repo(&repo, working_root).await {
            Ok(()) => summary.cloned.push(repo.name),
            Err(reason) => {
                warn!(repo = %repo.name, reason = %reason, "Clone failed");
                summary.failed.push((repo.name, reason));
            }
        }
    }
    Ok(summary)
}

/// `git clone <ssh_url> <name>` inside `working_root`.
async fn clone_repo(repo: &Repo, working_root: &Path) -> std::result::Result<(), String> {
    let output = Command::new("git")
        .args(["clone", "--quiet", &repo.ssh_url, &repo.name])
        .current_dir(working_root)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| format!("failed to start git: {e}"))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(stderr.trim().to_string())
    }
}
