//! Checkout against an in-memory organization whose "ssh" URLs are local
//! git repositories.

use std::path::Path;
use std::process::Command;

use gcr_github::fakes::MemoryRepoSource;
use gcr_github::{checkout, GithubError, Repo, Selection};

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Bare-bones origin repositories plus a source listing them.
fn organization(origin: &Path, names: &[&str]) -> MemoryRepoSource {
    let source = MemoryRepoSource::new();
    for name in names {
        let path = origin.join(name);
        let status = Command::new("git")
            .args(["init", "--quiet"])
            .arg(&path)
            .status()
            .unwrap();
        assert!(status.success());
        source.insert("course", Repo::new(*name, path.to_string_lossy()));
    }
    source
}

#[tokio::test]
async fn test_checkout_all_clones_only_assignment_repos() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let origin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let source = organization(origin.path(), &["hw1-alice", "hw1-bob", "hw10-carol", "syllabus"]);

    let summary = checkout(&source, "course", work.path(), "hw1", &Selection::All)
        .await
        .unwrap();

    assert_eq!(summary.cloned, vec!["hw1-alice", "hw1-bob"]);
    assert!(summary.existing.is_empty());
    assert!(summary.failed.is_empty());
    assert!(work.path().join("hw1-alice/.git").is_dir());
    assert!(!work.path().join("hw10-carol").exists());
}

#[tokio::test]
async fn test_existing_checkouts_are_skipped() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let origin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let source = organization(origin.path(), &["hw1-alice", "hw1-bob"]);
    std::fs::create_dir(work.path().join("hw1-alice")).unwrap();

    let summary = checkout(&source, "course", work.path(), "hw1", &Selection::All)
        .await
        .unwrap();

    assert_eq!(summary.cloned, vec!["hw1-bob"]);
    assert_eq!(summary.existing, vec!["hw1-alice"]);
}

#[tokio::test]
async fn test_single_student_checkout() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let origin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let source = organization(origin.path(), &["hw1-alice", "hw1-bob"]);

    let summary = checkout(
        &source,
        "course",
        work.path(),
        "hw1",
        &Selection::Student("bob".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(summary.cloned, vec!["hw1-bob"]);
    assert!(!work.path().join("hw1-alice").exists());
}

#[tokio::test]
async fn test_clone_failure_is_collected() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let origin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let source = organization(origin.path(), &["hw1-alice"]);
    source.insert(
        "course",
        Repo::new("hw1-ghost", origin.path().join("missing").to_string_lossy()),
    );

    let summary = checkout(&source, "course", work.path(), "hw1", &Selection::All)
        .await
        .unwrap();

    assert_eq!(summary.cloned, vec!["hw1-alice"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "hw1-ghost");
}

#[tokio::test]
async fn test_unknown_student_is_not_found() {
    let work = tempfile::tempdir().unwrap();
    let source = MemoryRepoSource::new();
    source.insert("course", Repo::new("hw1-alice", "/nowhere"));

    let err = checkout(
        &source,
        "course",
        work.path(),
        "hw1",
        &Selection::Student("zed".to_string()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, GithubError::NotFound(_)));
}
