//! gcr-github: GitHub organization access for gcr
//!
//! Lists an organization's repositories and clones the ones belonging to an
//! assignment into the working root. The [`RepoSource`] trait is the seam
//! between checkout logic and the GitHub REST API.

pub mod checkout;
pub mod client;
pub mod error;
pub mod fakes;
pub mod source;

pub use checkout::{checkout, CheckoutSummary, Selection};
pub use client::{GithubClient, GITHUB_API_URL};
pub use error::{GithubError, Result};
pub use source::{Repo, RepoSource};
