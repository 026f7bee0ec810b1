use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github_client::models::RepoSlug;

/// Git mode for a regular, non-executable file. The only mode a publish writes.
pub const REGULAR_FILE_MODE: &str = "100644";

/// One file of the static-site bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the repository root.
    pub path: String,
    pub content: String,
}

impl FileEntry {
    #[cfg(test)]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub repo_name: String,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub force: bool,
}

/// A repository as resolved for one publish run. Never cached across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub html_url: String,
    pub newly_created: bool,
}

impl Repository {
    pub fn slug(&self) -> RepoSlug {
        RepoSlug::new(&self.owner, &self.name)
    }

    /// Ref name as the Git Data API expects it, e.g. `heads/main`.
    pub fn branch_ref(&self) -> String {
        format!("heads/{}", self.default_branch)
    }
}

/// Result of one branch-tip lookup. The commit and its tree are read together
/// so the new commit's parent and the new tree's base always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchTip {
    pub commit_sha: String,
    pub tree_sha: String,
}

/// How much the reported Pages URL can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagesStatus {
    /// GitHub reported the site as already configured; the URL is GitHub's.
    Active,
    /// Activation was requested (or was already in progress); the site builds asynchronously.
    Requested,
    /// The status read or activation failed; the URL is a best guess.
    Unverified,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostingSite {
    pub public_url: String,
    pub status: PagesStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationNeeded {
    exists: bool,
    pub message: String,
    pub repo_url: String,
}

impl ConfirmationNeeded {
    pub fn new(message: String, repo_url: String) -> Self {
        Self {
            exists: true,
            message,
            repo_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Published {
    success: bool,
    pub repo_url: String,
    pub pages_url: String,
    pub pages_status: PagesStatus,
    pub message: String,
    /// True when this run created the repository.
    pub created: bool,
    /// Absent when the request carried no files and no commit was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl Published {
    pub fn new(
        repo: Repository,
        hosting: HostingSite,
        message: String,
        commit_sha: Option<String>,
    ) -> Self {
        Self {
            success: true,
            repo_url: repo.html_url,
            pages_url: hosting.public_url,
            pages_status: hosting.status,
            message,
            created: repo.newly_created,
            commit_sha,
            published_at: Utc::now(),
        }
    }
}

/// Terminal, non-error result of a publish run. Failures travel as `Err(PublishError)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PublishOutcome {
    ConfirmationNeeded(ConfirmationNeeded),
    Published(Published),
}
