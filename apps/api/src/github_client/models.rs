//! Wire types for the subset of the GitHub REST API used by the publisher.
//! Field names follow GitHub's JSON exactly.

use serde::{Deserialize, Serialize};

/// Owner + name pair addressing one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub owner: RepoOwner,
    pub html_url: String,
    /// Absent on some freshly created repositories.
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Body of `POST /user/repos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepository {
    pub name: String,
    pub description: String,
    pub private: bool,
    pub auto_init: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaRef {
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    pub tree: ShaRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
    pub commit: CommitDetail,
}

/// Response of `GET /repos/{owner}/{repo}/branches/{branch}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub commit: BranchCommit,
}

/// One entry of a tree-creation request. Blob content is sent inline so the
/// server creates the blob as part of the tree call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

/// Body of `POST /repos/{owner}/{repo}/git/trees`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTree {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
    pub tree: Vec<TreeEntry>,
}

/// Body of `POST /repos/{owner}/{repo}/git/commits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommit {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

/// Body of `PATCH /repos/{owner}/{repo}/git/refs/{ref}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRef {
    pub sha: String,
    pub force: bool,
}

/// Trees and commits both answer with at least a `sha`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesSource {
    pub branch: String,
    pub path: String,
}

/// Body of `POST /repos/{owner}/{repo}/pages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePages {
    pub source: PagesSource,
}

/// Response of the Pages endpoints. GitHub omits `html_url` while the first
/// build is still pending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagesInfo {
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubErrorBody {
    pub message: String,
}
