/// GitHub client: the single point of entry for all GitHub REST calls made by the publisher.
///
/// ARCHITECTURAL RULE: No other module may talk to the GitHub API directly.
/// The publish pipeline depends only on the `HostingApi` trait so it can be
/// exercised against an in-memory fake in tests.
///
/// No retries happen here. Retry policy belongs to the caller.
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub mod models;

#[cfg(test)]
pub mod fake;

use models::{
    AuthenticatedUser, BranchInfo, CreateCommit, CreatePages, CreateRepository, CreateTree,
    GitHubErrorBody, GitObject, PagesInfo, RepoSlug, RepositoryInfo, UpdateRef,
};

const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GitHubError::Timeout
        } else {
            GitHubError::Http(err)
        }
    }
}

impl GitHubError {
    /// HTTP status of an API error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// The remote operations the publish pipeline needs, one method per REST call.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// `GET /user`
    async fn authenticated_user(&self) -> Result<AuthenticatedUser, GitHubError>;

    /// `GET /repos/{owner}/{repo}`. A 404 is reported as `Ok(None)`.
    async fn get_repository(&self, repo: &RepoSlug)
        -> Result<Option<RepositoryInfo>, GitHubError>;

    /// `POST /user/repos`
    async fn create_repository(
        &self,
        request: &CreateRepository,
    ) -> Result<RepositoryInfo, GitHubError>;

    /// `GET /repos/{owner}/{repo}/branches/{branch}`
    async fn get_branch(&self, repo: &RepoSlug, branch: &str) -> Result<BranchInfo, GitHubError>;

    /// `POST /repos/{owner}/{repo}/git/trees`
    async fn create_tree(
        &self,
        repo: &RepoSlug,
        request: &CreateTree,
    ) -> Result<GitObject, GitHubError>;

    /// `POST /repos/{owner}/{repo}/git/commits`
    async fn create_commit(
        &self,
        repo: &RepoSlug,
        request: &CreateCommit,
    ) -> Result<GitObject, GitHubError>;

    /// `PATCH /repos/{owner}/{repo}/git/refs/{git_ref}`, where `git_ref` is e.g. `heads/main`.
    async fn update_ref(
        &self,
        repo: &RepoSlug,
        git_ref: &str,
        request: &UpdateRef,
    ) -> Result<(), GitHubError>;

    /// `GET /repos/{owner}/{repo}/pages`. A 404 is reported as `Ok(None)`.
    async fn get_pages(&self, repo: &RepoSlug) -> Result<Option<PagesInfo>, GitHubError>;

    /// `POST /repos/{owner}/{repo}/pages`
    async fn create_pages(
        &self,
        repo: &RepoSlug,
        request: &CreatePages,
    ) -> Result<PagesInfo, GitHubError>;
}

/// Shared, token-less GitHub client held in application state.
/// Bind a caller's access token with [`GitHubClient::authenticated`].
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Result<Self, GitHubError> {
        let client = Client::builder()
            .timeout(config.github_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.github_api_url.clone(),
        })
    }

    /// Returns a session that authenticates every call with `token`.
    pub fn authenticated(&self, token: &str) -> GitHubSession {
        GitHubSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: token.to_string(),
        }
    }
}

/// A `GitHubClient` bound to one user's access token.
pub struct GitHubSession {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubSession {
    fn repo_url(&self, repo: &RepoSlug, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url, repo.owner, repo.name, suffix
        )
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, GitHubError> {
        let response = request
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("GitHub API returned {}: {}", status, body);
        Err(GitHubError::Api {
            status: status.as_u16(),
            message: error_message(&body, status.canonical_reason()),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GitHubError> {
        let response = self.execute(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, GitHubError> {
        self.send_json(self.client.get(url)).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, GitHubError> {
        self.send_json(self.client.post(url).json(body)).await
    }
}

/// Lifts a 404 into `Ok(None)`.
fn optional<T>(result: Result<T, GitHubError>) -> Result<Option<T>, GitHubError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Extracts GitHub's `message` field from an error body, falling back to the
/// raw body and then to the status reason.
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_str::<GitHubErrorBody>(body) {
        return parsed.message;
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    reason.unwrap_or("GitHub request failed").to_string()
}

#[async_trait]
impl HostingApi for GitHubSession {
    async fn authenticated_user(&self) -> Result<AuthenticatedUser, GitHubError> {
        self.get_json(format!("{}/user", self.base_url)).await
    }

    async fn get_repository(
        &self,
        repo: &RepoSlug,
    ) -> Result<Option<RepositoryInfo>, GitHubError> {
        optional(self.get_json(self.repo_url(repo, "")).await)
    }

    async fn create_repository(
        &self,
        request: &CreateRepository,
    ) -> Result<RepositoryInfo, GitHubError> {
        self.post_json(format!("{}/user/repos", self.base_url), request)
            .await
    }

    async fn get_branch(&self, repo: &RepoSlug, branch: &str) -> Result<BranchInfo, GitHubError> {
        self.get_json(self.repo_url(repo, &format!("/branches/{branch}")))
            .await
    }

    async fn create_tree(
        &self,
        repo: &RepoSlug,
        request: &CreateTree,
    ) -> Result<GitObject, GitHubError> {
        self.post_json(self.repo_url(repo, "/git/trees"), request)
            .await
    }

    async fn create_commit(
        &self,
        repo: &RepoSlug,
        request: &CreateCommit,
    ) -> Result<GitObject, GitHubError> {
        self.post_json(self.repo_url(repo, "/git/commits"), request)
            .await
    }

    async fn update_ref(
        &self,
        repo: &RepoSlug,
        git_ref: &str,
        request: &UpdateRef,
    ) -> Result<(), GitHubError> {
        let url = self.repo_url(repo, &format!("/git/refs/{git_ref}"));
        self.execute(self.client.patch(url).json(request)).await?;
        Ok(())
    }

    async fn get_pages(&self, repo: &RepoSlug) -> Result<Option<PagesInfo>, GitHubError> {
        optional(self.get_json(self.repo_url(repo, "/pages")).await)
    }

    async fn create_pages(
        &self,
        repo: &RepoSlug,
        request: &CreatePages,
    ) -> Result<PagesInfo, GitHubError> {
        self.post_json(self.repo_url(repo, "/pages"), request).await
    }
}
