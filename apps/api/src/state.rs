use crate::config::Config;
use crate::github_client::GitHubClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Token-less GitHub client; each request binds its caller's token.
    pub github: GitHubClient,
}
