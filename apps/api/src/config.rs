use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REPO_DESCRIPTION: &str = "My Portfolio built with TalentSmith AI";

/// Application configuration loaded from environment variables.
/// Every variable has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub github_api_url: String,
    /// Upper bound on every individual GitHub call.
    pub github_timeout: Duration,
    /// Description attached to repositories created by a publish.
    pub repo_description: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => 8080,
        };

        let timeout_secs = match lookup("GITHUB_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("GITHUB_TIMEOUT_SECS must be a whole number of seconds")?,
            None => 30,
        };
        if timeout_secs == 0 {
            anyhow::bail!("GITHUB_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Config {
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            github_api_url: lookup("GITHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            github_timeout: Duration::from_secs(timeout_secs),
            repo_description: lookup("PORTFOLIO_REPO_DESCRIPTION")
                .unwrap_or_else(|| DEFAULT_REPO_DESCRIPTION.to_string()),
        })
    }
}
