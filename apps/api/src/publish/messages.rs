// User-facing text and fixed remote metadata for the publish pipeline.

/// Message of every commit made by a publish. Not customizable by callers.
pub const COMMIT_MESSAGE: &str = "Update portfolio";

pub const PUBLISHED_MESSAGE: &str = "Successfully published to GitHub!";

/// Branch assumed when GitHub does not report a default branch.
pub const FALLBACK_BRANCH: &str = "main";

/// Root of the Pages site within the published branch.
pub const PAGES_SOURCE_PATH: &str = "/";

pub const PAGES_DOMAIN: &str = "github.io";

pub fn overwrite_prompt(repo_name: &str) -> String {
    format!(
        "Repository '{repo_name}' already exists. Do you want to update it? \
         This will overwrite existing files."
    )
}
