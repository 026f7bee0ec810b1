//! Repository Resolver: establishes who is publishing and whether the target
//! repository exists, creating it when absent.

use tracing::info;

use crate::github_client::models::{CreateRepository, RepoSlug, RepositoryInfo};
use crate::github_client::HostingApi;
use crate::publish::error::{PublishError, Stage};
use crate::publish::messages::{overwrite_prompt, FALLBACK_BRANCH};
use crate::publish::models::{ConfirmationNeeded, Repository};

/// Result of resolving a repository for one publish run.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The repository may be written to: it was just created, or the caller forced an overwrite.
    Ready(Repository),
    /// The repository already exists and the caller has not confirmed the overwrite.
    ConfirmationNeeded(ConfirmationNeeded),
}

fn remote(err: crate::github_client::GitHubError) -> PublishError {
    PublishError::remote(Stage::Resolving, err)
}

fn to_repository(info: RepositoryInfo, newly_created: bool) -> Repository {
    Repository {
        owner: info.owner.login,
        name: info.name,
        default_branch: info
            .default_branch
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| FALLBACK_BRANCH.to_string()),
        html_url: info.html_url,
        newly_created,
    }
}

/// Login of the identity behind the session's token.
pub async fn authenticated_owner(api: &dyn HostingApi) -> Result<String, PublishError> {
    let user = api.authenticated_user().await.map_err(remote)?;
    Ok(user.login)
}

/// Looks the repository up. Absence is `Ok(None)`, never an error.
pub async fn lookup_repository(
    api: &dyn HostingApi,
    slug: &RepoSlug,
) -> Result<Option<Repository>, PublishError> {
    let info = api.get_repository(slug).await.map_err(remote)?;
    Ok(info.map(|info| to_repository(info, false)))
}

/// Creates a public, auto-initialized repository for the authenticated user.
pub async fn create_repository(
    api: &dyn HostingApi,
    name: &str,
    description: &str,
) -> Result<Repository, PublishError> {
    let request = CreateRepository {
        name: name.to_string(),
        description: description.to_string(),
        // Pages on free accounts requires a public repository.
        private: false,
        auto_init: true,
    };
    let info = api.create_repository(&request).await.map_err(remote)?;
    let repository = to_repository(info, true);
    info!(
        "Created repository {}/{} (default branch {})",
        repository.owner, repository.name, repository.default_branch
    );
    Ok(repository)
}

/// Resolves `repo_name` under the authenticated identity.
///
/// Existing repositories are only returned as `Ready` when `force` is set;
/// otherwise nothing is written and the caller is asked to confirm.
pub async fn resolve_repository(
    api: &dyn HostingApi,
    repo_name: &str,
    force: bool,
    description: &str,
) -> Result<Resolution, PublishError> {
    let owner = authenticated_owner(api).await?;
    let slug = RepoSlug::new(owner, repo_name);

    match lookup_repository(api, &slug).await? {
        Some(existing) if !force => {
            info!("Repository {slug} exists; asking for overwrite confirmation");
            Ok(Resolution::ConfirmationNeeded(ConfirmationNeeded::new(
                overwrite_prompt(repo_name),
                existing.html_url,
            )))
        }
        Some(existing) => {
            info!("Repository {slug} exists; overwrite confirmed");
            Ok(Resolution::Ready(existing))
        }
        None => {
            info!("Repository {slug} not found; creating it");
            let created = create_repository(api, repo_name, description).await?;
            Ok(Resolution::Ready(created))
        }
    }
}
