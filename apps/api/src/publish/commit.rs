//! Commit Sequencer: records the new tree as a commit on the branch tip and
//! moves the branch to it. The ref update is the only step that makes a
//! publish visible.

use tracing::info;

use crate::github_client::models::{CreateCommit, UpdateRef};
use crate::github_client::HostingApi;
use crate::publish::error::{PublishError, Stage};
use crate::publish::messages::COMMIT_MESSAGE;
use crate::publish::models::Repository;

/// Creates a commit for `tree_sha` whose only parent is `parent_sha`.
pub async fn create_commit(
    api: &dyn HostingApi,
    repo: &Repository,
    tree_sha: &str,
    parent_sha: &str,
) -> Result<String, PublishError> {
    let request = CreateCommit {
        message: COMMIT_MESSAGE.to_string(),
        tree: tree_sha.to_string(),
        parents: vec![parent_sha.to_string()],
    };

    let commit = api
        .create_commit(&repo.slug(), &request)
        .await
        .map_err(|e| PublishError::remote(Stage::Committing, e))?;

    Ok(commit.sha)
}

/// Points `heads/<default_branch>` at `commit_sha` without forcing.
///
/// If another push moved the branch since the tip was read, GitHub refuses the
/// update as a non-fast-forward and the error is returned as-is.
pub async fn advance_branch(
    api: &dyn HostingApi,
    repo: &Repository,
    commit_sha: &str,
) -> Result<(), PublishError> {
    let git_ref = repo.branch_ref();
    let request = UpdateRef {
        sha: commit_sha.to_string(),
        force: false,
    };

    api.update_ref(&repo.slug(), &git_ref, &request)
        .await
        .map_err(|e| PublishError::remote(Stage::UpdatingRef, e))?;

    info!(
        "Advanced {}/{} {git_ref} to {commit_sha}",
        repo.owner, repo.name
    );
    Ok(())
}
