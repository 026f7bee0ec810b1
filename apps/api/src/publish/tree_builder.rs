//! Object Builder: turns the request's files into a single tree on top of the
//! current branch tip. Blobs are created server-side by the same call.

use std::collections::HashMap;

use tracing::debug;

use crate::github_client::models::{CreateTree, TreeEntry};
use crate::github_client::HostingApi;
use crate::publish::error::{PublishError, Stage};
use crate::publish::models::{BranchTip, FileEntry, Repository, REGULAR_FILE_MODE};

/// Normalizes a repository-relative path, rejecting anything that would
/// escape the root or that the Git Data API refuses.
pub fn normalize_path(raw: &str) -> Result<String, PublishError> {
    let invalid = |reason: &str| PublishError::InvalidRequest(format!("Invalid file path '{raw}': {reason}"));

    if raw.contains('\\') {
        return Err(invalid("backslashes are not allowed"));
    }

    let mut path = raw.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid("empty, '.' or '..' segments are not allowed"));
    }

    Ok(path.to_string())
}

/// Builds the tree entries for a request. Paths are normalized first; when a
/// path repeats, the entry keeps its first position and the last content.
pub fn tree_entries(files: &[FileEntry]) -> Result<Vec<TreeEntry>, PublishError> {
    let mut entries: Vec<TreeEntry> = Vec::with_capacity(files.len());
    let mut index_by_path: HashMap<String, usize> = HashMap::new();

    for file in files {
        let path = normalize_path(&file.path)?;
        match index_by_path.get(&path) {
            Some(&i) => entries[i].content = file.content.clone(),
            None => {
                index_by_path.insert(path.clone(), entries.len());
                entries.push(TreeEntry {
                    path,
                    mode: REGULAR_FILE_MODE.to_string(),
                    kind: "blob".to_string(),
                    content: file.content.clone(),
                });
            }
        }
    }

    Ok(entries)
}

/// Reads the tip of the repository's default branch: the parent commit and
/// its tree, from one lookup.
pub async fn read_branch_tip(
    api: &dyn HostingApi,
    repo: &Repository,
) -> Result<BranchTip, PublishError> {
    let branch = api
        .get_branch(&repo.slug(), &repo.default_branch)
        .await
        .map_err(|e| PublishError::remote(Stage::BuildingTree, e))?;

    Ok(BranchTip {
        commit_sha: branch.commit.sha,
        tree_sha: branch.commit.commit.tree.sha,
    })
}

/// Submits all entries in one tree call based on `base_tree_sha`. Files already
/// in the base tree and absent from `entries` are kept.
pub async fn build_tree(
    api: &dyn HostingApi,
    repo: &Repository,
    base_tree_sha: &str,
    entries: Vec<TreeEntry>,
) -> Result<String, PublishError> {
    let count = entries.len();
    let request = CreateTree {
        base_tree: Some(base_tree_sha.to_string()),
        tree: entries,
    };

    let tree = api
        .create_tree(&repo.slug(), &request)
        .await
        .map_err(|e| PublishError::remote(Stage::BuildingTree, e))?;

    debug!("Created tree {} with {count} entries on base {base_tree_sha}", tree.sha);
    Ok(tree.sha)
}
