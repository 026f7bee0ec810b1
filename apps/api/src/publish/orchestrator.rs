//! Publish Orchestrator: the state machine that sequences resolver, tree
//! builder, commit sequencer and hosting activator for one request.
//!
//! ```text
//! Start → Resolving ─┬─ exists, no force ────────────────────────────→ ConfirmationNeeded
//!                    └─ ready → BuildingTree → Committing → UpdatingRef → ActivatingHosting → Published
//!                       (no files: ready → ActivatingHosting)
//! any remote failure except in ActivatingHosting → Err(PublishError)
//! ```
//!
//! Nothing is written before `Resolving` has decided the repository may be
//! written to.

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::github_client::models::TreeEntry;
use crate::github_client::HostingApi;
use crate::publish::commit::{advance_branch, create_commit};
use crate::publish::error::PublishError;
use crate::publish::hosting::ensure_pages;
use crate::publish::messages::PUBLISHED_MESSAGE;
use crate::publish::models::{PublishOutcome, PublishRequest, Published, Repository};
use crate::publish::resolver::{resolve_repository, Resolution};
use crate::publish::tree_builder::{build_tree, read_branch_tip, tree_entries};

const MAX_REPO_NAME_LEN: usize = 100;

enum State {
    Start(PublishRequest),
    Resolving {
        repo_name: String,
        force: bool,
        entries: Vec<TreeEntry>,
    },
    BuildingTree {
        repo: Repository,
        entries: Vec<TreeEntry>,
    },
    Committing {
        repo: Repository,
        tree_sha: String,
        parent_sha: String,
    },
    UpdatingRef {
        repo: Repository,
        commit_sha: String,
    },
    ActivatingHosting {
        repo: Repository,
        commit_sha: Option<String>,
    },
    Finished(PublishOutcome),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Start(_) => "start",
            State::Resolving { .. } => "resolving",
            State::BuildingTree { .. } => "building_tree",
            State::Committing { .. } => "committing",
            State::UpdatingRef { .. } => "updating_ref",
            State::ActivatingHosting { .. } => "activating_hosting",
            State::Finished(_) => "finished",
        }
    }
}

/// Checks a repository name against GitHub's naming rules.
pub fn validate_repo_name(name: &str) -> Result<(), PublishError> {
    if name.trim().is_empty() {
        return Err(PublishError::InvalidRequest(
            "Repository name is required".to_string(),
        ));
    }
    if name.len() > MAX_REPO_NAME_LEN {
        return Err(PublishError::InvalidRequest(format!(
            "Repository name must be at most {MAX_REPO_NAME_LEN} characters"
        )));
    }
    if name == "." || name == ".." {
        return Err(PublishError::InvalidRequest(format!(
            "'{name}' is not a valid repository name"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(PublishError::InvalidRequest(format!(
            "Repository name contains invalid character '{bad}'"
        )));
    }
    Ok(())
}

/// Runs publish requests against one authenticated GitHub session.
pub struct Publisher<'a> {
    api: &'a dyn HostingApi,
    repo_description: &'a str,
}

impl<'a> Publisher<'a> {
    pub fn new(api: &'a dyn HostingApi, repo_description: &'a str) -> Self {
        Self {
            api,
            repo_description,
        }
    }

    pub async fn publish(&self, request: PublishRequest) -> Result<PublishOutcome, PublishError> {
        let span = info_span!("publish", id = %Uuid::new_v4(), repo = %request.repo_name);

        let result = self.run(request).instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(PublishOutcome::Published(published)) => {
                info!("Published to {} ({})", published.repo_url, published.pages_url)
            }
            Ok(PublishOutcome::ConfirmationNeeded(_)) => info!("Awaiting overwrite confirmation"),
            Err(e) => warn!(kind = e.kind().code(), "Publish failed: {e}"),
        });
        result
    }

    async fn run(&self, request: PublishRequest) -> Result<PublishOutcome, PublishError> {
        let mut state = State::Start(request);
        loop {
            debug!("Entering state {}", state.name());
            state = match state {
                State::Finished(outcome) => return Ok(outcome),
                other => self.step(other).await?,
            };
        }
    }

    async fn step(&self, state: State) -> Result<State, PublishError> {
        let next = match state {
            State::Start(request) => {
                validate_repo_name(&request.repo_name)?;
                let entries = tree_entries(&request.files)?;
                State::Resolving {
                    repo_name: request.repo_name,
                    force: request.force,
                    entries,
                }
            }

            State::Resolving {
                repo_name,
                force,
                entries,
            } => {
                match resolve_repository(self.api, &repo_name, force, self.repo_description)
                    .await?
                {
                    Resolution::ConfirmationNeeded(confirm) => {
                        State::Finished(PublishOutcome::ConfirmationNeeded(confirm))
                    }
                    Resolution::Ready(repo) if entries.is_empty() => {
                        info!("No files to publish; skipping commit");
                        State::ActivatingHosting {
                            repo,
                            commit_sha: None,
                        }
                    }
                    Resolution::Ready(repo) => State::BuildingTree { repo, entries },
                }
            }

            State::BuildingTree { repo, entries } => {
                let tip = read_branch_tip(self.api, &repo).await?;
                let tree_sha = build_tree(self.api, &repo, &tip.tree_sha, entries).await?;
                State::Committing {
                    repo,
                    tree_sha,
                    parent_sha: tip.commit_sha,
                }
            }

            State::Committing {
                repo,
                tree_sha,
                parent_sha,
            } => {
                let commit_sha = create_commit(self.api, &repo, &tree_sha, &parent_sha).await?;
                State::UpdatingRef { repo, commit_sha }
            }

            State::UpdatingRef { repo, commit_sha } => {
                advance_branch(self.api, &repo, &commit_sha).await?;
                State::ActivatingHosting {
                    repo,
                    commit_sha: Some(commit_sha),
                }
            }

            State::ActivatingHosting { repo, commit_sha } => {
                let hosting = ensure_pages(self.api, &repo).await;
                State::Finished(PublishOutcome::Published(Published::new(
                    repo,
                    hosting,
                    PUBLISHED_MESSAGE.to_string(),
                    commit_sha,
                )))
            }

            finished @ State::Finished(_) => finished,
        };
        Ok(next)
    }
}
