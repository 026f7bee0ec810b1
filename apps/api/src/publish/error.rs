use serde::Serialize;
use thiserror::Error;

use crate::github_client::GitHubError;

/// Pipeline step in which a remote call was made. Ordered by execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolving,
    BuildingTree,
    Committing,
    UpdatingRef,
}

impl Stage {
    /// Failures before the ref update leave the published site untouched.
    pub fn precedes_ref_update(self) -> bool {
        self < Stage::UpdatingRef
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Stage::Resolving => "resolving the repository",
            Stage::BuildingTree => "building the file tree",
            Stage::Committing => "creating the commit",
            Stage::UpdatingRef => "updating the branch",
        };
        f.write_str(label)
    }
}

/// Machine-checkable failure category, reported alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    RemoteRejected,
    Timeout,
    Transport,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::RemoteRejected => "REMOTE_REJECTED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Transport => "TRANSPORT",
        }
    }
}

/// What a caller may do after a failed publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryAdvice {
    /// Retrying the same request will fail the same way.
    Never,
    /// Nothing became visible; the whole request can be re-sent.
    Safe,
    /// The branch may already have moved; re-resolve before re-sending.
    VerifyFirst,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{message}")]
    Unauthenticated { message: String },

    #[error("{message}")]
    RemoteRejected {
        stage: Stage,
        status: u16,
        message: String,
    },

    #[error("GitHub did not respond in time while {stage}")]
    Timeout { stage: Stage },

    #[error("{message}")]
    Transport { stage: Stage, message: String },
}

impl PublishError {
    /// Classifies a client error raised during `stage`. Messages are kept verbatim.
    pub fn remote(stage: Stage, err: GitHubError) -> Self {
        match err {
            GitHubError::Api { status: 401, message } => PublishError::Unauthenticated { message },
            GitHubError::Api { status, message } => PublishError::RemoteRejected {
                stage,
                status,
                message,
            },
            GitHubError::Timeout => PublishError::Timeout { stage },
            GitHubError::Http(e) => PublishError::Transport {
                stage,
                message: e.to_string(),
            },
            GitHubError::Parse(e) => PublishError::Transport {
                stage,
                message: format!("Unexpected response from GitHub: {e}"),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::InvalidRequest(_) => ErrorKind::Validation,
            PublishError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            PublishError::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            PublishError::Timeout { .. } => ErrorKind::Timeout,
            PublishError::Transport { .. } => ErrorKind::Transport,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            PublishError::InvalidRequest(_) | PublishError::Unauthenticated { .. } => None,
            PublishError::RemoteRejected { stage, .. }
            | PublishError::Timeout { stage }
            | PublishError::Transport { stage, .. } => Some(*stage),
        }
    }

    pub fn retry(&self) -> RetryAdvice {
        match self {
            PublishError::InvalidRequest(_) | PublishError::Unauthenticated { .. } => {
                RetryAdvice::Never
            }
            PublishError::RemoteRejected {
                stage,
                status,
                message,
            } => {
                if is_rate_limited(*status, message) {
                    // GitHub refuses before doing any work.
                    return RetryAdvice::Safe;
                }
                let server_side = *status >= 500;
                if stage.precedes_ref_update() {
                    if server_side {
                        RetryAdvice::Safe
                    } else {
                        RetryAdvice::Never
                    }
                } else if server_side {
                    RetryAdvice::VerifyFirst
                } else if matches!(status, 409 | 422) {
                    // The ref did not move: lost a race against another push.
                    RetryAdvice::Safe
                } else {
                    RetryAdvice::Never
                }
            }
            PublishError::Timeout { stage } | PublishError::Transport { stage, .. } => {
                if stage.precedes_ref_update() {
                    RetryAdvice::Safe
                } else {
                    RetryAdvice::VerifyFirst
                }
            }
        }
    }
}

/// GitHub signals primary rate limits with 403 and secondary ones with 403 or 429.
fn is_rate_limited(status: u16, message: &str) -> bool {
    status == 429 || (status == 403 && message.to_ascii_lowercase().contains("rate limit"))
}
