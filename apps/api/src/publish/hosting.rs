//! Hosting Activator: makes sure GitHub Pages serves the default branch root.
//!
//! Pages provisioning is asynchronous on GitHub's side, so nothing here can
//! fail a publish. Every failure degrades to the expected URL with
//! `PagesStatus::Unverified`.

use tracing::{info, warn};

use crate::github_client::models::{CreatePages, PagesSource};
use crate::github_client::HostingApi;
use crate::publish::messages::{PAGES_DOMAIN, PAGES_SOURCE_PATH};
use crate::publish::models::{HostingSite, PagesStatus, Repository};

/// Deterministic Pages URL for a repository. `<owner>.github.io` repositories
/// are user sites served from the domain root.
pub fn expected_pages_url(owner: &str, repo_name: &str) -> String {
    let host = format!("{}.{PAGES_DOMAIN}", owner.to_lowercase());
    if repo_name.eq_ignore_ascii_case(&host) {
        format!("https://{host}/")
    } else {
        format!("https://{host}/{repo_name}/")
    }
}

pub async fn ensure_pages(api: &dyn HostingApi, repo: &Repository) -> HostingSite {
    let slug = repo.slug();
    let expected = expected_pages_url(&repo.owner, &repo.name);

    match api.get_pages(&slug).await {
        Ok(Some(pages)) => {
            let public_url = pages.html_url.unwrap_or(expected);
            info!("Pages already enabled for {slug} at {public_url}");
            return HostingSite {
                public_url,
                status: PagesStatus::Active,
            };
        }
        Ok(None) => {}
        Err(e) => {
            warn!("Could not read Pages status for {slug}: {e}");
            return HostingSite {
                public_url: expected,
                status: PagesStatus::Unverified,
            };
        }
    }

    let request = CreatePages {
        source: PagesSource {
            branch: repo.default_branch.clone(),
            path: PAGES_SOURCE_PATH.to_string(),
        },
    };

    match api.create_pages(&slug, &request).await {
        Ok(pages) => {
            let public_url = pages.html_url.unwrap_or(expected);
            info!("Requested Pages for {slug} at {public_url}");
            HostingSite {
                public_url,
                status: PagesStatus::Requested,
            }
        }
        Err(e) if e.status() == Some(409) => {
            info!("Pages for {slug} was enabled concurrently: {e}");
            HostingSite {
                public_url: expected,
                status: PagesStatus::Requested,
            }
        }
        Err(e) => {
            warn!("Pages activation for {slug} failed, reporting expected URL: {e}");
            HostingSite {
                public_url: expected,
                status: PagesStatus::Unverified,
            }
        }
    }
}
