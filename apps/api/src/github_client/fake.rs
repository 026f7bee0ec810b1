//! In-memory GitHub used by tests. Models one account's repositories as real
//! commit graphs so merge, fast-forward and Pages behaviour can be asserted.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Barrier;

use super::models::{
    AuthenticatedUser, BranchCommit, BranchInfo, CommitDetail, CreateCommit, CreatePages,
    CreateRepository, CreateTree, GitObject, PagesInfo, RepoOwner, RepoSlug, RepositoryInfo,
    ShaRef, UpdateRef,
};
use super::{GitHubError, HostingApi};
use crate::publish::models::BranchTip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    AuthenticatedUser,
    GetRepository,
    CreateRepository,
    GetBranch,
    CreateTree,
    CreateCommit,
    UpdateRef,
    GetPages,
    CreatePages,
}

#[derive(Debug, Clone)]
pub struct FakeCommit {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

type Files = BTreeMap<String, String>;

struct FakeRepo {
    default_branch: String,
    html_url: String,
    trees: HashMap<String, Files>,
    commits: HashMap<String, FakeCommit>,
    head: String,
    pages_url: Option<String>,
    tree_requests: Vec<CreateTree>,
}

struct Inner {
    login: String,
    repos: HashMap<String, FakeRepo>,
    calls: Vec<Call>,
    failures: HashMap<Call, GitHubError>,
    next_sha: u64,
    branch_barrier: Option<(Arc<Barrier>, usize)>,
}

impl Inner {
    fn sha(&mut self) -> String {
        self.next_sha += 1;
        format!("{:040x}", self.next_sha)
    }

    fn repo(&mut self, slug: &RepoSlug) -> Result<&mut FakeRepo, GitHubError> {
        if slug.owner != self.login {
            return Err(not_found());
        }
        self.repos.get_mut(&slug.name).ok_or_else(not_found)
    }

    /// Stores `files` as a tree plus a commit on top of `parent`, returning the commit sha.
    fn write_commit(&mut self, name: &str, files: Files, parent: Option<String>, message: &str) -> String {
        let tree_sha = self.sha();
        let commit_sha = self.sha();
        let repo = self.repos.get_mut(name).expect("repository exists");
        repo.trees.insert(tree_sha.clone(), files);
        repo.commits.insert(
            commit_sha.clone(),
            FakeCommit {
                message: message.to_string(),
                tree: tree_sha,
                parents: parent.into_iter().collect(),
            },
        );
        commit_sha
    }

    fn insert_repository(&mut self, name: &str, files: Files) -> RepositoryInfo {
        let html_url = format!("https://github.com/{}/{}", self.login, name);
        self.repos.insert(
            name.to_string(),
            FakeRepo {
                default_branch: "main".to_string(),
                html_url: html_url.clone(),
                trees: HashMap::new(),
                commits: HashMap::new(),
                head: String::new(),
                pages_url: None,
                tree_requests: Vec::new(),
            },
        );
        let head = self.write_commit(name, files, None, "Initial commit");
        self.repos.get_mut(name).expect("just inserted").head = head;

        RepositoryInfo {
            name: name.to_string(),
            owner: RepoOwner {
                login: self.login.clone(),
            },
            html_url,
            default_branch: Some("main".to_string()),
        }
    }
}

fn not_found() -> GitHubError {
    GitHubError::Api {
        status: 404,
        message: "Not Found".to_string(),
    }
}

fn unprocessable(message: &str) -> GitHubError {
    GitHubError::Api {
        status: 422,
        message: message.to_string(),
    }
}

/// Whether `ancestor` is reachable from `commit` through parent links.
fn descends_from(repo: &FakeRepo, commit: &str, ancestor: &str) -> bool {
    let mut pending = vec![commit.to_string()];
    let mut seen = HashSet::new();
    while let Some(sha) = pending.pop() {
        if sha == ancestor {
            return true;
        }
        if !seen.insert(sha.clone()) {
            continue;
        }
        if let Some(c) = repo.commits.get(&sha) {
            pending.extend(c.parents.iter().cloned());
        }
    }
    false
}

pub struct FakeGitHub {
    inner: Mutex<Inner>,
}

impl FakeGitHub {
    pub fn new(login: &str) -> Self {
        Self {
            inner: Mutex::new(Inner {
                login: login.to_string(),
                repos: HashMap::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
                next_sha: 0,
                branch_barrier: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Records `call` and returns the state, or the failure injected for it.
    fn begin(&self, call: Call) -> Result<MutexGuard<'_, Inner>, GitHubError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        let failure = inner.failures.remove(&call);
        match failure {
            Some(err) => Err(err),
            None => Ok(inner),
        }
    }

    /// Creates a repository whose default branch holds exactly `files`.
    pub fn seed_repository(&self, name: &str, files: &[(&str, &str)]) {
        let files = files
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect();
        self.lock().insert_repository(name, files);
    }

    /// Simulates another client pushing `files` on top of the current head.
    pub fn push_external(&self, name: &str, files: &[(&str, &str)]) {
        let mut inner = self.lock();
        let repo = &inner.repos[name];
        let head = repo.head.clone();
        let mut tree = repo.trees[&repo.commits[&head].tree].clone();
        for (p, c) in files {
            tree.insert(p.to_string(), c.to_string());
        }
        let sha = inner.write_commit(name, tree, Some(head), "External push");
        inner.repos.get_mut(name).unwrap().head = sha;
    }

    /// Fails the next call of kind `call` with `err`.
    pub fn fail_on(&self, call: Call, err: GitHubError) {
        self.lock().failures.insert(call, err);
    }

    /// Makes the next `readers` branch reads wait for each other, so they all
    /// observe the same tip.
    pub fn sync_branch_reads(&self, readers: usize) {
        self.lock().branch_barrier = Some((Arc::new(Barrier::new(readers)), readers));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn head(&self, name: &str) -> BranchTip {
        let inner = self.lock();
        let repo = &inner.repos[name];
        BranchTip {
            commit_sha: repo.head.clone(),
            tree_sha: repo.commits[&repo.head].tree.clone(),
        }
    }

    pub fn commit(&self, name: &str, sha: &str) -> FakeCommit {
        self.lock().repos[name].commits[sha].clone()
    }

    /// Files of the tree at the branch head.
    pub fn files(&self, name: &str) -> Files {
        let inner = self.lock();
        let repo = &inner.repos[name];
        repo.trees[&repo.commits[&repo.head].tree].clone()
    }

    pub fn last_tree_request(&self, name: &str) -> CreateTree {
        self.lock().repos[name]
            .tree_requests
            .last()
            .cloned()
            .expect("a tree was requested")
    }
}

#[async_trait]
impl HostingApi for FakeGitHub {
    async fn authenticated_user(&self) -> Result<AuthenticatedUser, GitHubError> {
        let inner = self.begin(Call::AuthenticatedUser)?;
        Ok(AuthenticatedUser {
            login: inner.login.clone(),
        })
    }

    async fn get_repository(
        &self,
        slug: &RepoSlug,
    ) -> Result<Option<RepositoryInfo>, GitHubError> {
        let mut inner = self.begin(Call::GetRepository)?;
        let login = inner.login.clone();
        match inner.repo(slug) {
            Ok(repo) => Ok(Some(RepositoryInfo {
                name: slug.name.clone(),
                owner: RepoOwner { login },
                html_url: repo.html_url.clone(),
                default_branch: Some(repo.default_branch.clone()),
            })),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_repository(
        &self,
        request: &CreateRepository,
    ) -> Result<RepositoryInfo, GitHubError> {
        let mut inner = self.begin(Call::CreateRepository)?;
        if inner.repos.contains_key(&request.name) {
            return Err(unprocessable("name already exists on this account"));
        }
        let mut files = Files::new();
        if request.auto_init {
            files.insert("README.md".to_string(), format!("# {}\n", request.name));
        }
        Ok(inner.insert_repository(&request.name, files))
    }

    async fn get_branch(&self, slug: &RepoSlug, branch: &str) -> Result<BranchInfo, GitHubError> {
        // The tip is read before waiting, so every synchronized reader sees
        // the same head even if another one finishes its publish first.
        let (info, barrier) = {
            let mut inner = self.begin(Call::GetBranch)?;
            let barrier = match inner.branch_barrier.take() {
                Some((barrier, remaining)) => {
                    if remaining > 1 {
                        inner.branch_barrier = Some((barrier.clone(), remaining - 1));
                    }
                    Some(barrier)
                }
                None => None,
            };
            let repo = inner.repo(slug)?;
            if branch != repo.default_branch {
                return Err(not_found());
            }
            let head = repo.head.clone();
            let tree = repo.commits[&head].tree.clone();
            let info = BranchInfo {
                name: branch.to_string(),
                commit: BranchCommit {
                    sha: head,
                    commit: CommitDetail {
                        tree: ShaRef { sha: tree },
                    },
                },
            };
            (info, barrier)
        };

        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        Ok(info)
    }

    async fn create_tree(
        &self,
        slug: &RepoSlug,
        request: &CreateTree,
    ) -> Result<GitObject, GitHubError> {
        let mut inner = self.begin(Call::CreateTree)?;
        let sha = inner.sha();
        let repo = inner.repo(slug)?;
        let mut files = match &request.base_tree {
            Some(base) => repo
                .trees
                .get(base)
                .cloned()
                .ok_or_else(|| unprocessable("base_tree is not a valid tree"))?,
            None => Files::new(),
        };
        for entry in &request.tree {
            files.insert(entry.path.clone(), entry.content.clone());
        }
        repo.trees.insert(sha.clone(), files);
        repo.tree_requests.push(request.clone());
        Ok(GitObject { sha })
    }

    async fn create_commit(
        &self,
        slug: &RepoSlug,
        request: &CreateCommit,
    ) -> Result<GitObject, GitHubError> {
        let mut inner = self.begin(Call::CreateCommit)?;
        let sha = inner.sha();
        let repo = inner.repo(slug)?;
        if !repo.trees.contains_key(&request.tree) {
            return Err(unprocessable("Tree SHA does not exist"));
        }
        if request.parents.iter().any(|p| !repo.commits.contains_key(p)) {
            return Err(unprocessable("Parent SHA does not exist or is not a commit object"));
        }
        repo.commits.insert(
            sha.clone(),
            FakeCommit {
                message: request.message.clone(),
                tree: request.tree.clone(),
                parents: request.parents.clone(),
            },
        );
        Ok(GitObject { sha })
    }

    async fn update_ref(
        &self,
        slug: &RepoSlug,
        git_ref: &str,
        request: &UpdateRef,
    ) -> Result<(), GitHubError> {
        let mut inner = self.begin(Call::UpdateRef)?;
        let repo = inner.repo(slug)?;
        if git_ref != format!("heads/{}", repo.default_branch) {
            return Err(unprocessable("Reference does not exist"));
        }
        if !repo.commits.contains_key(&request.sha) {
            return Err(unprocessable("Object does not exist"));
        }
        if !request.force && !descends_from(repo, &request.sha, &repo.head) {
            return Err(unprocessable("Update is not a fast forward"));
        }
        repo.head = request.sha.clone();
        Ok(())
    }

    async fn get_pages(&self, slug: &RepoSlug) -> Result<Option<PagesInfo>, GitHubError> {
        let mut inner = self.begin(Call::GetPages)?;
        let repo = inner.repo(slug)?;
        Ok(repo.pages_url.clone().map(|url| PagesInfo {
            html_url: Some(url),
            status: Some("built".to_string()),
        }))
    }

    async fn create_pages(
        &self,
        slug: &RepoSlug,
        request: &CreatePages,
    ) -> Result<PagesInfo, GitHubError> {
        let mut inner = self.begin(Call::CreatePages)?;
        let host = format!("{}.github.io", inner.login.to_lowercase());
        let repo = inner.repo(slug)?;
        if repo.pages_url.is_some() {
            return Err(GitHubError::Api {
                status: 409,
                message: "GitHub Pages is already enabled.".to_string(),
            });
        }
        if request.source.branch != repo.default_branch {
            return Err(unprocessable("The branch does not exist"));
        }
        let url = format!("https://{host}/{}/", slug.name);
        repo.pages_url = Some(url.clone());
        Ok(PagesInfo {
            html_url: Some(url),
            status: None,
        })
    }
}
