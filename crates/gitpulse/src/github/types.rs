//! Repository references and API endpoint paths.

use std::fmt;

use crate::entity::record_kind::RecordKind;

/// A parsed `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse an `owner/name` reference. Returns `None` when either half is
    /// missing or empty.
    pub fn parse(reference: &str) -> Option<Self> {
        let (owner, name) = reference.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// The full `owner/name` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A paginated API endpoint path, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: String,
}

impl Endpoint {
    /// `/repos/{owner}/{name}/commits`
    pub fn commits(repo: &RepoRef) -> Self {
        Self {
            path: format!("/repos/{}/{}/commits", repo.owner, repo.name),
        }
    }

    /// `/repos/{owner}/{name}/pulls`
    pub fn pulls(repo: &RepoRef) -> Self {
        Self {
            path: format!("/repos/{}/{}/pulls", repo.owner, repo.name),
        }
    }

    /// `/repos/{owner}/{name}/issues`
    pub fn issues(repo: &RepoRef) -> Self {
        Self {
            path: format!("/repos/{}/{}/issues", repo.owner, repo.name),
        }
    }

    /// `/repos/{owner}/{name}/pulls/{number}/reviews`
    pub fn pr_reviews(repo: &RepoRef, number: u64) -> Self {
        Self {
            path: format!("/repos/{}/{}/pulls/{}/reviews", repo.owner, repo.name, number),
        }
    }

    /// The list endpoint for a kind, if it has one.
    ///
    /// Reviews have no repository-level endpoint - they are fetched per
    /// pull request via [`Endpoint::pr_reviews`].
    pub fn for_kind(kind: RecordKind, repo: &RepoRef) -> Option<Self> {
        match kind {
            RecordKind::Commit => Some(Self::commits(repo)),
            RecordKind::PullRequest => Some(Self::pulls(repo)),
            RecordKind::Issue => Some(Self::issues(repo)),
            RecordKind::Review => None,
        }
    }

    /// Path relative to the API base URL.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
