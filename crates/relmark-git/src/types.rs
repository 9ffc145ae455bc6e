//! Git types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full hexadecimal commit id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Wrap a hexadecimal object id
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The full id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

/// Information about a git commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit id
    pub id: CommitId,
    /// Author name
    pub author: String,
    /// Author email
    pub email: String,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// First line of the commit message
    pub subject: String,
}

impl CommitInfo {
    /// Create a new CommitInfo
    pub fn new(
        id: CommitId,
        author: impl Into<String>,
        email: impl Into<String>,
        timestamp: DateTime<Utc>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            id,
            author: author.into(),
            email: email.into(),
            timestamp,
            subject: subject.into(),
        }
    }
}

/// The remote-tracking branch configured for a local branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamBranch {
    /// Remote name, e.g. `origin`
    pub remote: String,
    /// Branch name on the remote, e.g. `release/tizen`
    pub branch: String,
}

impl UpstreamBranch {
    /// Create a new upstream description
    pub fn new(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    /// Last path component of the branch name
    pub fn base_name(&self) -> &str {
        self.branch.rsplit('/').next().unwrap_or(&self.branch)
    }
}

impl std::fmt::Display for UpstreamBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.remote, self.branch)
    }
}

/// Everything needed to create an annotated tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    /// Tag name, without `refs/tags/`
    pub name: String,
    /// Annotation message
    pub message: String,
    /// Commit the tag points to
    pub commit: CommitId,
    /// Whether to GPG-sign the tag
    pub sign: bool,
    /// Specific key to sign with
    pub key: Option<String>,
}

impl TagRequest {
    /// Whether this request needs a signature
    pub fn is_signed(&self) -> bool {
        self.sign || self.key.is_some()
    }
}
