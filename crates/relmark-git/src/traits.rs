//! The repository contract the changelog and submission workflows depend on

use relmark_core::Identity;

use crate::repository::{GitRepo, Result};
use crate::types::{CommitId, CommitInfo, TagRequest, UpstreamBranch};

/// Operations relmark needs from a version-controlled source tree.
///
/// [`GitRepo`] implements this over libgit2; workflows take `&dyn Repository`
/// so they can be exercised against other implementations.
pub trait Repository {
    /// Paths with uncommitted or untracked changes
    fn dirty_paths(&self) -> Result<Vec<String>>;

    /// Whether the working tree has no changes at all
    fn is_clean(&self) -> Result<bool> {
        Ok(self.dirty_paths()?.is_empty())
    }

    /// Commits reachable from `to` and not from `from`, oldest first
    fn commits_between(&self, from: &CommitId, to: &CommitId) -> Result<Vec<CommitId>>;

    /// Author, email, timestamp and subject of a commit
    fn commit_info(&self, id: &CommitId) -> Result<CommitInfo>;

    /// Short unambiguous form of a commit id
    fn short_id(&self, id: &CommitId) -> Result<String>;

    /// Resolve a revision to a commit; `RefNotFound` if it does not resolve
    fn resolve(&self, reference: &str) -> Result<CommitId>;

    /// Nearest tag reachable from `commit`; `NoTagFound` if there is none
    fn find_tag_for(&self, commit: &CommitId) -> Result<String>;

    /// Checked-out branch, `None` on a detached or unborn HEAD
    fn current_branch(&self) -> Result<Option<String>>;

    /// Remote-tracking branch configured for `branch`
    fn upstream_of(&self, branch: &str) -> Result<Option<UpstreamBranch>>;

    /// Create an annotated (optionally signed) tag
    fn create_tag(&self, request: &TagRequest) -> Result<()>;

    /// Delete a local tag
    fn delete_tag(&self, name: &str) -> Result<()>;

    /// Push `refs/tags/<name>` to `remote`
    fn push_tag(&self, remote: &str, name: &str) -> Result<()>;

    /// Configured user identity, if any
    fn user_identity(&self) -> Result<Option<Identity>>;
}

impl Repository for GitRepo {
    fn dirty_paths(&self) -> Result<Vec<String>> {
        GitRepo::dirty_paths(self)
    }

    fn commits_between(&self, from: &CommitId, to: &CommitId) -> Result<Vec<CommitId>> {
        GitRepo::commits_between(self, from, to)
    }

    fn commit_info(&self, id: &CommitId) -> Result<CommitInfo> {
        GitRepo::commit_info(self, id)
    }

    fn short_id(&self, id: &CommitId) -> Result<String> {
        GitRepo::short_id(self, id)
    }

    fn resolve(&self, reference: &str) -> Result<CommitId> {
        GitRepo::resolve(self, reference)
    }

    fn find_tag_for(&self, commit: &CommitId) -> Result<String> {
        GitRepo::find_tag_for(self, commit)
    }

    fn current_branch(&self) -> Result<Option<String>> {
        GitRepo::current_branch(self)
    }

    fn upstream_of(&self, branch: &str) -> Result<Option<UpstreamBranch>> {
        GitRepo::upstream_of(self, branch)
    }

    fn create_tag(&self, request: &TagRequest) -> Result<()> {
        GitRepo::create_tag(self, request)
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        GitRepo::delete_tag(self, name)
    }

    fn push_tag(&self, remote: &str, name: &str) -> Result<()> {
        GitRepo::push_tag(self, remote, name)
    }

    fn user_identity(&self) -> Result<Option<Identity>> {
        GitRepo::user_identity(self)
    }
}
