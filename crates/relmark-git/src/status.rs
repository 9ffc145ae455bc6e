//! Working tree and branch status

use git2::{BranchType, ErrorCode, Status, StatusOptions};
use tracing::debug;

use crate::repository::{GitRepo, Result};
use crate::types::UpstreamBranch;
use relmark_core::error::GitError;

impl GitRepo {
    /// Paths with staged, unstaged or untracked changes
    pub fn dirty_paths(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let paths: Vec<String> = statuses
            .iter()
            .filter(|entry| {
                let status = entry.status();
                status != Status::CURRENT && !status.is_ignored()
            })
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect();

        debug!(count = paths.len(), "collected dirty paths");
        Ok(paths)
    }

    /// Check if the working directory is clean (no uncommitted changes)
    pub fn is_clean(&self) -> Result<bool> {
        Ok(self.dirty_paths()?.is_empty())
    }

    /// Get the current branch name
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            // Detached HEAD
            Ok(None)
        }
    }

    /// The remote-tracking branch configured for a local branch, if any
    pub fn upstream_of(&self, branch: &str) -> Result<Option<UpstreamBranch>> {
        let local = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|e| match e.code() {
                ErrorCode::NotFound => GitError::RefNotFound(branch.to_string()),
                _ => GitError::Git2(e),
            })?;

        let upstream = match local.upstream() {
            Ok(upstream) => upstream,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let remote = self
            .repo
            .branch_upstream_remote(&format!("refs/heads/{}", branch))?;
        let remote = remote.as_str().unwrap_or_default().to_string();

        let full_name = upstream.name()?.unwrap_or_default().to_string();
        let branch_name = full_name
            .strip_prefix(&format!("{}/", remote))
            .unwrap_or(&full_name)
            .to_string();

        debug!(branch, remote = %remote, upstream = %branch_name, "resolved upstream");
        Ok(Some(UpstreamBranch::new(remote, branch_name)))
    }
}
