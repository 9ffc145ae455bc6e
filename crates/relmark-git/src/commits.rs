//! Commit history operations

use chrono::{TimeZone, Utc};
use git2::{ErrorCode, Oid, Sort};
use tracing::{debug, instrument};

use crate::repository::{GitRepo, Result};
use crate::types::{CommitId, CommitInfo};
use relmark_core::error::GitError;

impl GitRepo {
    /// Resolve a revision expression (branch, tag, sha, `HEAD~2`, ...) to a commit
    #[instrument(skip(self))]
    pub fn resolve(&self, reference: &str) -> Result<CommitId> {
        let object = self.repo.revparse_single(reference).map_err(|e| match e.code() {
            ErrorCode::NotFound
            | ErrorCode::InvalidSpec
            | ErrorCode::Ambiguous
            | ErrorCode::UnbornBranch => GitError::RefNotFound(reference.to_string()),
            _ => GitError::Git2(e),
        })?;

        let commit = object
            .peel_to_commit()
            .map_err(|_| GitError::RefNotFound(reference.to_string()))?;

        debug!(reference, commit = %commit.id(), "resolved reference");
        Ok(commit.id().into())
    }

    /// Commits reachable from `to` but not from `from`, oldest first
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub fn commits_between(&self, from: &CommitId, to: &CommitId) -> Result<Vec<CommitId>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
        revwalk.push(self.oid(to)?)?;
        revwalk.hide(self.oid(from)?)?;

        let commits = revwalk
            .map(|oid| oid.map(CommitId::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(count = commits.len(), "walked commit range");
        Ok(commits)
    }

    /// Author, time and subject of a commit
    pub fn commit_info(&self, id: &CommitId) -> Result<CommitInfo> {
        let commit = self
            .repo
            .find_commit(self.oid(id)?)
            .map_err(|_| GitError::RefNotFound(id.to_string()))?;
        Ok(commit_to_info(&commit))
    }

    /// Shortest unambiguous abbreviation of a commit id
    pub fn short_id(&self, id: &CommitId) -> Result<String> {
        let object = self
            .repo
            .find_object(self.oid(id)?, None)
            .map_err(|_| GitError::RefNotFound(id.to_string()))?;
        let short = object.short_id()?;
        Ok(short.as_str().unwrap_or_default().to_string())
    }

    fn oid(&self, id: &CommitId) -> Result<Oid> {
        Oid::from_str(id.as_str()).map_err(|_| GitError::RefNotFound(id.to_string()))
    }
}

/// Convert a git2 Commit to CommitInfo
fn commit_to_info(commit: &git2::Commit<'_>) -> CommitInfo {
    let author = commit.author();

    let subject = commit.summary().unwrap_or("(no message)").to_string();

    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);

    CommitInfo::new(
        commit.id().into(),
        author.name().unwrap_or("Unknown"),
        author.email().unwrap_or("unknown@example.com"),
        timestamp,
        subject,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature, Time};
    use std::path::Path;
    use tempfile::TempDir;

    fn commit_at(repo: &Repository, name: &str, seconds: i64, message: &str) -> Oid {
        let sig = Signature::new(name, &format!("{}@example.com", name.to_lowercase()), &Time::new(seconds, 0)).unwrap();
        let workdir = repo.workdir().unwrap().to_path_buf();
        std::fs::write(workdir.join("file.txt"), message).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("file.txt")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit().unwrap()],
            Err(_) => Vec::new(),
        };
        let parents: Vec<_> = parents.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn setup_repo_with_commits() -> (TempDir, GitRepo, Vec<Oid>) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        let oids = vec![
            commit_at(&repo, "Alice", 1_700_000_000, "Initial commit"),
            commit_at(&repo, "Alice", 1_700_000_100, "Add parser"),
            commit_at(&repo, "Bob", 1_700_090_000, "Fix parser\n\nLonger body"),
        ];

        let git_repo = GitRepo::open(temp.path()).unwrap();
        (temp, git_repo, oids)
    }

    #[test]
    fn test_resolve_head() {
        let (_temp, repo, oids) = setup_repo_with_commits();
        let head = repo.resolve("HEAD").unwrap();
        assert_eq!(head, CommitId::from(oids[2]));
        assert_eq!(repo.resolve("HEAD~2").unwrap(), CommitId::from(oids[0]));
    }

    #[test]
    fn test_resolve_unknown_ref() {
        let (_temp, repo, _oids) = setup_repo_with_commits();
        let result = repo.resolve("no-such-branch");
        assert!(matches!(result, Err(GitError::RefNotFound(r)) if r == "no-such-branch"));
    }

    #[test]
    fn test_commits_between_oldest_first() {
        let (_temp, repo, oids) = setup_repo_with_commits();
        let from = CommitId::from(oids[0]);
        let to = repo.resolve("HEAD").unwrap();

        let commits = repo.commits_between(&from, &to).unwrap();
        assert_eq!(commits, vec![CommitId::from(oids[1]), CommitId::from(oids[2])]);
    }

    #[test]
    fn test_commits_between_empty() {
        let (_temp, repo, _oids) = setup_repo_with_commits();
        let head = repo.resolve("HEAD").unwrap();
        assert!(repo.commits_between(&head, &head).unwrap().is_empty());
    }

    #[test]
    fn test_commit_info() {
        let (_temp, repo, oids) = setup_repo_with_commits();
        let info = repo.commit_info(&CommitId::from(oids[2])).unwrap();
        assert_eq!(info.author, "Bob");
        assert_eq!(info.email, "bob@example.com");
        assert_eq!(info.subject, "Fix parser");
        assert_eq!(info.timestamp.timestamp(), 1_700_090_000);
    }

    #[test]
    fn test_short_id_is_prefix() {
        let (_temp, repo, oids) = setup_repo_with_commits();
        let id = CommitId::from(oids[1]);
        let short = repo.short_id(&id).unwrap();
        assert!(short.len() >= 7);
        assert!(id.as_str().starts_with(&short));
    }
}
