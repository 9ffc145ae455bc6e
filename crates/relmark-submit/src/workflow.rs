//! The submission workflow
//!
//! Refuse a dirty tree, resolve the commit, plan the tag name, settle the
//! message and then publish through [`TagPublication`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use relmark_core::config::Config;
use relmark_core::error::{GitError, Result};
use relmark_core::Editor;
use relmark_git::{CommitId, Repository};

use crate::message::compose_message;
use crate::planner::TagPlanner;
use crate::protocol::{PublicationState, ReleaseTag, TagPublication};

/// Options for a submission
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Tag message; composed in the editor when unset
    pub message: Option<String>,
    /// Revision to tag
    pub commit: String,
    /// Target branch, bypassing upstream detection
    pub target: Option<String>,
    /// Remote to push to; the configured one when unset
    pub remote: Option<String>,
    pub sign: bool,
    pub user_key: Option<String>,
    /// Submit even with uncommitted changes
    pub allow_dirty: bool,
    /// Plan only, create nothing
    pub dry_run: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            message: None,
            commit: "HEAD".to_string(),
            target: None,
            remote: None,
            sign: false,
            user_key: None,
            allow_dirty: false,
            dry_run: false,
        }
    }
}

/// A fully planned submission, not yet published
#[derive(Debug, Clone, Serialize)]
pub struct PreparedSubmission {
    pub tag: ReleaseTag,
    pub remote: String,
    pub warnings: Vec<String>,
}

/// What a submission did
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    pub tag: String,
    pub target_branch: String,
    pub commit: CommitId,
    pub remote: String,
    pub signed: bool,
    pub state: PublicationState,
    pub warnings: Vec<String>,
}

impl SubmitReport {
    pub fn new(prepared: PreparedSubmission, state: PublicationState) -> Self {
        Self {
            signed: prepared.tag.is_signed(),
            tag: prepared.tag.name,
            target_branch: prepared.tag.target_branch,
            commit: prepared.tag.commit,
            remote: prepared.remote,
            state,
            warnings: prepared.warnings,
        }
    }

    pub fn pushed(&self) -> bool {
        self.state == PublicationState::Pushed
    }
}

/// Runs submissions against a repository
pub struct SubmitWorkflow<'a> {
    repo: &'a dyn Repository,
    config: &'a Config,
    editor: &'a dyn Editor,
    now: Option<DateTime<Utc>>,
}

impl<'a> SubmitWorkflow<'a> {
    pub fn new(repo: &'a dyn Repository, config: &'a Config, editor: &'a dyn Editor) -> Self {
        Self {
            repo,
            config,
            editor,
            now: None,
        }
    }

    /// Use a fixed clock for the tag timestamp
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Check the tree, plan the tag and settle the message
    #[instrument(skip(self, options), fields(commit = %options.commit, target = ?options.target))]
    pub fn prepare(&self, options: &SubmitOptions) -> Result<PreparedSubmission> {
        if self.config.submit.require_clean && !options.allow_dirty {
            let dirty = self.repo.dirty_paths()?;
            if !dirty.is_empty() {
                return Err(GitError::DirtyTree { paths: dirty }.into());
            }
        }

        let commit = self.repo.resolve(&options.commit)?;
        let remote = options
            .remote
            .clone()
            .unwrap_or_else(|| self.config.submit.remote.clone());
        let current_branch = self.repo.current_branch()?;

        let plan = TagPlanner::from_config(&self.config.submit).plan(
            current_branch.as_deref(),
            options.target.as_deref(),
            |branch| self.repo.upstream_of(branch),
            &remote,
            self.now.unwrap_or_else(Utc::now),
        )?;

        let message = match &options.message {
            Some(message) => message.clone(),
            None if options.dry_run => String::new(),
            None => compose_message(self.editor, &plan.name)?,
        };

        let sign = options.sign || self.config.submit.sign;
        let signing_key = options
            .user_key
            .clone()
            .or_else(|| self.config.submit.user_key.clone());

        let warnings = plan.warnings.clone();
        let tag = plan.into_tag(commit, message, sign, signing_key);

        Ok(PreparedSubmission {
            tag,
            remote,
            warnings,
        })
    }

    /// Create and push a prepared tag
    #[instrument(skip(self, prepared), fields(tag = %prepared.tag.name, remote = %prepared.remote))]
    pub fn publish(&self, prepared: PreparedSubmission) -> Result<SubmitReport> {
        let mut publication =
            TagPublication::new(self.repo, prepared.remote.clone(), prepared.tag.clone());
        publication.publish()?;

        info!(tag = %prepared.tag.name, remote = %prepared.remote, "submission published");
        Ok(SubmitReport::new(prepared, publication.state()))
    }

    /// Prepare and, unless this is a dry run, publish
    pub fn run(&self, options: &SubmitOptions) -> Result<SubmitReport> {
        let prepared = self.prepare(options)?;
        for warning in &prepared.warnings {
            warn!("{}", warning);
        }

        if options.dry_run {
            info!(tag = %prepared.tag.name, "dry run, tag not created");
            return Ok(SubmitReport::new(prepared, PublicationState::Planned));
        }

        self.publish(prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use git2::Signature;
    use relmark_core::error::SubmitError;
    use relmark_core::{PassThrough, PushMethod, RelmarkError};
    use relmark_git::GitRepo;
    use std::path::Path;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
    }

    /// A repository on `master` with one commit
    fn setup_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        let raw = git2::Repository::init(temp.path()).unwrap();
        raw.set_head("refs/heads/master").unwrap();
        {
            let mut config = raw.config().unwrap();
            config.set_str("user.name", "Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        let sig = Signature::now("Test", "test@example.com").unwrap();
        std::fs::write(temp.path().join("file.txt"), "content").unwrap();
        let mut index = raw.index().unwrap();
        index.add_path(Path::new("file.txt")).unwrap();
        index.write().unwrap();
        let tree = raw.find_tree(index.write_tree().unwrap()).unwrap();
        raw.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();

        let repo = GitRepo::open(temp.path())
            .unwrap()
            .with_push_method(PushMethod::Libgit2);
        (temp, repo)
    }

    /// Add an `origin` remote and reopen the repository
    fn with_origin(path: &Path, url: &str) -> GitRepo {
        git2::Repository::open(path)
            .unwrap()
            .remote("origin", url)
            .unwrap();
        GitRepo::open(path)
            .unwrap()
            .with_push_method(PushMethod::Libgit2)
    }

    fn local_tags(path: &Path) -> Vec<String> {
        let raw = git2::Repository::open(path).unwrap();
        let names = raw.tag_names(None).unwrap();
        names.iter().flatten().map(str::to_string).collect()
    }

    fn options(message: &str) -> SubmitOptions {
        SubmitOptions {
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_to_bare_remote() {
        let (temp, _) = setup_repo();
        let remote_dir = TempDir::new().unwrap();
        let bare = git2::Repository::init_bare(remote_dir.path()).unwrap();
        let repo = with_origin(temp.path(), &format!("file://{}", remote_dir.path().display()));

        let config = Config::default();
        let report = SubmitWorkflow::new(&repo, &config, &PassThrough)
            .with_now(now())
            .run(&options("Release"))
            .unwrap();

        assert!(report.pushed());
        assert_eq!(report.tag, "submit/trunk/20240305.140709");
        assert_eq!(report.target_branch, "trunk");
        assert_eq!(report.warnings.len(), 1);
        assert!(bare
            .find_reference("refs/tags/submit/trunk/20240305.140709")
            .is_ok());
    }

    #[test]
    fn test_dirty_tree_creates_no_tag() {
        let (temp, repo) = setup_repo();
        std::fs::write(temp.path().join("file.txt"), "changed").unwrap();

        let config = Config::default();
        let result = SubmitWorkflow::new(&repo, &config, &PassThrough)
            .with_now(now())
            .run(&options("Release"));

        assert!(matches!(
            result,
            Err(RelmarkError::Git(GitError::DirtyTree { paths })) if paths == vec!["file.txt".to_string()]
        ));
        assert!(local_tags(repo.path()).is_empty());
    }

    #[test]
    fn test_allow_dirty() {
        let (temp, repo) = setup_repo();
        std::fs::write(temp.path().join("file.txt"), "changed").unwrap();

        let config = Config::default();
        let report = SubmitWorkflow::new(&repo, &config, &PassThrough)
            .with_now(now())
            .run(&SubmitOptions {
                allow_dirty: true,
                dry_run: true,
                ..options("Release")
            })
            .unwrap();
        assert_eq!(report.state, PublicationState::Planned);
    }

    #[test]
    fn test_dry_run_creates_nothing() {
        let (_temp, repo) = setup_repo();
        let config = Config::default();

        let report = SubmitWorkflow::new(&repo, &config, &PassThrough)
            .with_now(now())
            .run(&SubmitOptions {
                dry_run: true,
                target: Some("devel".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(report.tag, "submit/devel/20240305.140709");
        assert!(!report.pushed());
        assert!(local_tags(repo.path()).is_empty());
    }

    #[test]
    fn test_push_failure_leaves_no_tag() {
        let (temp, _) = setup_repo();
        let unreachable = temp.path().join("missing-remote.git");
        let repo = with_origin(temp.path(), &format!("file://{}", unreachable.display()));

        let config = Config::default();
        let result = SubmitWorkflow::new(&repo, &config, &PassThrough)
            .with_now(now())
            .run(&options("Release"));

        assert!(matches!(
            result,
            Err(RelmarkError::Submit(SubmitError::TagPush { .. }))
        ));
        assert!(local_tags(repo.path()).is_empty());
    }

    #[test]
    fn test_unknown_commit() {
        let (_temp, repo) = setup_repo();
        let config = Config::default();

        let result = SubmitWorkflow::new(&repo, &config, &PassThrough).run(&SubmitOptions {
            commit: "no-such-ref".to_string(),
            ..options("Release")
        });
        assert!(matches!(
            result,
            Err(RelmarkError::Git(GitError::RefNotFound(_)))
        ));
    }

    #[test]
    fn test_missing_message_uses_editor() {
        let (_temp, repo) = setup_repo();
        let config = Config::default();

        let result = SubmitWorkflow::new(&repo, &config, &PassThrough)
            .with_now(now())
            .prepare(&SubmitOptions::default());
        assert!(matches!(
            result,
            Err(RelmarkError::Submit(SubmitError::Cancelled))
        ));
    }

    #[test]
    fn test_configured_signing_key() {
        let (_temp, repo) = setup_repo();
        let mut config = Config::default();
        config.submit.user_key = Some("DEADBEEF".to_string());

        let prepared = SubmitWorkflow::new(&repo, &config, &PassThrough)
            .with_now(now())
            .prepare(&options("Release"))
            .unwrap();
        assert!(prepared.tag.is_signed());
        assert_eq!(prepared.tag.signing_key.as_deref(), Some("DEADBEEF"));
    }
}
