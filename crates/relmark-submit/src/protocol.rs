//! Publishing a submission tag
//!
//! A tag only counts once it is on the remote. The protocol is
//! `Planned -> Created -> Pushed`; when the push fails the local tag is
//! deleted again (`Created -> RolledBack`) so a retry starts clean.
//!
//! Two submissions for the same branch within the same second produce the
//! same name. The remote rejects the second push, which then rolls back.
//! An interrupt between create and push can leave a local tag behind; it is
//! removed with `git tag -d <name>`.

use std::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};

use relmark_core::error::{Rollback, SubmitError};
use relmark_git::{CommitId, Repository, TagRequest};

/// A submission tag ready to be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseTag {
    pub target_branch: String,
    pub timestamp_suffix: String,
    pub name: String,
    pub commit: CommitId,
    pub message: String,
    pub sign: bool,
    pub signing_key: Option<String>,
}

impl ReleaseTag {
    pub fn is_signed(&self) -> bool {
        self.sign || self.signing_key.is_some()
    }

    fn request(&self) -> TagRequest {
        TagRequest {
            name: self.name.clone(),
            message: self.message.clone(),
            commit: self.commit.clone(),
            sign: self.sign,
            key: self.signing_key.clone(),
        }
    }
}

/// Where a publication stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationState {
    Planned,
    Created,
    Pushed,
    RolledBack,
}

impl PublicationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Created => "created",
            Self::Pushed => "pushed",
            Self::RolledBack => "rolled back",
        }
    }
}

impl fmt::Display for PublicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives one tag through create, push and, if needed, rollback
pub struct TagPublication<'a> {
    repo: &'a dyn Repository,
    remote: String,
    tag: ReleaseTag,
    state: PublicationState,
}

impl<'a> TagPublication<'a> {
    pub fn new(repo: &'a dyn Repository, remote: impl Into<String>, tag: ReleaseTag) -> Self {
        Self {
            repo,
            remote: remote.into(),
            tag,
            state: PublicationState::Planned,
        }
    }

    pub fn state(&self) -> PublicationState {
        self.state
    }

    pub fn tag(&self) -> &ReleaseTag {
        &self.tag
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Create the annotated tag locally
    #[instrument(skip(self), fields(tag = %self.tag.name, commit = %self.tag.commit))]
    pub fn create(&mut self) -> Result<(), SubmitError> {
        self.expect_state(PublicationState::Planned, "create")?;

        self.repo
            .create_tag(&self.tag.request())
            .map_err(|source| SubmitError::TagCreation {
                name: self.tag.name.clone(),
                source,
            })?;

        self.state = PublicationState::Created;
        info!(tag = %self.tag.name, signed = self.tag.is_signed(), "tag created");
        Ok(())
    }

    /// Push the tag; on failure delete it locally before reporting
    #[instrument(skip(self), fields(tag = %self.tag.name, remote = %self.remote))]
    pub fn push(&mut self) -> Result<(), SubmitError> {
        self.expect_state(PublicationState::Created, "push")?;

        match self.repo.push_tag(&self.remote, &self.tag.name) {
            Ok(()) => {
                self.state = PublicationState::Pushed;
                info!(tag = %self.tag.name, remote = %self.remote, "tag pushed");
                Ok(())
            }
            Err(source) => {
                warn!(tag = %self.tag.name, error = %source, "push failed, rolling back");
                let rollback = self.roll_back();
                Err(SubmitError::TagPush {
                    name: self.tag.name.clone(),
                    remote: self.remote.clone(),
                    source,
                    rollback,
                })
            }
        }
    }

    /// Create then push
    pub fn publish(&mut self) -> Result<(), SubmitError> {
        self.create()?;
        self.push()
    }

    fn roll_back(&mut self) -> Rollback {
        self.state = PublicationState::RolledBack;
        match self.repo.delete_tag(&self.tag.name) {
            Ok(()) => {
                info!(tag = %self.tag.name, "local tag deleted");
                Rollback::Deleted
            }
            Err(e) => {
                warn!(tag = %self.tag.name, error = %e, "could not delete local tag");
                Rollback::Failed(e.to_string())
            }
        }
    }

    fn expect_state(&self, expected: PublicationState, action: &'static str) -> Result<(), SubmitError> {
        if self.state == expected {
            return Ok(());
        }
        Err(SubmitError::InvalidTransition {
            name: self.tag.name.clone(),
            action,
            state: self.state.as_str(),
        })
    }
}
