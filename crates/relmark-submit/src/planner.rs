//! Choosing the target branch and name of a submission tag

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use relmark_core::config::SubmitConfig;
use relmark_core::error::{GitError, Result, SubmitError};
use relmark_git::{CommitId, UpstreamBranch};

use crate::protocol::ReleaseTag;

/// Timestamp suffix format, always rendered in UTC
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d.%H%M%S";

/// Outcome of planning a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPlan {
    /// Branch the build system should pick the tag up for
    pub target_branch: String,
    /// `YYYYMMDD.HHMMSS` in UTC
    pub timestamp_suffix: String,
    /// `<prefix>/<target_branch>/<timestamp_suffix>`
    pub name: String,
    /// Non-fatal findings to report to the user
    pub warnings: Vec<String>,
}

impl TagPlan {
    /// Attach the commit, message and signing choice to get a tag to publish
    pub fn into_tag(
        self,
        commit: CommitId,
        message: impl Into<String>,
        sign: bool,
        signing_key: Option<String>,
    ) -> ReleaseTag {
        ReleaseTag {
            target_branch: self.target_branch,
            timestamp_suffix: self.timestamp_suffix,
            name: self.name,
            commit,
            message: message.into(),
            sign,
            signing_key,
        }
    }
}

/// Computes submission tag names
#[derive(Debug, Clone)]
pub struct TagPlanner {
    prefix: String,
    renames: BTreeMap<String, String>,
}

impl TagPlanner {
    pub fn new(prefix: impl Into<String>, renames: BTreeMap<String, String>) -> Self {
        Self {
            prefix: prefix.into(),
            renames,
        }
    }

    pub fn from_config(config: &SubmitConfig) -> Self {
        Self::new(config.tag_prefix.clone(), config.branch_renames.clone())
    }

    /// Work out the target branch and tag name.
    ///
    /// An explicit target wins. Otherwise the upstream of the current branch
    /// is used when it lives on `remote`, falling back to the branch itself.
    #[instrument(skip(self, upstream_lookup))]
    pub fn plan<F>(
        &self,
        current_branch: Option<&str>,
        requested_target: Option<&str>,
        upstream_lookup: F,
        remote: &str,
        now: DateTime<Utc>,
    ) -> Result<TagPlan>
    where
        F: FnOnce(&str) -> relmark_git::Result<Option<UpstreamBranch>>,
    {
        let mut warnings = Vec::new();

        let target = match requested_target {
            Some(target) => target.to_string(),
            None => {
                let branch = current_branch
                    .ok_or_else(|| GitError::RefNotFound("HEAD (detached, no branch checked out)".to_string()))?;
                self.target_from_upstream(branch, upstream_lookup, remote, &mut warnings)
            }
        };

        let target_branch = self.renames.get(&target).cloned().unwrap_or(target);
        let timestamp_suffix = now.format(TIMESTAMP_FORMAT).to_string();
        let name = format!("{}/{}/{}", self.prefix, target_branch, timestamp_suffix);

        if !git2::Reference::is_valid_name(&format!("refs/tags/{}", name)) {
            return Err(SubmitError::InvalidTarget {
                target: target_branch,
                tag: name,
            }
            .into());
        }

        debug!(tag = %name, target = %target_branch, "planned tag");
        Ok(TagPlan {
            target_branch,
            timestamp_suffix,
            name,
            warnings,
        })
    }

    fn target_from_upstream<F>(
        &self,
        branch: &str,
        upstream_lookup: F,
        remote: &str,
        warnings: &mut Vec<String>,
    ) -> String
    where
        F: FnOnce(&str) -> relmark_git::Result<Option<UpstreamBranch>>,
    {
        match upstream_lookup(branch) {
            Ok(Some(upstream)) if upstream.remote == remote => {
                return upstream.base_name().to_string();
            }
            Ok(Some(upstream)) => {
                debug!(%upstream, remote, "upstream is on another remote");
            }
            Ok(None) => {}
            Err(e) => {
                debug!(error = %e, "upstream lookup failed");
            }
        }

        let warning = format!(
            "no upstream branch configured on '{remote}' for '{branch}', using the branch name; \
             consider `git branch --set-upstream-to={remote}/<branch>`"
        );
        warn!("{}", warning);
        warnings.push(warning);
        branch.to_string()
    }
}
