//! Tag operations

use git2::{DescribeFormatOptions, DescribeOptions, ErrorClass, ErrorCode, Oid};
use tracing::{debug, info, instrument};

use crate::repository::{GitRepo, Result};
use crate::types::{CommitId, TagRequest};
use relmark_core::error::GitError;

impl GitRepo {
    /// Name of the nearest tag reachable from a commit (`git describe --tags --abbrev=0`)
    #[instrument(skip(self), fields(commit = %commit))]
    pub fn find_tag_for(&self, commit: &CommitId) -> Result<String> {
        let oid = Oid::from_str(commit.as_str())
            .map_err(|_| GitError::RefNotFound(commit.to_string()))?;
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|_| GitError::RefNotFound(commit.to_string()))?;

        if self.tag_names(None)?.is_empty() {
            debug!("repository has no tags");
            return Err(GitError::NoTagFound(commit.to_string()));
        }

        let mut opts = DescribeOptions::new();
        opts.describe_tags();

        // no reachable tag is reported with the describe class, not NotFound
        let description = object.describe(&opts).map_err(|e| {
            if e.code() == ErrorCode::NotFound || e.class() == ErrorClass::Describe {
                GitError::NoTagFound(commit.to_string())
            } else {
                GitError::Git2(e)
            }
        })?;

        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(0);
        let tag = description.format(Some(&format))?;

        debug!(tag = %tag, "found nearest tag");
        Ok(tag)
    }

    /// Check whether a tag exists locally
    pub fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Local tag names matching a glob, sorted
    pub(crate) fn tag_names(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        let names = self.repo.tag_names(pattern)?;
        let mut names: Vec<String> = names.iter().flatten().map(str::to_string).collect();
        names.sort();
        Ok(names)
    }

    /// Create an annotated tag, signed through the git executable when requested
    #[instrument(skip(self, request), fields(name = %request.name, commit = %request.commit, signed = request.is_signed()))]
    pub fn create_tag(&self, request: &TagRequest) -> Result<()> {
        if self.tag_exists(&request.name)? {
            return Err(GitError::TagExists(request.name.clone()));
        }

        if request.is_signed() {
            self.create_signed_tag(request)?;
        } else {
            let oid = Oid::from_str(request.commit.as_str())
                .map_err(|_| GitError::RefNotFound(request.commit.to_string()))?;
            let target = self
                .repo
                .find_object(oid, None)
                .map_err(|_| GitError::RefNotFound(request.commit.to_string()))?;
            let tagger = self.repo.signature().map_err(|e| GitError::TagCreationFailed {
                name: request.name.clone(),
                reason: format!("no tagger identity configured: {}", e.message()),
            })?;

            self.repo
                .tag(&request.name, &target, &tagger, &request.message, false)
                .map_err(|e| GitError::TagCreationFailed {
                    name: request.name.clone(),
                    reason: e.message().to_string(),
                })?;
        }

        info!(name = %request.name, "created tag");
        Ok(())
    }

    /// libgit2 cannot produce GPG signatures, so signed tags go through `git tag`
    fn create_signed_tag(&self, request: &TagRequest) -> Result<()> {
        let mut args = vec!["tag"];
        match &request.key {
            Some(key) => args.extend(["-u", key.as_str()]),
            None => args.push("-s"),
        }
        args.extend([
            "-m",
            request.message.as_str(),
            request.name.as_str(),
            request.commit.as_str(),
        ]);

        self.run_git(&args).map_err(|e| GitError::TagCreationFailed {
            name: request.name.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// Delete a tag
    #[instrument(skip(self))]
    pub fn delete_tag(&self, name: &str) -> Result<()> {
        self.repo.tag_delete(name).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                GitError::RefNotFound(format!("refs/tags/{}", name))
            } else {
                GitError::Git2(e)
            }
        })?;
        info!(name, "deleted tag");
        Ok(())
    }
}
