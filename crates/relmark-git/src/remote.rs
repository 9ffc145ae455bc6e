//! Remote operations

use std::cell::{Cell, RefCell};

use git2::{Cred, CredentialType, PushOptions, RemoteCallbacks};
use tracing::{info, instrument};

use crate::repository::{GitRepo, Result};
use relmark_core::error::GitError;
use relmark_core::PushMethod;

impl GitRepo {
    /// Get list of remote names
    pub fn remotes(&self) -> Result<Vec<String>> {
        let remotes = self.repo.remotes()?;
        Ok(remotes
            .iter()
            .filter_map(|r| r.map(|s| s.to_string()))
            .collect())
    }

    /// Check if a remote exists
    pub fn has_remote(&self, name: &str) -> Result<bool> {
        Ok(self.remotes()?.contains(&name.to_string()))
    }

    /// Get the URL for a remote
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(|s| s.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                Err(GitError::RemoteNotFound(name.to_string()))
            }
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Push a single tag to a remote using the configured push method
    #[instrument(skip(self), fields(method = ?self.push_method))]
    pub fn push_tag(&self, remote_name: &str, tag_name: &str) -> Result<()> {
        let start = std::time::Instant::now();
        if !self.has_remote(remote_name)? {
            return Err(GitError::RemoteNotFound(remote_name.to_string()));
        }

        let refspec = format!("refs/tags/{0}:refs/tags/{0}", tag_name);
        match self.push_method {
            PushMethod::Cli => self.push_with_cli(remote_name, &refspec)?,
            PushMethod::Libgit2 => self.push_with_libgit2(remote_name, &refspec)?,
        }

        info!(
            remote = remote_name,
            tag = tag_name,
            duration_ms = start.elapsed().as_millis(),
            "pushed tag"
        );
        Ok(())
    }

    /// Push through the git executable, which picks up the user's credential helpers
    fn push_with_cli(&self, remote_name: &str, refspec: &str) -> Result<()> {
        self.run_git(&["push", remote_name, refspec])
            .map_err(|e| match e {
                GitError::CommandFailed { reason, .. } => GitError::PushFailed(reason),
                other => other,
            })?;
        Ok(())
    }

    fn push_with_libgit2(&self, remote_name: &str, refspec: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|_| GitError::RemoteNotFound(remote_name.to_string()))?;

        let rejection: RefCell<Option<String>> = RefCell::new(None);
        let credential_attempts = Cell::new(0u32);

        let result = {
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(|_url, username, allowed| {
                credential_attempts.set(credential_attempts.get() + 1);
                if credential_attempts.get() > 1 {
                    return Err(git2::Error::from_str("authentication failed"));
                }
                if allowed.contains(CredentialType::SSH_KEY) {
                    Cred::ssh_key_from_agent(username.unwrap_or("git"))
                } else {
                    Cred::default()
                }
            });
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    *rejection.borrow_mut() = Some(format!("{} rejected: {}", refname, message));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);
            remote.push(&[refspec], Some(&mut options))
        };

        result.map_err(|e| GitError::PushFailed(e.message().to_string()))?;

        match rejection.into_inner() {
            Some(reason) => Err(GitError::PushFailed(reason)),
            None => Ok(()),
        }
    }
}
