//! Git repository operations

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use tracing::{debug, info, instrument};

use relmark_core::error::GitError;
use relmark_core::{Identity, PushMethod};

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Git repository wrapper
pub struct GitRepo {
    pub(crate) repo: Repository,
    path: PathBuf,
    pub(crate) push_method: PushMethod,
}

impl GitRepo {
    /// Open a repository at the given path
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::RepositoryNotFound(path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            repo,
            push_method: PushMethod::default(),
        })
    }

    /// Discover and open a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        info!(start_path = %start_path.display(), "discovering git repository");
        let repo = Repository::discover(start_path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::NotARepository(start_path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;

        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self {
            repo,
            path,
            push_method: PushMethod::default(),
        })
    }

    /// Choose how tags are pushed
    pub fn with_push_method(mut self, method: PushMethod) -> Self {
        self.push_method = method;
        self
    }

    /// Get the repository path (the working tree root for non-bare repos)
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Repository {
        &self.repo
    }

    /// The identity git would record for a new commit or tag, if configured
    pub fn user_identity(&self) -> Result<Option<Identity>> {
        match self.repo.signature() {
            Ok(sig) => Ok(Some(Identity::new(
                sig.name().unwrap_or_default(),
                sig.email().unwrap_or_default(),
            ))),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Run the git executable inside the repository and return its stdout
    #[instrument(skip(self), fields(args = ?args))]
    pub(crate) fn run_git(&self, args: &[&str]) -> Result<String> {
        let git = which::which("git").map_err(|e| GitError::CommandFailed {
            command: "git".to_string(),
            reason: format!("git executable not found: {}", e),
        })?;

        let output = Command::new(git)
            .args(args)
            .current_dir(&self.path)
            .output()
            .map_err(|e| GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                reason: e.to_string(),
            })?;

        debug!(success = output.status.success(), "git command finished");

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let repo = GitRepo::open(temp.path()).unwrap();
        (temp, repo)
    }

    #[test]
    fn test_open_repo() {
        let (_temp, repo) = init_repo();
        assert!(!repo.inner().is_bare());
        assert_eq!(repo.push_method, PushMethod::Cli);
    }

    #[test]
    fn test_discover_repo() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();

        let subdir = temp.path().join("packaging").join("sub");
        std::fs::create_dir_all(&subdir).unwrap();

        let repo = GitRepo::discover(&subdir).unwrap();
        // Canonicalize both paths to handle macOS /var -> /private/var symlink
        let repo_path = repo.path().canonicalize().unwrap();
        let temp_path = temp.path().canonicalize().unwrap();
        assert_eq!(repo_path, temp_path);
    }

    #[test]
    fn test_not_a_repo() {
        let temp = TempDir::new().unwrap();
        let result = GitRepo::open(temp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_user_identity_from_config() {
        let (_temp, repo) = init_repo();
        let mut config = repo.inner().config().unwrap();
        config.set_str("user.name", "Jane Doe").unwrap();
        config.set_str("user.email", "jane@example.com").unwrap();

        let identity = repo.user_identity().unwrap().unwrap();
        assert_eq!(identity, Identity::new("Jane Doe", "jane@example.com"));
    }
}
