//! Error types for relmark

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using RelmarkError
pub type Result<T> = std::result::Result<T, RelmarkError>;

/// Main error type for relmark operations
#[derive(Debug, Error)]
pub enum RelmarkError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// Submission-related errors
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found
    #[error("Git repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// A revision, branch or tag did not resolve
    #[error("Reference not found: {0}")]
    RefNotFound(String),

    /// No tag is reachable from the given revision
    #[error("No tag reachable from {0}")]
    NoTagFound(String),

    /// Working directory is not clean
    #[error("Working tree is not clean, uncommitted changes in: {}", .paths.join(", "))]
    DirtyTree { paths: Vec<String> },

    /// Tag already exists
    #[error("Tag already exists: {0}")]
    TagExists(String),

    /// Failed to create tag
    #[error("Failed to create tag {name}: {reason}")]
    TagCreationFailed { name: String, reason: String },

    /// Failed to push
    #[error("Failed to push to remote: {0}")]
    PushFailed(String),

    /// Remote not found
    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    /// An external git invocation failed
    #[error("Command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Changelog file missing, unreadable or not a regular file
    #[error("Cannot read changelog {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    /// No changelog file found in the packaging directory
    #[error("No changelog file matching {pattern} under {dir}")]
    NoChangelogFile { dir: PathBuf, pattern: String },

    /// The newest entry carries no revision to continue from
    #[error("Cannot find the last synchronized revision in the changelog, specify it with --since")]
    NoLastRevision,

    /// No commits between the start revision and the tip
    #[error("Nothing found between {since} and {until}")]
    EmptyRange { since: String, until: String },

    /// The user aborted the edit step
    #[error("Changelog edit cancelled, file left untouched")]
    Cancelled,

    /// Failed to write changelog
    #[error("Failed to write changelog {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// What happened to the local tag after a failed push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rollback {
    /// The local tag was deleted
    Deleted,
    /// Deleting the local tag failed as well
    Failed(String),
}

impl fmt::Display for Rollback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => write!(f, "local tag removed"),
            Self::Failed(reason) => write!(f, "local tag could not be removed: {}", reason),
        }
    }
}

/// Submission-related errors
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The computed tag name is not a valid reference name
    #[error("Invalid submission target '{target}': {tag} is not a valid tag name")]
    InvalidTarget { target: String, tag: String },

    /// The local tag could not be created
    #[error("Failed to create tag {name}: {source}")]
    TagCreation {
        name: String,
        #[source]
        source: GitError,
    },

    /// The remote rejected the tag
    #[error("Failed to push tag {name} to {remote}: {source} ({rollback})")]
    TagPush {
        name: String,
        remote: String,
        #[source]
        source: GitError,
        rollback: Rollback,
    },

    /// A protocol step was invoked out of order
    #[error("Cannot {action} tag {name} while it is {state}")]
    InvalidTransition {
        name: String,
        action: &'static str,
        state: &'static str,
    },

    /// The user aborted the message edit
    #[error("Submission cancelled")]
    Cancelled,
}
