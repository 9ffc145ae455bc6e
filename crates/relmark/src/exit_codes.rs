//! Exit codes for the CLI

use relmark_core::error::{ChangelogError, ConfigError, GitError, RelmarkError, SubmitError};

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Git error
pub const GIT_ERROR: i32 = 3;

/// Validation error (dirty tree, bad arguments)
pub const VALIDATION_ERROR: i32 = 5;

/// Nothing to do
pub const NOTHING_TO_DO: i32 = 6;

/// User cancelled
pub const CANCELLED: i32 = 130;

/// Map a command failure to the process exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<RelmarkError>() {
        return for_relmark_error(err);
    }
    if let Some(err) = err.downcast_ref::<GitError>() {
        return for_git_error(err);
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return CONFIG_ERROR;
    }
    ERROR
}

fn for_relmark_error(err: &RelmarkError) -> i32 {
    match err {
        RelmarkError::Config(_) => CONFIG_ERROR,
        RelmarkError::Git(err) => for_git_error(err),
        RelmarkError::Changelog(err) => match err {
            ChangelogError::EmptyRange { .. } => NOTHING_TO_DO,
            ChangelogError::Cancelled => CANCELLED,
            _ => ERROR,
        },
        RelmarkError::Submit(err) => match err {
            SubmitError::Cancelled => CANCELLED,
            SubmitError::InvalidTarget { .. }
            | SubmitError::TagCreation { .. }
            | SubmitError::TagPush { .. } => GIT_ERROR,
            SubmitError::InvalidTransition { .. } => ERROR,
        },
        RelmarkError::Io(_) => ERROR,
    }
}

fn for_git_error(err: &GitError) -> i32 {
    match err {
        GitError::DirtyTree { .. } => VALIDATION_ERROR,
        _ => GIT_ERROR,
    }
}
