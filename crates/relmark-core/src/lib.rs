//! relmark core - shared foundation for changelog synthesis and tag submission
//!
//! This crate provides the error taxonomy, configuration loading and the
//! editor seam used by the other relmark crates.

pub mod config;
pub mod editor;
pub mod error;
pub mod types;

pub use editor::{EditOutcome, Editor, PassThrough};
pub use error::{ChangelogError, ConfigError, GitError, RelmarkError, Result, Rollback, SubmitError};
pub use types::{GroupingMode, Identity, PushMethod};
