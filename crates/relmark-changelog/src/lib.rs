//! relmark changelog - curated changelogs from git history
//!
//! This crate parses the packaging changelog format, groups new commits
//! into dated entries and merges them on top of the existing file.

pub mod aggregator;
pub mod discovery;
pub mod document;
pub mod merge;
pub mod workflow;

pub use aggregator::{aggregate, BlockBuilder, HeaderOverrides, LogEntry};
pub use discovery::find_changelog;
pub use document::{match_header, ChangelogDocument, ChangelogEntryBlock, HeaderMatch};
pub use merge::{merge, write_atomic, MergeOutcome};
pub use workflow::{read_last_revision, ChangelogOptions, ChangelogSummary, ChangelogWorkflow};
