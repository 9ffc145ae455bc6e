//! relmark git - repository operations for changelog synthesis and tag submission
//!
//! This crate wraps libgit2 behind [`GitRepo`] and exposes the
//! [`Repository`] contract the higher-level workflows are written against.

mod commits;
mod remote;
mod repository;
mod status;
mod tags;
mod traits;
pub mod types;

pub use repository::{GitRepo, Result};
pub use traits::Repository;
pub use types::{CommitId, CommitInfo, TagRequest, UpstreamBranch};
