//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::types::{GroupingMode, Identity, PushMethod};

/// Main configuration for relmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Identity used for changelog entries written on the user's behalf
    pub user: Option<UserConfig>,

    /// Changelog configuration
    pub changelog: ChangelogConfig,

    /// Submission configuration
    pub submit: SubmitConfig,

    /// Git configuration
    pub git: GitConfig,
}

/// General settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Editor command used for the interactive review step.
    /// Falls back to `$VISUAL`, `$EDITOR`, then `vi`.
    pub editor: Option<String>,
}

/// Changelog author identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

impl From<UserConfig> for Identity {
    fn from(user: UserConfig) -> Self {
        Identity::new(user.name, user.email)
    }
}

/// Changelog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Directory, relative to the repository root, holding the changelog
    pub dir: PathBuf,

    /// Glob pattern of the changelog file inside `dir`
    pub pattern: String,

    /// How new commits are grouped
    pub mode: GroupingMode,

    /// Whether to refuse running on a dirty working tree
    pub require_clean: bool,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("packaging"),
            pattern: "*.changes".to_string(),
            mode: GroupingMode::Date,
            require_clean: true,
        }
    }
}

/// Submission configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    /// Remote the tag is pushed to
    pub remote: String,

    /// Whether to GPG-sign submission tags
    pub sign: bool,

    /// GPG key used for signing (implies `sign`)
    pub user_key: Option<String>,

    /// Whether to refuse submitting from a dirty working tree
    pub require_clean: bool,

    /// First component of every submission tag name
    pub tag_prefix: String,

    /// Branch names rewritten before the tag name is built
    pub branch_renames: BTreeMap<String, String>,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        let mut branch_renames = BTreeMap::new();
        branch_renames.insert("master".to_string(), "trunk".to_string());

        Self {
            remote: "origin".to_string(),
            sign: false,
            user_key: None,
            require_clean: true,
            tag_prefix: "submit".to_string(),
            branch_renames,
        }
    }
}

/// Git configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// How tags are pushed
    pub push_method: PushMethod,
}
