//! Core types shared across relmark crates

use serde::{Deserialize, Serialize};

/// A person as it appears in changelog headers: name plus email
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Display name
    pub name: String,
    /// Email address, without angle brackets
    pub email: String,
}

impl Identity {
    /// Create a new identity
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// How new commits are grouped into changelog entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingMode {
    /// One entry per calendar day, inline markers on author changes
    #[default]
    Date,
    /// A single entry for today, one section per author
    Author,
}

impl GroupingMode {
    /// Returns the string representation of the grouping mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Author => "author",
        }
    }
}

impl std::fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GroupingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" | "day" => Ok(Self::Date),
            "author" => Ok(Self::Author),
            _ => Err(format!("Unknown grouping mode: {}", s)),
        }
    }
}

/// How tags are pushed to the remote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushMethod {
    /// Shell out to the git executable (uses the user's credential setup)
    #[default]
    Cli,
    /// Push in-process through libgit2
    Libgit2,
}
