//! Turning a commit range into changelog entries

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use relmark_core::error::{GitError, Result};
use relmark_core::{GroupingMode, Identity};
use relmark_git::{CommitId, Repository};

use crate::document::ChangelogEntryBlock;

/// One commit, as it will appear in the changelog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub author: String,
    pub email: String,
    /// Commit time, used for day-level grouping
    pub timestamp: DateTime<Utc>,
    pub subject: String,
    /// `<tag>@<short-sha>`, or the short sha alone when no tag is reachable
    pub version_label: String,
}

/// Read the commits (oldest first) into log entries.
///
/// The tag part of every version label is the nearest tag reachable from
/// `HEAD`, looked up once for the whole range.
#[instrument(skip(repo, commits), fields(commit_count = commits.len()))]
pub fn aggregate(repo: &dyn Repository, commits: &[CommitId]) -> Result<Vec<LogEntry>> {
    let head = repo.resolve("HEAD")?;
    let tag = match repo.find_tag_for(&head) {
        Ok(tag) => Some(tag),
        Err(GitError::NoTagFound(_)) => None,
        Err(e) => return Err(e.into()),
    };
    debug!(tag = ?tag, "version tag for range");

    let mut entries = Vec::with_capacity(commits.len());
    for id in commits {
        let info = repo.commit_info(id)?;
        let short = repo.short_id(id)?;
        let version_label = match &tag {
            Some(tag) => format!("{}@{}", tag, short),
            None => short,
        };

        entries.push(LogEntry {
            author: info.author,
            email: info.email,
            timestamp: info.timestamp,
            subject: info.subject,
            version_label,
        });
    }

    info!(entries = entries.len(), "aggregated commits");
    Ok(entries)
}

/// Replacements for the author, email and version of every produced header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOverrides {
    pub author: Option<String>,
    pub email: Option<String>,
    pub version: Option<String>,
}

impl HeaderOverrides {
    fn apply(&self, block: &mut ChangelogEntryBlock) {
        if let Some(author) = &self.author {
            block.header_author = author.clone();
        }
        if let Some(email) = &self.email {
            block.header_email = email.clone();
        }
        if let Some(version) = &self.version {
            block.header_version = version.clone();
        }
    }
}

/// Groups log entries into changelog blocks
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    mode: GroupingMode,
    overrides: HeaderOverrides,
    committer: Option<Identity>,
    today: NaiveDate,
    offset: Option<FixedOffset>,
}

impl BlockBuilder {
    /// Create a builder for the given grouping mode, dated with the local day
    pub fn new(mode: GroupingMode) -> Self {
        Self {
            mode,
            overrides: HeaderOverrides::default(),
            committer: None,
            today: Local::now().date_naive(),
            offset: None,
        }
    }

    /// Override header fields of every produced block
    pub fn with_overrides(mut self, overrides: HeaderOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Identity heading an author-grouped block
    pub fn with_committer(mut self, committer: Option<Identity>) -> Self {
        self.committer = committer;
        self
    }

    /// Date of an author-grouped block
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Compute calendar days in a fixed offset instead of the local zone
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build blocks from entries given oldest first.
    ///
    /// Blocks come out oldest first as well, ready to be merged one by one
    /// on top of the document.
    pub fn build(&self, entries: &[LogEntry]) -> Vec<ChangelogEntryBlock> {
        let mut blocks = match self.mode {
            GroupingMode::Date => self.group_by_date(entries),
            GroupingMode::Author => self.group_by_author(entries).into_iter().collect(),
        };

        for block in &mut blocks {
            self.overrides.apply(block);
        }

        debug!(mode = %self.mode, blocks = blocks.len(), "grouped entries");
        blocks
    }

    fn day_of(&self, timestamp: DateTime<Utc>) -> NaiveDate {
        match self.offset {
            Some(offset) => timestamp.with_timezone(&offset).date_naive(),
            None => timestamp.with_timezone(&Local).date_naive(),
        }
    }

    /// A new block per calendar day; an author change within a day gets a marker
    fn group_by_date(&self, entries: &[LogEntry]) -> Vec<ChangelogEntryBlock> {
        let mut blocks: Vec<ChangelogEntryBlock> = Vec::new();
        let mut previous: Option<(NaiveDate, &str)> = None;

        for entry in entries {
            let day = self.day_of(entry.timestamp);

            match (previous, blocks.last_mut()) {
                (Some((prev_day, prev_author)), Some(block)) if prev_day == day => {
                    if prev_author != entry.author {
                        block.push_author_marker(&entry.author);
                    }
                    // the header records the newest revision of the day
                    block.header_version = entry.version_label.clone();
                    block.push_subject(&entry.subject);
                }
                _ => {
                    let mut block = ChangelogEntryBlock::new(
                        day,
                        &entry.author,
                        &entry.email,
                        &entry.version_label,
                    );
                    block.push_subject(&entry.subject);
                    blocks.push(block);
                }
            }

            previous = Some((day, &entry.author));
        }

        blocks
    }

    /// A single block for today, one `[ author ]` section per contributor
    fn group_by_author(&self, entries: &[LogEntry]) -> Option<ChangelogEntryBlock> {
        let newest = entries.last()?;

        let mut buckets: BTreeMap<&str, Vec<&LogEntry>> = BTreeMap::new();
        for entry in entries {
            buckets.entry(entry.author.as_str()).or_default().push(entry);
        }

        let (name, email) = match &self.committer {
            Some(identity) => (identity.name.as_str(), identity.email.as_str()),
            None => (newest.author.as_str(), newest.email.as_str()),
        };

        let mut block = ChangelogEntryBlock::new(self.today, name, email, &newest.version_label);
        for (author, commits) in buckets {
            block.push_author_marker(author);
            for entry in commits {
                block.push_subject(&entry.subject);
            }
        }

        Some(block)
    }
}
