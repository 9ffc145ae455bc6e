//! The on-disk changelog format
//!
//! A changelog is plain text with the newest entry first:
//!
//! ```text
//! * Tue Mar 05 2024 Jane Doe <jane@example.com> - v1.2@1a2b3c4
//! - Fix header parsing
//! [ John Roe ]
//! - Add a --since flag
//!
//! * Mon Mar 04 2024 Jane Doe <jane@example.com> - v1.2@9f8e7d6
//! - Initial packaging
//! ```
//!
//! Parsing never fails: lines that look like a header but do not match are
//! kept as body text of the surrounding entry, so an unmodified document
//! serializes back to exactly what was read.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::{debug, instrument};

use relmark_core::error::ChangelogError;

/// `* <weekday> <month> <day> <year> <author> <email> [- ]<version>`
static WITH_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\*\s+(?P<weekday>\S+)\s+(?P<month>\S+)\s+(?P<day>\d{1,2})\s+(?P<year>\d{4})\s+(?P<author>.+?)\s+<(?P<email>[^<>]*)>\s+(?:-\s+)?(?P<version>[^\s-]\S*)\s*$",
    )
    .expect("Invalid regex")
});

/// `* <weekday> <month> <day> <year> <author> <email>`
static WITHOUT_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\*\s+(?P<weekday>\S+)\s+(?P<month>\S+)\s+(?P<day>\d{1,2})\s+(?P<year>\d{4})\s+(?P<author>.+?)\s+<(?P<email>[^<>]*)>\s*$",
    )
    .expect("Invalid regex")
});

/// Format used to render header dates
const HEADER_DATE_FORMAT: &str = "%a %b %d %Y";

/// A recognized entry header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMatch {
    /// Header carrying a version token
    WithVersion {
        date: NaiveDate,
        author: String,
        email: String,
        version: String,
    },
    /// Header without a version token
    WithoutVersion {
        date: NaiveDate,
        author: String,
        email: String,
    },
}

impl HeaderMatch {
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::WithVersion { date, .. } | Self::WithoutVersion { date, .. } => *date,
        }
    }

    pub fn author(&self) -> &str {
        match self {
            Self::WithVersion { author, .. } | Self::WithoutVersion { author, .. } => author,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Self::WithVersion { email, .. } | Self::WithoutVersion { email, .. } => email,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Self::WithVersion { version, .. } => Some(version),
            Self::WithoutVersion { .. } => None,
        }
    }
}

type HeaderMatcher = fn(&str) -> Option<HeaderMatch>;

/// Tried in order, first match wins
const HEADER_MATCHERS: &[HeaderMatcher] = &[match_with_version, match_without_version];

/// Recognize an entry header line
pub fn match_header(line: &str) -> Option<HeaderMatch> {
    HEADER_MATCHERS.iter().find_map(|matcher| matcher(line))
}

fn match_with_version(line: &str) -> Option<HeaderMatch> {
    let caps = WITH_VERSION.captures(line)?;
    let (date, author, email) = common_fields(&caps)?;
    Some(HeaderMatch::WithVersion {
        date,
        author,
        email,
        version: caps["version"].to_string(),
    })
}

fn match_without_version(line: &str) -> Option<HeaderMatch> {
    let caps = WITHOUT_VERSION.captures(line)?;
    let (date, author, email) = common_fields(&caps)?;
    Some(HeaderMatch::WithoutVersion {
        date,
        author,
        email,
    })
}

/// The weekday is deliberately ignored, old files often carry a wrong one
fn common_fields(caps: &Captures<'_>) -> Option<(NaiveDate, String, String)> {
    let date = NaiveDate::parse_from_str(
        &format!("{} {} {}", &caps["month"], &caps["day"], &caps["year"]),
        "%b %d %Y",
    )
    .ok()?;
    Some((date, caps["author"].to_string(), caps["email"].to_string()))
}

/// One dated entry of the changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntryBlock {
    pub header_date: NaiveDate,
    pub header_author: String,
    pub header_email: String,
    /// Version token, empty when the header has none
    pub header_version: String,
    /// `- subject` and `[ author ]` lines, plus any trailing blank separator
    pub body_lines: Vec<String>,
    /// Header text as read from disk
    raw_header: Option<String>,
}

impl ChangelogEntryBlock {
    /// Create a block that has not been read from a file
    pub fn new(
        date: NaiveDate,
        author: impl Into<String>,
        email: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            header_date: date,
            header_author: author.into(),
            header_email: email.into(),
            header_version: version.into(),
            body_lines: Vec::new(),
            raw_header: None,
        }
    }

    fn from_header(header: HeaderMatch, raw: &str) -> Self {
        let mut block = Self::new(
            header.date(),
            header.author(),
            header.email(),
            header.version().unwrap_or_default(),
        );
        block.raw_header = Some(raw.to_string());
        block
    }

    /// Append a `- subject` line
    pub fn push_subject(&mut self, subject: &str) {
        self.body_lines.push(format!("- {}", subject));
    }

    /// Append a `[ author ]` marker line
    pub fn push_author_marker(&mut self, author: &str) {
        self.body_lines.push(format!("[ {} ]", author));
    }

    /// Whether the block already ends with a blank separator line
    pub fn ends_with_blank(&self) -> bool {
        self.body_lines.last().is_some_and(|line| line.trim().is_empty())
    }

    /// Revision part of the version token, after the last `@`
    pub fn revision(&self) -> Option<&str> {
        if self.header_version.is_empty() {
            return None;
        }
        self.header_version.rsplit('@').next().filter(|r| !r.is_empty())
    }

    /// Header line as it will be written
    ///
    /// The original text is reused as long as it still describes the
    /// current header fields, so unchanged entries round-trip byte for byte.
    pub fn header_line(&self) -> String {
        if let Some(raw) = &self.raw_header {
            if match_header(raw).is_some_and(|header| self.describes(&header)) {
                return raw.clone();
            }
        }

        let mut line = format!(
            "* {} {} <{}>",
            self.header_date.format(HEADER_DATE_FORMAT),
            self.header_author,
            self.header_email
        );
        if !self.header_version.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.header_version);
        }
        line
    }

    fn describes(&self, header: &HeaderMatch) -> bool {
        header.date() == self.header_date
            && header.author() == self.header_author
            && header.email() == self.header_email
            && header.version().unwrap_or_default() == self.header_version
    }
}

/// A parsed changelog file, newest entry first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogDocument {
    /// Lines before the first header
    pub preamble: Vec<String>,
    pub blocks: Vec<ChangelogEntryBlock>,
    /// Whether the text ended with a newline
    pub trailing_newline: bool,
}

impl ChangelogDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse changelog text. CRLF line endings are normalized to LF.
    pub fn parse(contents: &str) -> Self {
        let text = contents.replace("\r\n", "\n");
        let mut document = Self::new();
        if text.is_empty() {
            return document;
        }

        let body = match text.strip_suffix('\n') {
            Some(stripped) => {
                document.trailing_newline = true;
                stripped
            }
            None => text.as_str(),
        };

        for line in body.split('\n') {
            if let Some(header) = match_header(line) {
                document
                    .blocks
                    .push(ChangelogEntryBlock::from_header(header, line));
                continue;
            }
            match document.blocks.last_mut() {
                Some(block) => block.body_lines.push(line.to_string()),
                None => document.preamble.push(line.to_string()),
            }
        }

        document
    }

    /// Read and parse a changelog file
    #[instrument(fields(path = %path.display()))]
    pub fn read(path: &Path) -> Result<Self, ChangelogError> {
        let format_error = |reason: String| ChangelogError::Format {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = std::fs::metadata(path).map_err(|e| format_error(e.to_string()))?;
        if !metadata.is_file() {
            return Err(format_error("not a regular file".to_string()));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| format_error(e.to_string()))?;
        let document = Self::parse(&contents);
        debug!(entries = document.blocks.len(), "parsed changelog");
        Ok(document)
    }

    /// Render the document back to text
    pub fn serialize(&self) -> String {
        let mut lines: Vec<String> = self.preamble.clone();
        for block in &self.blocks {
            lines.push(block.header_line());
            lines.extend(block.body_lines.iter().cloned());
        }

        if lines.is_empty() {
            return String::new();
        }

        let mut text = lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    /// Entry at `index`, 0 being the most recent
    pub fn get_entry(&self, index: usize) -> Option<&ChangelogEntryBlock> {
        self.blocks.get(index)
    }

    /// Revision recorded in the most recent entry.
    ///
    /// `None` when an unrecognized header sits above the first parsed entry,
    /// since the newest entry cannot be told apart from older ones then.
    pub fn last_revision(&self) -> Option<&str> {
        if self.has_unrecognized_header() {
            return None;
        }
        self.get_entry(0)?.revision()
    }

    /// Whether the preamble holds a `* ` line that no header matcher accepted
    pub fn has_unrecognized_header(&self) -> bool {
        self.preamble.iter().any(|line| line.starts_with("* "))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the document has no entries
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether the document has no text at all
    pub fn is_blank(&self) -> bool {
        self.blocks.is_empty() && self.preamble.is_empty()
    }
}

impl fmt::Display for ChangelogDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
