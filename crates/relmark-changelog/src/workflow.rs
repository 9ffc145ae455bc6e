//! The changelog update workflow
//!
//! Check the tree, find the changelog, work out where the last update
//! stopped, turn the new commits into entries, let the user review the
//! result and write it back in one atomic step.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use relmark_core::config::Config;
use relmark_core::error::{ChangelogError, GitError, Result};
use relmark_core::{EditOutcome, Editor, GroupingMode, Identity};
use relmark_git::{CommitId, Repository};

use crate::aggregator::{aggregate, BlockBuilder, HeaderOverrides};
use crate::discovery::find_changelog;
use crate::document::ChangelogDocument;
use crate::merge::{merge, write_atomic, MergeOutcome};

/// Extension handed to the editor so it can pick a syntax
const CHANGES_EXTENSION: &str = ".changes";

/// Options for a changelog update
#[derive(Debug, Clone, Default)]
pub struct ChangelogOptions {
    /// Start revision, excluded; defaults to the one recorded in the newest entry
    pub since: Option<String>,
    /// Changelog path; discovered from the configuration when unset
    pub file: Option<PathBuf>,
    /// Grouping mode; the configured one when unset
    pub mode: Option<GroupingMode>,
    /// Header field replacements
    pub overrides: HeaderOverrides,
    /// Compute the new text but do not edit or write it
    pub dry_run: bool,
}

/// What an update did
#[derive(Debug, Clone, Serialize)]
pub struct ChangelogSummary {
    pub path: PathBuf,
    /// Resolved start revision
    pub since: CommitId,
    pub commit_count: usize,
    pub entries_added: usize,
    /// Whether the file was replaced
    pub written: bool,
    /// Full changelog text as merged, before editing
    pub content: String,
}

/// Runs a changelog update against a repository
pub struct ChangelogWorkflow<'a> {
    repo: &'a dyn Repository,
    config: &'a Config,
    editor: &'a dyn Editor,
    root: PathBuf,
    today: Option<NaiveDate>,
    offset: Option<FixedOffset>,
}

impl<'a> ChangelogWorkflow<'a> {
    /// Create a workflow for the repository whose working tree is `root`
    pub fn new(
        repo: &'a dyn Repository,
        config: &'a Config,
        editor: &'a dyn Editor,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repo,
            config,
            editor,
            root: root.into(),
            today: None,
            offset: None,
        }
    }

    /// Date author-grouped entries with a fixed day
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Group commits by day in a fixed offset instead of the local zone
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Run the update
    #[instrument(skip(self, options), fields(since = ?options.since, dry_run = options.dry_run))]
    pub fn run(&self, options: &ChangelogOptions) -> Result<ChangelogSummary> {
        if self.config.changelog.require_clean {
            let dirty = self.repo.dirty_paths()?;
            if !dirty.is_empty() {
                return Err(GitError::DirtyTree { paths: dirty }.into());
            }
        }

        let path = self.changelog_path(options)?;
        let document = ChangelogDocument::read(&path)?;

        let since = self.start_revision(options, &document)?;
        let head = self.repo.resolve("HEAD")?;
        let commits = self.repo.commits_between(&since, &head)?;
        if commits.is_empty() {
            return Err(ChangelogError::EmptyRange {
                since: since.to_string(),
                until: "HEAD".to_string(),
            }
            .into());
        }
        debug!(count = commits.len(), "commits to record");

        let entries = aggregate(self.repo, &commits)?;
        let blocks = self.block_builder(options)?.build(&entries);

        let merged = match merge(&document, &blocks) {
            MergeOutcome::Merged(merged) => merged,
            MergeOutcome::NothingToMerge => {
                return Err(ChangelogError::EmptyRange {
                    since: since.to_string(),
                    until: "HEAD".to_string(),
                }
                .into());
            }
        };
        let content = merged.serialize();

        let mut summary = ChangelogSummary {
            path: path.clone(),
            since,
            commit_count: commits.len(),
            entries_added: blocks.len(),
            written: false,
            content,
        };

        if options.dry_run {
            info!(path = %path.display(), "dry run, changelog not written");
            return Ok(summary);
        }

        let edited = match self.editor.edit(&summary.content, CHANGES_EXTENSION)? {
            EditOutcome::Edited(text) if !text.trim().is_empty() => text,
            EditOutcome::Edited(_) | EditOutcome::Cancelled => {
                warn!(path = %path.display(), "edit cancelled");
                return Err(ChangelogError::Cancelled.into());
            }
        };

        write_atomic(&path, &edited)?;
        summary.written = true;

        info!(
            path = %path.display(),
            commits = summary.commit_count,
            entries = summary.entries_added,
            "changelog updated"
        );
        Ok(summary)
    }

    fn changelog_path(&self, options: &ChangelogOptions) -> Result<PathBuf> {
        match &options.file {
            Some(file) if file.is_absolute() => Ok(file.clone()),
            Some(file) => Ok(self.root.join(file)),
            None => Ok(find_changelog(
                &self.root,
                &self.config.changelog.dir,
                &self.config.changelog.pattern,
            )?),
        }
    }

    fn start_revision(
        &self,
        options: &ChangelogOptions,
        document: &ChangelogDocument,
    ) -> Result<CommitId> {
        if let Some(since) = &options.since {
            return Ok(self.repo.resolve(since)?);
        }

        let revision = document
            .last_revision()
            .ok_or(ChangelogError::NoLastRevision)?;
        debug!(revision, "continuing from last recorded revision");

        match self.repo.resolve(revision) {
            Ok(id) => Ok(id),
            Err(GitError::RefNotFound(_)) => Err(ChangelogError::NoLastRevision.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn block_builder(&self, options: &ChangelogOptions) -> Result<BlockBuilder> {
        let mode = options.mode.unwrap_or(self.config.changelog.mode);

        let committer = match &self.config.user {
            Some(user) => Some(Identity::from(user.clone())),
            None => self.repo.user_identity()?,
        };

        let mut builder = BlockBuilder::new(mode)
            .with_overrides(options.overrides.clone())
            .with_committer(committer);
        if let Some(today) = self.today {
            builder = builder.with_today(today);
        }
        if let Some(offset) = self.offset {
            builder = builder.with_offset(offset);
        }
        Ok(builder)
    }
}

/// Convenience for callers that only hold a path
pub fn read_last_revision(path: &Path) -> Result<Option<String>> {
    let document = ChangelogDocument::read(path)?;
    Ok(document.last_revision().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Signature, Time};
    use relmark_core::editor::AlwaysCancel;
    use relmark_core::{PassThrough, RelmarkError};
    use relmark_git::GitRepo;
    use tempfile::TempDir;

    const DAY1: i64 = 1_709_640_000; // 2024-03-05 12:00:00 UTC
    const DAY2: i64 = DAY1 + 2 * 86_400;

    struct Fixture {
        temp: TempDir,
        raw: git2::Repository,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let raw = git2::Repository::init(temp.path()).unwrap();
            {
                let mut config = raw.config().unwrap();
                config.set_str("user.name", "Packager").unwrap();
                config.set_str("user.email", "packager@example.com").unwrap();
            }
            std::fs::create_dir_all(temp.path().join("packaging")).unwrap();
            Self { temp, raw }
        }

        fn changes_path(&self) -> PathBuf {
            self.temp.path().join("packaging").join("pkg.changes")
        }

        /// Commit every file in the tree
        fn commit(&self, author: &str, seconds: i64, message: &str) -> git2::Oid {
            let sig = Signature::new(
                author,
                &format!("{}@example.com", author.to_lowercase()),
                &Time::new(seconds, 0),
            )
            .unwrap();
            std::fs::write(self.temp.path().join("src.txt"), message).unwrap();

            let mut index = self.raw.index().unwrap();
            index
                .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
                .unwrap();
            index.write().unwrap();
            let tree = self.raw.find_tree(index.write_tree().unwrap()).unwrap();

            let parents = match self.raw.head() {
                Ok(head) => vec![head.peel_to_commit().unwrap()],
                Err(_) => Vec::new(),
            };
            let parents: Vec<_> = parents.iter().collect();
            self.raw
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
                .unwrap()
        }

        fn short(&self, oid: git2::Oid) -> String {
            let object = self.raw.find_object(oid, None).unwrap();
            object.short_id().unwrap().as_str().unwrap().to_string()
        }

        fn repo(&self) -> GitRepo {
            GitRepo::open(self.temp.path()).unwrap()
        }
    }

    /// History: base (recorded in the changelog), c1/c2 by A on day 1, c3 by B on day 2
    fn fixture_with_history() -> (Fixture, String) {
        let fixture = Fixture::new();
        std::fs::write(fixture.changes_path(), "").unwrap();
        let base = fixture.commit("A", DAY1 - 3_600, "base");

        let existing = format!(
            "* Tue Mar 05 2024 A <a@example.com> - {}\n- base\n",
            fixture.short(base)
        );
        std::fs::write(fixture.changes_path(), &existing).unwrap();
        fixture.commit("A", DAY1, "c1");
        fixture.commit("A", DAY1 + 60, "c2");
        fixture.commit("B", DAY2, "c3");

        (fixture, existing)
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_update_from_last_revision() {
        let (fixture, existing) = fixture_with_history();
        let repo = fixture.repo();
        let config = Config::default();

        let summary = ChangelogWorkflow::new(&repo, &config, &PassThrough, fixture.temp.path())
            .with_offset(utc())
            .run(&ChangelogOptions::default())
            .unwrap();

        assert!(summary.written);
        assert_eq!(summary.commit_count, 3);
        assert_eq!(summary.entries_added, 2);
        assert_eq!(summary.path, fixture.changes_path());

        let written = std::fs::read_to_string(fixture.changes_path()).unwrap();
        let doc = ChangelogDocument::parse(&written);
        assert_eq!(doc.len(), 3);

        let newest = doc.get_entry(0).unwrap();
        assert_eq!(newest.header_author, "B");
        assert_eq!(newest.body_lines, vec!["- c3", ""]);

        let day1 = doc.get_entry(1).unwrap();
        assert_eq!(day1.header_author, "A");
        assert_eq!(day1.body_lines, vec!["- c1", "- c2", ""]);

        assert!(written.ends_with(&existing));

        // no tags anywhere: the label is the short id alone
        let head = repo.resolve("HEAD").unwrap();
        let head_short = repo.short_id(&head).unwrap();
        assert_eq!(newest.header_version, head_short);
        assert_eq!(doc.last_revision(), Some(head_short.as_str()));
    }

    #[test]
    fn test_label_uses_nearest_tag() {
        let (fixture, _existing) = fixture_with_history();
        let head = fixture.raw.head().unwrap().peel_to_commit().unwrap();
        let base = head.parent(0).unwrap().parent(0).unwrap().parent(0).unwrap();
        fixture
            .raw
            .tag_lightweight("v1.0", base.as_object(), false)
            .unwrap();

        let repo = fixture.repo();
        let config = Config::default();
        ChangelogWorkflow::new(&repo, &config, &PassThrough, fixture.temp.path())
            .with_offset(utc())
            .run(&ChangelogOptions::default())
            .unwrap();

        let doc = ChangelogDocument::read(&fixture.changes_path()).unwrap();
        let expected = format!("v1.0@{}", fixture.short(head.id()));
        assert_eq!(doc.get_entry(0).unwrap().header_version, expected);
    }

    #[test]
    fn test_empty_edit_leaves_file_untouched() {
        struct Blanked;

        impl Editor for Blanked {
            fn edit(&self, _text: &str, _extension: &str) -> Result<EditOutcome> {
                Ok(EditOutcome::Edited(String::new()))
            }
        }

        let (fixture, existing) = fixture_with_history();
        let repo = fixture.repo();
        let config = Config::default();

        let result = ChangelogWorkflow::new(&repo, &config, &Blanked, fixture.temp.path())
            .run(&ChangelogOptions::default());

        assert!(matches!(
            result,
            Err(RelmarkError::Changelog(ChangelogError::Cancelled))
        ));
        assert_eq!(std::fs::read_to_string(fixture.changes_path()).unwrap(), existing);
    }

    #[test]
    fn test_unrecognized_top_entry() {
        let fixture = Fixture::new();
        std::fs::write(fixture.changes_path(), "").unwrap();
        let base = fixture.commit("A", DAY1 - 3_600, "base");
        let existing = format!(
            "* Tue Mar 05 2024 A <a@example.com> - 1.0 by hand\n- manual note\n\n* Tue Mar 05 2024 A <a@example.com> - {}\n- base\n",
            fixture.short(base)
        );
        std::fs::write(fixture.changes_path(), &existing).unwrap();
        fixture.commit("B", DAY1, "c1");

        let repo = fixture.repo();
        let config = Config::default();
        let workflow = ChangelogWorkflow::new(&repo, &config, &PassThrough, fixture.temp.path())
            .with_offset(utc());

        let result = workflow.run(&ChangelogOptions::default());
        assert!(matches!(
            result,
            Err(RelmarkError::Changelog(ChangelogError::NoLastRevision))
        ));

        let options = ChangelogOptions {
            since: Some(base.to_string()),
            ..Default::default()
        };
        let summary = workflow.run(&options).unwrap();
        assert_eq!(summary.commit_count, 1);

        let written = std::fs::read_to_string(fixture.changes_path()).unwrap();
        assert!(written.starts_with("* Tue Mar 05 2024 B <b@example.com> - "));
        assert!(written.ends_with(&format!("- c1\n\n{}", existing)));
    }

    #[test]
    fn test_nothing_new_is_empty_range() {
        let fixture = Fixture::new();
        std::fs::write(fixture.changes_path(), "").unwrap();
        let base = fixture.commit("A", DAY1, "base");
        let existing = format!(
            "* Tue Mar 05 2024 A <a@example.com> - {}\n- base\n",
            fixture.short(base)
        );
        std::fs::write(fixture.changes_path(), &existing).unwrap();
        fixture.commit("A", DAY1 + 60, "record changelog");

        let repo = fixture.repo();
        let config = Config::default();
        let workflow = ChangelogWorkflow::new(&repo, &config, &PassThrough, fixture.temp.path());

        let options = ChangelogOptions {
            since: Some("HEAD".to_string()),
            ..Default::default()
        };
        let result = workflow.run(&options);
        assert!(matches!(
            result,
            Err(RelmarkError::Changelog(ChangelogError::EmptyRange { .. }))
        ));
        assert_eq!(std::fs::read_to_string(fixture.changes_path()).unwrap(), existing);
    }

    #[test]
    fn test_cancelled_edit_leaves_file_untouched() {
        let (fixture, existing) = fixture_with_history();
        let repo = fixture.repo();
        let config = Config::default();

        let result = ChangelogWorkflow::new(&repo, &config, &AlwaysCancel, fixture.temp.path())
            .run(&ChangelogOptions::default());

        assert!(matches!(
            result,
            Err(RelmarkError::Changelog(ChangelogError::Cancelled))
        ));
        assert_eq!(std::fs::read_to_string(fixture.changes_path()).unwrap(), existing);
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let (fixture, existing) = fixture_with_history();
        let repo = fixture.repo();
        let config = Config::default();

        let options = ChangelogOptions {
            dry_run: true,
            ..Default::default()
        };
        let summary = ChangelogWorkflow::new(&repo, &config, &AlwaysCancel, fixture.temp.path())
            .run(&options)
            .unwrap();

        assert!(!summary.written);
        assert!(summary.content.ends_with(&existing));
        assert_eq!(std::fs::read_to_string(fixture.changes_path()).unwrap(), existing);
    }

    #[test]
    fn test_dirty_tree_is_refused() {
        let (fixture, existing) = fixture_with_history();
        std::fs::write(fixture.temp.path().join("stray.txt"), "x").unwrap();
        let repo = fixture.repo();
        let config = Config::default();

        let result = ChangelogWorkflow::new(&repo, &config, &PassThrough, fixture.temp.path())
            .run(&ChangelogOptions::default());

        assert!(matches!(
            result,
            Err(RelmarkError::Git(GitError::DirtyTree { paths })) if paths == vec!["stray.txt".to_string()]
        ));
        assert_eq!(std::fs::read_to_string(fixture.changes_path()).unwrap(), existing);
    }

    #[test]
    fn test_missing_last_revision() {
        let fixture = Fixture::new();
        std::fs::write(
            fixture.changes_path(),
            "* Tue Mar 05 2024 A <a@example.com>\n- base\n",
        )
        .unwrap();
        fixture.commit("A", DAY1, "base");

        let repo = fixture.repo();
        let config = Config::default();
        let result = ChangelogWorkflow::new(&repo, &config, &PassThrough, fixture.temp.path())
            .run(&ChangelogOptions::default());

        assert!(matches!(
            result,
            Err(RelmarkError::Changelog(ChangelogError::NoLastRevision))
        ));
    }

    #[test]
    fn test_unknown_since() {
        let (fixture, _existing) = fixture_with_history();
        let repo = fixture.repo();
        let config = Config::default();

        let options = ChangelogOptions {
            since: Some("no-such-ref".to_string()),
            ..Default::default()
        };
        let result = ChangelogWorkflow::new(&repo, &config, &PassThrough, fixture.temp.path())
            .run(&options);

        assert!(matches!(
            result,
            Err(RelmarkError::Git(GitError::RefNotFound(r))) if r == "no-such-ref"
        ));
    }

    #[test]
    fn test_author_mode_with_overrides() {
        let (fixture, _existing) = fixture_with_history();
        let repo = fixture.repo();
        let config = Config::default();
        let today = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let options = ChangelogOptions {
            mode: Some(GroupingMode::Author),
            overrides: HeaderOverrides {
                version: Some("2.0-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        ChangelogWorkflow::new(&repo, &config, &PassThrough, fixture.temp.path())
            .with_today(today)
            .run(&options)
            .unwrap();

        let doc = ChangelogDocument::read(&fixture.changes_path()).unwrap();
        let newest = doc.get_entry(0).unwrap();
        assert_eq!(newest.header_date, today);
        assert_eq!(newest.header_author, "Packager");
        assert_eq!(newest.header_email, "packager@example.com");
        assert_eq!(newest.header_version, "2.0-1");
        assert_eq!(
            newest.body_lines,
            vec!["[ A ]", "- c1", "- c2", "[ B ]", "- c3", ""]
        );
    }

    #[test]
    fn test_read_last_revision() {
        let (fixture, _existing) = fixture_with_history();
        let revision = read_last_revision(&fixture.changes_path()).unwrap();
        assert!(revision.is_some());
    }
}
