//! Changelog command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use relmark_changelog::{ChangelogOptions, ChangelogWorkflow, HeaderOverrides};
use relmark_core::config::load_config_or_default;
use relmark_core::{Editor, GroupingMode, PassThrough};
use relmark_git::GitRepo;

use crate::cli::editor::TerminalEditor;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Add new commits to the packaging changelog
#[derive(Debug, Args)]
#[command(disable_version_flag = true)]
pub struct ChangelogCommand {
    /// Start revision (excluded); defaults to the one recorded in the newest entry
    #[arg(long, value_name = "REF")]
    pub since: Option<String>,

    /// Author name written into new entry headers
    #[arg(long)]
    pub author: Option<String>,

    /// Author email written into new entry headers
    #[arg(long)]
    pub email: Option<String>,

    /// Version written into new entry headers
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Group commits by date or by author
    #[arg(long, value_name = "MODE")]
    pub mode: Option<GroupingMode>,

    /// Changelog file (default: discovered under the packaging directory)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Write the result without opening an editor
    #[arg(long)]
    pub no_edit: bool,

    /// Print the updated changelog instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

impl ChangelogCommand {
    /// Execute the changelog command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(since = ?self.since, mode = ?self.mode, dry_run = self.dry_run, "executing changelog command");
        let cwd = std::env::current_dir()?;
        let (config, _) = load_config_or_default(&cwd)?;

        let repo = GitRepo::discover(&cwd)?.with_push_method(config.git.push_method);
        let root = repo.path().to_path_buf();

        let editor: Box<dyn Editor> = if self.no_edit {
            Box::new(PassThrough)
        } else {
            Box::new(TerminalEditor::from_config(&config))
        };

        let options = ChangelogOptions {
            since: self.since.clone(),
            file: self.file.as_ref().map(|file| cwd.join(file)),
            mode: self.mode,
            overrides: HeaderOverrides {
                author: self.author.clone(),
                email: self.email.clone(),
                version: self.version.clone(),
            },
            dry_run: self.dry_run,
        };

        let summary = ChangelogWorkflow::new(&repo, &config, editor.as_ref(), root).run(&options)?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            OutputFormat::Text => {
                if self.dry_run {
                    print!("{}", summary.content);
                } else if !cli.quiet {
                    output::success(&format!(
                        "Changelog {} updated with {} commit(s) in {} entr{}",
                        output::path_style().apply_to(summary.path.display()),
                        summary.commit_count,
                        summary.entries_added,
                        if summary.entries_added == 1 { "y" } else { "ies" }
                    ));
                }
            }
        }

        Ok(())
    }
}
