//! Status command

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use relmark_changelog::{find_changelog, read_last_revision};
use relmark_core::config::load_config_or_default;
use relmark_git::{GitRepo, UpstreamBranch};
use relmark_submit::TagPlanner;

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Show branch, changelog and submission status
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// List every uncommitted path
    #[arg(long)]
    pub paths: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    config_path: Option<PathBuf>,
    branch: Option<String>,
    upstream: Option<UpstreamBranch>,
    clean: bool,
    dirty_paths: Vec<String>,
    remote: String,
    remote_url: Option<String>,
    changelog: Option<PathBuf>,
    changelog_note: Option<String>,
    last_revision: Option<String>,
    next_tag: Option<String>,
    next_tag_note: Option<String>,
}

impl StatusCommand {
    /// Execute the status command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing status command");
        let cwd = std::env::current_dir()?;
        let (config, config_path) = load_config_or_default(&cwd)?;

        let repo = GitRepo::discover(&cwd)?;
        let branch = repo.current_branch()?;
        let upstream = match &branch {
            Some(name) => repo.upstream_of(name)?,
            None => None,
        };
        let dirty_paths = repo.dirty_paths()?;

        let remote = config.submit.remote.clone();
        let remote_url = if repo.has_remote(&remote)? {
            repo.remote_url(&remote)?
        } else {
            None
        };

        let (changelog, changelog_note, last_revision) =
            match find_changelog(repo.path(), &config.changelog.dir, &config.changelog.pattern) {
                Ok(path) => match read_last_revision(&path) {
                    Ok(revision) => (Some(path), None, revision),
                    Err(e) => (Some(path), Some(e.to_string()), None),
                },
                Err(e) => {
                    debug!(error = %e, "no changelog for status");
                    (None, Some(e.to_string()), None)
                }
            };

        let planned = TagPlanner::from_config(&config.submit).plan(
            branch.as_deref(),
            None,
            |_| Ok(upstream.clone()),
            &remote,
            Utc::now(),
        );
        let (next_tag, next_tag_note) = match planned {
            Ok(plan) => (Some(plan.name), plan.warnings.into_iter().next()),
            Err(e) => (None, Some(e.to_string())),
        };

        let report = StatusReport {
            config_path,
            branch,
            upstream,
            clean: dirty_paths.is_empty(),
            dirty_paths,
            remote,
            remote_url,
            changelog,
            changelog_note,
            last_revision,
            next_tag,
            next_tag_note,
        };

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => self.print_text(&report),
        }

        Ok(())
    }

    fn print_text(&self, report: &StatusReport) {
        println!("{}", output::header("relmark status"));
        println!();

        match &report.config_path {
            Some(path) => println!(
                "{}",
                output::key_value("Config", &output::path_style().apply_to(path.display()).to_string())
            ),
            None => println!(
                "{}",
                output::key_value("Config", &format!("{} (using defaults)", style("not found").yellow()))
            ),
        }

        println!(
            "{}",
            output::key_value("Branch", report.branch.as_deref().unwrap_or("(detached)"))
        );
        let upstream = report
            .upstream
            .as_ref()
            .map(|u| format!("{}/{}", u.remote, u.branch))
            .unwrap_or_else(|| "none".to_string());
        println!("{}", output::key_value("Upstream", &upstream));

        let remote = match &report.remote_url {
            Some(url) => format!("{} ({})", report.remote, url),
            None => format!("{} {}", report.remote, style("(not configured)").yellow()),
        };
        println!("{}", output::key_value("Remote", &remote));

        let tree = if report.clean {
            style("clean").green().to_string()
        } else {
            style(format!("{} uncommitted path(s)", report.dirty_paths.len()))
                .yellow()
                .to_string()
        };
        println!("{}", output::key_value("Working tree", &tree));
        if self.paths {
            for path in &report.dirty_paths {
                println!("    {}", path);
            }
        }

        println!();
        match &report.changelog {
            Some(path) => println!(
                "{}",
                output::key_value("Changelog", &output::path_style().apply_to(path.display()).to_string())
            ),
            None => println!("{}", output::key_value("Changelog", "none")),
        }
        println!(
            "{}",
            output::key_value("Last synced", report.last_revision.as_deref().unwrap_or("unknown"))
        );
        if let Some(note) = &report.changelog_note {
            println!("    {}", style(note).dim());
        }

        match &report.next_tag {
            Some(tag) => println!(
                "{}",
                output::key_value("Next tag", &output::tag_style().apply_to(tag).to_string())
            ),
            None => println!("{}", output::key_value("Next tag", "unavailable")),
        }
        if let Some(note) = &report.next_tag_note {
            println!("    {}", style(note).dim());
        }
    }
}
