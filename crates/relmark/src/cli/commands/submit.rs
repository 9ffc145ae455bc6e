//! Submit command

use clap::Args;
use console::style;
use dialoguer::Confirm;
use tracing::info;

use relmark_core::config::load_config_or_default;
use relmark_git::GitRepo;
use relmark_submit::{PublicationState, SubmitOptions, SubmitReport, SubmitWorkflow};

use crate::cli::editor::TerminalEditor;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Tag a commit for the build system and push the tag
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Tag message; an editor is opened when omitted
    #[arg(short = 'm', long = "msg", value_name = "MSG")]
    pub message: Option<String>,

    /// Commit to submit
    #[arg(short, long, value_name = "REF", default_value = "HEAD")]
    pub commit: String,

    /// Target branch (default: upstream of the current branch)
    #[arg(long, value_name = "BRANCH")]
    pub target: Option<String>,

    /// Remote to push the tag to (default from configuration)
    #[arg(long)]
    pub remote: Option<String>,

    /// GPG-sign the tag
    #[arg(short, long)]
    pub sign: bool,

    /// GPG key to sign with (implies --sign)
    #[arg(short = 'u', long, value_name = "KEY")]
    pub user_key: Option<String>,

    /// Submit even with uncommitted changes
    #[arg(long)]
    pub allow_dirty: bool,

    /// Show the tag that would be created without creating it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl SubmitCommand {
    /// Execute the submit command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(commit = %self.commit, target = ?self.target, dry_run = self.dry_run, "executing submit command");
        let cwd = std::env::current_dir()?;
        let (config, _) = load_config_or_default(&cwd)?;

        let repo = GitRepo::discover(&cwd)?.with_push_method(config.git.push_method);
        let editor = TerminalEditor::from_config(&config);
        let workflow = SubmitWorkflow::new(&repo, &config, &editor);

        let options = SubmitOptions {
            message: self.message.clone(),
            commit: self.commit.clone(),
            target: self.target.clone(),
            remote: self.remote.clone(),
            sign: self.sign,
            user_key: self.user_key.clone(),
            allow_dirty: self.allow_dirty,
            dry_run: self.dry_run,
        };

        let prepared = workflow.prepare(&options)?;
        let text = cli.format == OutputFormat::Text;

        if text && !cli.quiet {
            for warning in &prepared.warnings {
                output::warning(warning);
            }
            println!("{}", style("Submission").bold());
            let tag = output::tag_style().apply_to(&prepared.tag.name).to_string();
            println!("{}", output::key_value("Tag", &tag));
            println!("{}", output::key_value("Commit", prepared.tag.commit.as_str()));
            println!("{}", output::key_value("Remote", &prepared.remote));
            println!(
                "{}",
                output::key_value("Signed", if prepared.tag.is_signed() { "yes" } else { "no" })
            );
            println!();
        }

        if self.dry_run {
            let report = SubmitReport::new(prepared, PublicationState::Planned);
            return print_report(cli, &report, true);
        }

        if !self.yes && text {
            let confirmed = Confirm::new()
                .with_prompt(format!("Push {} to {}?", prepared.tag.name, prepared.remote))
                .default(true)
                .interact()?;

            if !confirmed {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
        }

        let spinner = output::spinner(
            format!("Pushing {} to {}", prepared.tag.name, prepared.remote),
            cli.quiet || !text,
        );
        let result = workflow.publish(prepared);
        spinner.finish_and_clear();

        print_report(cli, &result?, false)
    }
}

fn print_report(cli: &Cli, report: &SubmitReport, dry_run: bool) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            if cli.quiet {
                return Ok(());
            }
            if dry_run {
                output::info(&format!(
                    "Dry run, {} would be pushed to {}",
                    output::tag_style().apply_to(&report.tag),
                    report.remote
                ));
            } else {
                output::success(&format!(
                    "Submitted {} to {}",
                    output::tag_style().apply_to(&report.tag),
                    report.remote
                ));
            }
        }
    }
    Ok(())
}
