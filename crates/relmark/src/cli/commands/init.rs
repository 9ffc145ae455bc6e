//! Init command

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use console::style;
use dialoguer::{Confirm, Select};
use tracing::info;

use relmark_core::config::defaults::{DEFAULT_CONFIG_TEMPLATE, DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_YAML};
use relmark_core::config::Config;

use crate::cli::output;
use crate::cli::Cli;

/// Write a default relmark configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,

    /// Use defaults without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file syntax
    #[arg(long, value_enum)]
    pub syntax: Option<ConfigSyntax>,
}

/// Supported configuration syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigSyntax {
    Toml,
    Yaml,
}

impl ConfigSyntax {
    fn file_name(self) -> &'static str {
        match self {
            ConfigSyntax::Toml => DEFAULT_CONFIG_TOML,
            ConfigSyntax::Yaml => DEFAULT_CONFIG_YAML,
        }
    }

    fn render(self) -> anyhow::Result<String> {
        match self {
            ConfigSyntax::Toml => Ok(DEFAULT_CONFIG_TEMPLATE.to_string()),
            ConfigSyntax::Yaml => Ok(serde_yaml::to_string(&Config::default())?),
        }
    }
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(force = self.force, yes = self.yes, "executing init command");
        let cwd = std::env::current_dir()?;

        let syntax = match self.syntax {
            Some(syntax) => syntax,
            None if self.yes => ConfigSyntax::Toml,
            None => {
                let choices = [ConfigSyntax::Toml, ConfigSyntax::Yaml];
                let selection = Select::new()
                    .with_prompt("Configuration format")
                    .items(&["toml", "yaml"])
                    .default(0)
                    .interact()?;
                choices[selection]
            }
        };

        let config_path = self
            .output
            .clone()
            .unwrap_or_else(|| cwd.join(syntax.file_name()));

        if config_path.exists() && !self.force {
            if self.yes {
                anyhow::bail!(
                    "Configuration file already exists at {}. Use --force to overwrite.",
                    config_path.display()
                );
            }

            let overwrite = Confirm::new()
                .with_prompt(format!(
                    "Configuration file already exists at {}. Overwrite?",
                    config_path.display()
                ))
                .default(false)
                .interact()?;

            if !overwrite {
                println!("{}", style("Aborted.").yellow());
                return Ok(());
            }
        }

        std::fs::write(&config_path, syntax.render()?)?;

        if !cli.quiet {
            output::success(&format!(
                "Created configuration at {}",
                output::path_style().apply_to(config_path.display())
            ));
            println!();
            println!("Next steps:");
            println!("  1. Point [changelog] dir and pattern at your packaging changelog");
            println!("  2. Run {} to check the setup", style("relmark status").cyan());
            println!("  3. Run {} after your next commits", style("relmark changelog").cyan());
        }

        Ok(())
    }
}
