//! Shell completions

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use tracing::info;

use crate::cli::output;
use crate::cli::Cli;

const BIN_NAME: &str = "relmark";

/// Print a completion script for a shell
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// bash, zsh, fish, powershell or elvish
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl CompletionsCommand {
    /// Execute the completions command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(shell = %self.shell, "executing completions command");
        let script = render(self.shell);

        match &self.output {
            Some(path) => {
                std::fs::write(path, &script)?;
                if !cli.quiet {
                    output::success(&format!(
                        "{} completions written to {}",
                        self.shell,
                        output::path_style().apply_to(path.display())
                    ));
                }
            }
            None => std::io::stdout().write_all(&script)?,
        }

        Ok(())
    }
}

fn render(shell: Shell) -> Vec<u8> {
    let mut buf = Vec::new();
    generate(shell, &mut Cli::command(), BIN_NAME, &mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_bash_script_lists_subcommands() {
        let script = String::from_utf8(render(Shell::Bash)).unwrap();
        assert!(script.contains(BIN_NAME));
        assert!(script.contains("changelog"));
        assert!(script.contains("submit"));
    }

    #[test]
    fn test_parse_shell_argument() {
        let cli = Cli::try_parse_from(["relmark", "completions", "zsh"]).unwrap();
        match cli.command {
            crate::cli::Commands::Completions(cmd) => assert_eq!(cmd.shell, Shell::Zsh),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
