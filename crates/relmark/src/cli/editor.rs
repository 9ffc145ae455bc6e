//! Terminal editor used for the interactive review steps

use relmark_core::config::Config;
use relmark_core::{EditOutcome, Editor, RelmarkError};
use tracing::debug;

/// Opens the configured editor, else `$VISUAL` / `$EDITOR`, else `vi`
#[derive(Debug, Clone, Default)]
pub struct TerminalEditor {
    command: Option<String>,
}

impl TerminalEditor {
    pub fn from_config(config: &Config) -> Self {
        Self {
            command: config.general.editor.clone(),
        }
    }
}

impl Editor for TerminalEditor {
    fn edit(&self, text: &str, extension: &str) -> relmark_core::Result<EditOutcome> {
        let mut editor = dialoguer::Editor::new();
        if let Some(command) = &self.command {
            editor.executable(command);
        }
        editor
            .extension(extension)
            .require_save(true)
            .trim_newlines(false);

        debug!(command = ?self.command, extension, "launching editor");
        let saved = editor
            .edit(text)
            .map_err(|e| RelmarkError::Io(std::io::Error::other(e)))?;
        match saved {
            Some(edited) => Ok(EditOutcome::from_saved(edited)),
            None => Ok(EditOutcome::Cancelled),
        }
    }
}
