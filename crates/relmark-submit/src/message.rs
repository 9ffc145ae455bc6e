//! Composing the tag message in an editor

use relmark_core::error::{Result, SubmitError};
use relmark_core::{EditOutcome, Editor};

/// Build the text presented to the user when no message was given
fn template(tag_name: &str) -> String {
    format!(
        "\n\
         # Please enter the message for submission tag {tag_name}.\n\
         # Lines starting with '#' are ignored, an empty message aborts the submission.\n"
    )
}

/// Drop comment lines and surrounding blank lines
pub fn strip_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Ask the user for a tag message; an empty result counts as cancelled
pub fn compose_message(editor: &dyn Editor, tag_name: &str) -> Result<String> {
    match editor.edit(&template(tag_name), ".txt")? {
        EditOutcome::Edited(text) => {
            let message = strip_comments(&text);
            if message.is_empty() {
                Err(SubmitError::Cancelled.into())
            } else {
                Ok(message)
            }
        }
        EditOutcome::Cancelled => Err(SubmitError::Cancelled.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmark_core::editor::AlwaysCancel;
    use relmark_core::{PassThrough, RelmarkError};

    struct Typing(&'static str);

    impl Editor for Typing {
        fn edit(&self, text: &str, _extension: &str) -> Result<EditOutcome> {
            Ok(EditOutcome::Edited(format!("{}{}", self.0, text)))
        }
    }

    #[test]
    fn test_strip_comments() {
        let text = "\nFix build\n\n# comment\nSecond paragraph\n# trailing\n";
        assert_eq!(strip_comments(text), "Fix build\n\nSecond paragraph");
    }

    #[test]
    fn test_compose_message() {
        let message = compose_message(&Typing("Release 1.2"), "submit/trunk/1").unwrap();
        assert_eq!(message, "Release 1.2");
    }

    #[test]
    fn test_untouched_template_is_cancelled() {
        let result = compose_message(&PassThrough, "submit/trunk/1");
        assert!(matches!(
            result,
            Err(RelmarkError::Submit(SubmitError::Cancelled))
        ));
    }

    #[test]
    fn test_editor_cancel() {
        let result = compose_message(&AlwaysCancel, "submit/trunk/1");
        assert!(matches!(
            result,
            Err(RelmarkError::Submit(SubmitError::Cancelled))
        ));
    }
}
