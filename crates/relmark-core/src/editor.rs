//! Interactive edit step
//!
//! The changelog and the submission message can be reviewed by a human
//! before they are finalized. The edit is a blocking call that either
//! returns the edited text or reports that the user backed out.

use crate::error::Result;

/// Result of an edit session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The user saved this text
    Edited(String),
    /// The user quit without saving or left the buffer empty
    Cancelled,
}

impl EditOutcome {
    /// Wrap text saved by an editor; a blank buffer counts as backing out
    pub fn from_saved(text: String) -> Self {
        if text.trim().is_empty() {
            Self::Cancelled
        } else {
            Self::Edited(text)
        }
    }
}

/// Something that lets a human adjust a block of text
pub trait Editor {
    /// Present `text` for editing. `extension` hints at the file type,
    /// e.g. `".changes"`.
    fn edit(&self, text: &str, extension: &str) -> Result<EditOutcome>;
}

/// Editor that accepts the text unchanged, used for non-interactive runs
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Editor for PassThrough {
    fn edit(&self, text: &str, _extension: &str) -> Result<EditOutcome> {
        Ok(EditOutcome::Edited(text.to_string()))
    }
}

/// Editor that always reports a cancelled session
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysCancel;

impl Editor for AlwaysCancel {
    fn edit(&self, _text: &str, _extension: &str) -> Result<EditOutcome> {
        Ok(EditOutcome::Cancelled)
    }
}
