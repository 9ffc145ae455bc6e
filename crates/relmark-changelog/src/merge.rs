//! Prepending new entries and writing the result back

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use relmark_core::error::ChangelogError;

use crate::document::{ChangelogDocument, ChangelogEntryBlock};

/// What a merge produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// There were no new blocks; the document stays as it is
    NothingToMerge,
    /// The document with the new blocks on top
    Merged(ChangelogDocument),
}

/// Insert each block at the top of the file, in order.
///
/// Blocks are expected oldest first, so the last one ends up as the newest
/// entry. Existing text, preamble included, is never reordered or modified;
/// it follows the new entries after one blank line.
pub fn merge(document: &ChangelogDocument, blocks: &[ChangelogEntryBlock]) -> MergeOutcome {
    if blocks.is_empty() {
        return MergeOutcome::NothingToMerge;
    }

    let mut merged = document.clone();
    let mut older_text = std::mem::take(&mut merged.preamble);
    if older_text.iter().all(|line| line.trim().is_empty()) {
        older_text.clear();
    }
    if merged.blocks.is_empty() && older_text.is_empty() {
        merged.trailing_newline = true;
    }

    let has_older = !merged.blocks.is_empty() || !older_text.is_empty();
    for (index, block) in blocks.iter().enumerate() {
        let mut block = block.clone();
        if (has_older || index > 0) && !block.ends_with_blank() {
            block.body_lines.push(String::new());
        }
        // the oldest new entry sits directly above the previous top of file
        if index == 0 {
            block.body_lines.append(&mut older_text);
        }
        merged.blocks.insert(0, block);
    }

    debug!(added = blocks.len(), total = merged.len(), "merged entries");
    MergeOutcome::Merged(merged)
}

/// Replace `path` with `contents` without ever leaving a partial file.
///
/// The text goes to a temporary file next to the target, is synced, and is
/// then renamed over it.
#[instrument(skip(contents), fields(path = %path.display(), bytes = contents.len()))]
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), ChangelogError> {
    let write_error = |reason: String| ChangelogError::WriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| write_error(e.to_string()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| write_error(e.to_string()))?;

    // keep the original permissions
    if let Ok(metadata) = std::fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| write_error(e.to_string()))?;
    }

    temp.persist(path).map_err(|e| write_error(e.error.to_string()))?;

    info!(path = %path.display(), "changelog written");
    Ok(())
}
